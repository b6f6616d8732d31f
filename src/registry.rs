//! Resource type tag → mediator over that type's collection.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::database::{Collection, DocumentStore, StoreError, StoreResult};
use crate::mediator::CrudMediator;
use crate::resources::ResourceKind;

/// Built once at startup from the closed set of resource kinds and shared
/// read-only by every request.
pub struct ResourceRegistry {
    mediators: BTreeMap<ResourceKind, Arc<CrudMediator>>,
    users: Collection,
    store: Arc<dyn DocumentStore>,
    timeout: Option<Duration>,
}

impl ResourceRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Option<Duration>) -> Self {
        let mut mediators = BTreeMap::new();
        for kind in ResourceKind::ALL {
            let collection = Collection::new(kind.schema(), store.clone(), timeout);
            mediators.insert(kind, Arc::new(CrudMediator::owner_only(collection)));
        }

        Self {
            mediators,
            users: Collection::new(ResourceKind::User.schema(), store.clone(), timeout),
            store,
            timeout,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> Option<Arc<CrudMediator>> {
        self.mediators.get(&kind).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &Arc<CrudMediator>)> {
        self.mediators.iter().map(|(kind, mediator)| (*kind, mediator))
    }

    /// Account storage, used by sign-in and the auth boundary
    pub fn users(&self) -> &Collection {
        &self.users
    }

    /// Create whatever backing tables/indexes each collection needs
    pub async fn ensure_collections(&self) -> StoreResult<()> {
        for (kind, mediator) in self.iter() {
            mediator.collection().ensure().await?;
            tracing::debug!("Collection ready for {}", kind);
        }
        Ok(())
    }

    /// Bounded by the same per-call timeout as every collection call
    pub async fn health_check(&self) -> StoreResult<()> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.store.health_check())
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => self.store.health_check().await,
        }
    }
}
