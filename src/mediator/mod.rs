//! Generic list/get/create/patch/delete over one resource type.
//!
//! Every resource route goes through a `CrudMediator`: load, authorize,
//! mutate, then hand a rendered document (or nothing) back to the handler.
//! Failures come back as `ApiError`s for the error mapper.

pub mod guard;
pub mod patch;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::{Collection, Owner};
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::schema::{OwnerPolicy, ResourceSchema};

pub use guard::{OwnerOnly, OwnershipError, OwnershipGuard};
pub use patch::PatchRequest;

pub struct CrudMediator<G = OwnerOnly> {
    collection: Collection,
    guard: G,
}

impl CrudMediator<OwnerOnly> {
    pub fn owner_only(collection: Collection) -> Self {
        Self::new(collection, OwnerOnly)
    }
}

impl<G: OwnershipGuard> CrudMediator<G> {
    pub fn new(collection: Collection, guard: G) -> Self {
        Self { collection, guard }
    }

    pub fn schema(&self) -> &ResourceSchema {
        self.collection.schema()
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Every resource of this type, whoever owns it.
    pub async fn list(&self) -> Result<Vec<Value>, ApiError> {
        let schema = self.schema();
        let docs = self.collection.find_all().await?;
        Ok(docs.iter().map(|doc| schema.render(doc)).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        let id = parse_id(id)?;
        let doc = self.collection.find_by_id(id).await?;
        Ok(self.schema().render(&doc))
    }

    /// The owner always comes from `principal`; whatever the body says about
    /// ownership is discarded with the other server-maintained keys.
    pub async fn create(&self, body: Map<String, Value>, principal: &Principal) -> Result<Value, ApiError> {
        let schema = self.schema();
        let fields = schema.sanitize(body);
        let owner = match schema.owner_policy {
            OwnerPolicy::Principal => Owner::Principal(principal.id),
            OwnerPolicy::SelfOwned => Owner::Itself,
        };

        let doc = self.collection.insert(owner, fields).await?;
        tracing::info!("Created {} {} for {}", schema.singular, doc.id, principal.id);
        Ok(schema.render(&doc))
    }

    /// Ownership is checked before anything is written, so a rejected patch
    /// never touches storage.
    pub async fn patch(&self, id: &str, body: Map<String, Value>, principal: &Principal) -> Result<(), ApiError> {
        let id = parse_id(id)?;
        let doc = self.collection.find_by_id(id).await?;
        let doc = self.guard.check_ownership(principal, doc)?;

        let changes = self.schema().sanitize(PatchRequest::new(body).into_changes());
        if changes.is_empty() {
            tracing::debug!("Nothing to change on {} {}", self.schema().singular, doc.id);
            return Ok(());
        }

        self.collection.update(doc.id, changes).await?;
        tracing::debug!("Patched {} {}", self.schema().singular, doc.id);
        Ok(())
    }

    pub async fn delete(&self, id: &str, principal: &Principal) -> Result<(), ApiError> {
        let id = parse_id(id)?;
        let doc = self.collection.find_by_id(id).await?;
        let doc = self.guard.check_ownership(principal, doc)?;

        self.collection.delete(doc.id).await?;
        tracing::info!("Deleted {} {}", self.schema().singular, doc.id);
        Ok(())
    }
}

/// Ids that cannot exist are reported like ids that do not exist.
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found())
}
