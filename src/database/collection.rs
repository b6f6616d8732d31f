use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::ResourceSchema;

use super::store::{Document, DocumentStore, Owner, StoreError, StoreResult};

/// Storage for one resource type: the shared document store seen through a
/// resource schema. Writes are checked against the schema here, so every
/// caller gets the same required-field and type validation.
#[derive(Clone)]
pub struct Collection {
    schema: Arc<ResourceSchema>,
    store: Arc<dyn DocumentStore>,
    timeout: Option<Duration>,
}

impl Collection {
    pub fn new(schema: ResourceSchema, store: Arc<dyn DocumentStore>, timeout: Option<Duration>) -> Self {
        Self {
            schema: Arc::new(schema),
            store,
            timeout,
        }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn name(&self) -> &'static str {
        self.schema.collection()
    }

    async fn run<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => call.await,
        }
    }

    /// Strict schema: keys the schema does not declare are not stored.
    fn declared_only(&self, mut fields: Map<String, Value>) -> Map<String, Value> {
        fields.retain(|key, _| self.schema.field(key).is_some());
        fields
    }

    pub async fn ensure(&self) -> StoreResult<()> {
        let unique = self.schema.unique_fields();
        self.run(self.store.ensure_collection(self.name(), &unique)).await
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Document>> {
        self.run(self.store.find_all(self.name())).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Document> {
        self.run(self.store.find_by_id(self.name(), id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", self.schema.singular, id)))
    }

    pub async fn find_one_by(&self, field: &str, value: &Value) -> StoreResult<Option<Document>> {
        self.run(self.store.find_one_by(self.name(), field, value)).await
    }

    pub async fn insert(&self, owner: Owner, fields: Map<String, Value>) -> StoreResult<Document> {
        let fields = self.declared_only(fields);
        self.schema.validate_new(&fields).map_err(StoreError::Validation)?;

        let unique = self.schema.unique_fields();
        self.run(self.store.insert(self.name(), owner, fields, &unique)).await
    }

    pub async fn update(&self, id: Uuid, fields: Map<String, Value>) -> StoreResult<()> {
        let fields = self.declared_only(fields);
        self.schema.validate_partial(&fields).map_err(StoreError::Validation)?;

        let unique = self.schema.unique_fields();
        self.run(self.store.update(self.name(), id, fields, &unique)).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.run(self.store.delete(self.name(), id)).await
    }
}
