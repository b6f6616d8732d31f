use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::schema::FieldErrors;

/// Errors from document storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Duplicate value for unique field: {0}")]
    Duplicate(String),

    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored resource. `id`, `owner` and the timestamps belong to the
/// storage layer; `fields` holds everything the schema declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub owner: Uuid,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Owner assigned to a document at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Principal(Uuid),
    /// The new document's own id
    Itself,
}

impl Owner {
    pub fn resolve(self, id: Uuid) -> Uuid {
        match self {
            Owner::Principal(owner) => owner,
            Owner::Itself => id,
        }
    }
}

/// Schemaless document storage, one named collection per resource type.
///
/// Implementations assign ids and timestamps, apply partial updates as a
/// shallow merge, and reject writes that would duplicate a value in one of
/// the `unique` fields.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ensure_collection(&self, collection: &str, unique: &[&str]) -> StoreResult<()>;

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>>;

    async fn find_one_by(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Option<Document>>;

    async fn insert(
        &self,
        collection: &str,
        owner: Owner,
        fields: Map<String, Value>,
        unique: &[&str],
    ) -> StoreResult<Document>;

    /// Merge `fields` into the stored document. `NotFound` if it is absent.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        unique: &[&str],
    ) -> StoreResult<()>;

    /// `NotFound` if the document is absent.
    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}
