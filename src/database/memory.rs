use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Document, DocumentStore, Owner, StoreError, StoreResult};

/// In-process document store. Collections keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_duplicate<'a>(
    docs: &[Document],
    fields: &Map<String, Value>,
    unique: &[&'a str],
    except: Option<Uuid>,
) -> Option<&'a str> {
    unique.iter().copied().find(|field| {
        let Some(value) = fields.get(*field) else { return false };
        docs.iter()
            .filter(|doc| Some(doc.id) != except)
            .any(|doc| doc.fields.get(*field) == Some(value))
    })
}

fn not_found(collection: &str, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{} in {}", id, collection))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str, _unique: &[&str]) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn find_one_by(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.fields.get(field) == Some(value)))
            .cloned())
    }

    async fn insert(
        &self,
        collection: &str,
        owner: Owner,
        fields: Map<String, Value>,
        unique: &[&str],
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(field) = find_duplicate(docs, &fields, unique, None) {
            return Err(StoreError::Duplicate(field.to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let doc = Document {
            id,
            owner: owner.resolve(id),
            fields,
            created_at: now,
            updated_at: now,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        unique: &[&str],
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, id))?;

        if let Some(field) = find_duplicate(docs, &fields, unique, Some(id)) {
            return Err(StoreError::Duplicate(field.to_string()));
        }

        let doc = docs
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| not_found(collection, id))?;
        doc.fields.extend(fields);
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, id))?;
        let index = docs
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| not_found(collection, id))?;
        docs.remove(index);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let doc = store
            .insert("examples", Owner::Principal(owner), fields(json!({ "title": "t" })), &[])
            .await
            .unwrap();
        assert_eq!(doc.owner, owner);
        assert_eq!(doc.created_at, doc.updated_at);

        let account = store
            .insert("users", Owner::Itself, fields(json!({ "email": "a@b.c" })), &["email"])
            .await
            .unwrap();
        assert_eq!(account.owner, account.id);
    }

    #[tokio::test]
    async fn update_merges_top_level_keys() {
        let store = MemoryStore::new();
        let doc = store
            .insert("examples", Owner::Itself, fields(json!({ "title": "a", "text": "b" })), &[])
            .await
            .unwrap();

        store
            .update("examples", doc.id, fields(json!({ "text": "c" })), &[])
            .await
            .unwrap();

        let stored = store.find_by_id("examples", doc.id).await.unwrap().unwrap();
        assert_eq!(stored.fields, fields(json!({ "title": "a", "text": "c" })));
        assert!(stored.updated_at >= doc.updated_at);
    }

    #[tokio::test]
    async fn unique_fields_reject_duplicates() {
        let store = MemoryStore::new();
        let first = store
            .insert("users", Owner::Itself, fields(json!({ "email": "a@b.c" })), &["email"])
            .await
            .unwrap();
        let second = store
            .insert("users", Owner::Itself, fields(json!({ "email": "x@y.z" })), &["email"])
            .await
            .unwrap();

        let err = store
            .insert("users", Owner::Itself, fields(json!({ "email": "a@b.c" })), &["email"])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref f) if f == "email"));

        // Re-saving your own value is not a duplicate, taking someone else's is
        store
            .update("users", first.id, fields(json!({ "email": "a@b.c" })), &["email"])
            .await
            .unwrap();
        let err = store
            .update("users", second.id, fields(json!({ "email": "a@b.c" })), &["email"])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn missing_documents_are_not_found() {
        let store = MemoryStore::new();
        store.ensure_collection("books", &[]).await.unwrap();
        let id = Uuid::new_v4();

        assert!(store.find_by_id("books", id).await.unwrap().is_none());
        assert!(matches!(
            store.update("books", id, Map::new(), &[]).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete("books", id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = MemoryStore::new();
        for title in ["one", "two", "three"] {
            store
                .insert("examples", Owner::Itself, fields(json!({ "title": title })), &[])
                .await
                .unwrap();
        }
        let titles: Vec<String> = store
            .find_all("examples")
            .await
            .unwrap()
            .iter()
            .filter_map(|d| d.get_str("title").map(str::to_string))
            .collect();
        assert_eq!(titles, ["one", "two", "three"]);

        let found = store
            .find_one_by("examples", "title", &json!("two"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("title"), Some("two"));
    }
}
