use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::store::{Document, DocumentStore, Owner, StoreError, StoreResult};

/// Postgres-backed documents: one table per collection, fields in a JSONB column.
pub struct PgDocumentStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    owner: Uuid,
    doc: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            owner: row.owner,
            fields: row.doc.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, owner, doc, created_at, updated_at";

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn quote_literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn unique_index_name(collection: &str, field: &str) -> String {
        format!("{}_{}_key", collection, field)
    }

    /// Unique violations come back as `Duplicate(field)`, the field being
    /// recovered from the `<collection>_<field>_key` index name.
    fn map_write_error(collection: &str, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let field = db_err
                    .constraint()
                    .and_then(|c| c.strip_prefix(collection))
                    .and_then(|c| c.strip_prefix('_'))
                    .and_then(|c| c.strip_suffix("_key"))
                    .unwrap_or("unknown");
                return StoreError::Duplicate(field.to_string());
            }
        }
        StoreError::Sqlx(err)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_collection(&self, collection: &str, unique: &[&str]) -> StoreResult<()> {
        let table = Self::quote_identifier(collection);
        let create = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                owner UUID NOT NULL,
                doc JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#
        );
        sqlx::query(&create).execute(&self.pool).await?;

        for field in unique {
            let index = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ((doc ->> {}))",
                Self::quote_identifier(&Self::unique_index_name(collection, field)),
                table,
                Self::quote_literal(field)
            );
            sqlx::query(&index).execute(&self.pool).await?;
        }

        tracing::info!("Ensured collection table: {}", collection);
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} ORDER BY created_at, id",
            Self::quote_identifier(collection)
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1",
            Self::quote_identifier(collection)
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn find_one_by(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Option<Document>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE doc -> $1 = $2 ORDER BY created_at LIMIT 1",
            Self::quote_identifier(collection)
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(field)
            .bind(Json(value.clone()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn insert(
        &self,
        collection: &str,
        owner: Owner,
        fields: Map<String, Value>,
        _unique: &[&str],
    ) -> StoreResult<Document> {
        let id = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO {} (id, owner, doc) VALUES ($1, $2, $3) RETURNING {COLUMNS}",
            Self::quote_identifier(collection)
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .bind(owner.resolve(id))
            .bind(Json(fields))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;
        Ok(row.into())
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        _unique: &[&str],
    ) -> StoreResult<()> {
        let sql = format!(
            "UPDATE {} SET doc = doc || $2, updated_at = now() WHERE id = $1",
            Self::quote_identifier(collection)
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Json(fields))
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(collection, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} in {}", id, collection)));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::quote_identifier(collection));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} in {}", id, collection)));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers_and_literals() {
        assert_eq!(PgDocumentStore::quote_identifier("books"), "\"books\"");
        assert_eq!(PgDocumentStore::quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(PgDocumentStore::quote_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn unique_index_names_round_trip_to_fields() {
        let name = PgDocumentStore::unique_index_name("users", "email");
        assert_eq!(name, "users_email_key");
        let field = name
            .strip_prefix("users")
            .and_then(|c| c.strip_prefix('_'))
            .and_then(|c| c.strip_suffix("_key"));
        assert_eq!(field, Some("email"));
    }
}
