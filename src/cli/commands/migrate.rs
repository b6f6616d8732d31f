use serde_json::json;

use crate::cli::{utils, OutputFormat};
use crate::config::{self, StorageBackend};
use crate::database::DatabaseManager;
use crate::registry::ResourceRegistry;
use crate::resources::ResourceKind;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    config.validate().map_err(anyhow::Error::msg)?;

    if config.database.backend == StorageBackend::Memory {
        utils::output_error(
            &output_format,
            "Nothing to migrate: the memory store is configured",
            Some("MEMORY_BACKEND"),
        )?;
        anyhow::bail!("STORAGE_BACKEND must be postgres to migrate");
    }

    let store = DatabaseManager::open(&config.database).await?;
    let registry = ResourceRegistry::new(store, config.database.query_timeout());
    registry.ensure_collections().await?;

    let collections: Vec<&str> = ResourceKind::ALL
        .iter()
        .map(|kind| kind.schema().collection())
        .collect();

    utils::output_success(
        &output_format,
        &format!("Prepared {} collections", collections.len()),
        Some(json!({ "collections": collections })),
    )
}
