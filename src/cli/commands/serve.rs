use clap::Args;

use crate::app::{self, AppState};
use crate::config::{self, StorageBackend};

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides API_PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides API_HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Keep all data in memory instead of Postgres")]
    pub memory: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if args.memory {
        config.database.backend = StorageBackend::Memory;
    }

    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!(
        "Starting {} in {:?} mode with {:?} storage",
        env!("CARGO_PKG_NAME"),
        config.environment,
        config.database.backend
    );

    let state = AppState::build(config).await?;
    app::serve(state).await
}
