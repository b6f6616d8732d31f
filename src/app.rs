//! Application state and router assembly.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenIssuer;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{Collection, DatabaseManager};
use crate::handlers::{accounts, resource, system};
use crate::middleware::require_token;
use crate::registry::ResourceRegistry;

/// Everything a request handler may need; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ResourceRegistry>,
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Open storage, make sure every collection exists, and set up token
    /// signing from `config`.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let store = DatabaseManager::open(&config.database)
            .await
            .context("failed to open document store")?;

        let registry = ResourceRegistry::new(store, config.database.query_timeout());
        registry
            .ensure_collections()
            .await
            .context("failed to prepare collections")?;

        let tokens = TokenIssuer::from_config(&config.security).context("invalid JWT configuration")?;

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            tokens,
        })
    }

    pub fn users(&self) -> &Collection {
        self.registry.users()
    }
}

pub fn router(state: AppState) -> Router {
    let resources = state
        .registry
        .iter()
        .fold(Router::new(), |router, (_, mediator)| {
            router.merge(resource::routes(mediator.clone()))
        });

    let protected = Router::new()
        .route("/change-password", patch(accounts::change_password))
        .route("/sign-out", delete(accounts::sign_out))
        .with_state(state.clone())
        .merge(resources)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let public = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/sign-up", post(accounts::sign_up))
        .route("/sign-in", post(accounts::sign_in))
        .with_state(state.clone());

    let mut app = public
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        app = app.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

/// Any origin unless SECURITY_CORS_ORIGINS names specific ones
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind `host:port` and serve until the process is stopped
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
