//! API service application
//!
//! ```text
//! request ─► TraceLayer ─► inject_context ─► GET /one | GET /two
//!                      └─► GET /health
//! ```

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers;
use crate::middleware;
use crate::platform::RestPlatformClient;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub platform: Arc<RestPlatformClient>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let platform = RestPlatformClient::from_config(&config);
        if !platform.is_configured() {
            if config.is_production() {
                tracing::error!("Platform API credentials not set in production");
            } else {
                tracing::warn!("Platform API credentials not set; platform calls will be rejected");
            }
        }

        Self {
            config: Arc::new(config),
            platform: Arc::new(platform),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    tracing::trace!(
        "args: port={} api_path={} owner={:?} kv_context={} environment={}",
        state.config.port,
        state.config.api_path,
        state.config.owner,
        state.config.playbook_db_context,
        state.config.environment
    );

    // Resource routes (platform context injected)
    let resource_routes = Router::new()
        .route("/one", get(handlers::resources::one))
        .route("/two", get(handlers::resources::two))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::inject_context,
        ));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(resource_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
