//! Threat-intel API Service
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   API SERVICE APP                    │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────┐  │
//! │  │  Router   │──►│  Platform    │──►│  Resources  │  │
//! │  │  (Axum)   │   │  Context MW  │   │  /one /two  │  │
//! │  └───────────┘   └──────┬───────┘   └─────────────┘  │
//! │                         ▼                            │
//! │                 ┌───────────────┐                    │
//! │                 │ Platform API  │                    │
//! │                 └───────────────┘                    │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intel_app_kit::{config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "intel_app_kit=debug,tower_http=debug".into()))
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("API service starting...");
    tracing::info!("Platform API: {}", config.api_path);

    let port = config.port;
    let app = create_router(AppState::new(config));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
