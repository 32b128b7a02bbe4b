//! Platform context middleware
//!
//! Gives every resource handler access to the app args, a logging span and
//! the platform client without each handler wiring them up itself.

use std::sync::Arc;

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app::AppState;
use crate::config::Config;
use crate::error::AppError;
use crate::platform::RestPlatformClient;

/// Context injected into each request
#[derive(Debug, Clone)]
pub struct AppContext {
    pub args: Arc<Config>,
    pub log: tracing::Span,
    pub platform: Arc<RestPlatformClient>,
}

/// Middleware: inject the platform context before the handler runs
pub async fn inject_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let log = tracing::info_span!(
        "resource",
        method = %req.method(),
        path = %req.uri().path(),
    );

    let ctx = AppContext {
        args: state.config.clone(),
        log,
        platform: state.platform.clone(),
    };

    // Insert into request extensions
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

// Implement FromRequestParts for AppContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for AppContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<AppContext>()
            .cloned()
            .ok_or_else(|| AppError::InternalError("platform context was not injected".to_string()))
    }
}
