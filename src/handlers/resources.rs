//! Resource handlers
//!
//! Static resources served through the platform context middleware.

use axum::Json;
use serde::Serialize;

use crate::middleware::AppContext;

#[derive(Debug, Serialize)]
pub struct ResourceData {
    pub data: &'static str,
}

/// Handle GET /one
pub async fn one(ctx: AppContext) -> Json<ResourceData> {
    ctx.log.in_scope(|| tracing::debug!("Serving /one ({})", ctx.args.environment));
    Json(ResourceData { data: "one" })
}

/// Handle GET /two
pub async fn two(ctx: AppContext) -> Json<ResourceData> {
    ctx.log.in_scope(|| tracing::debug!("Serving /two ({})", ctx.args.environment));
    Json(ResourceData { data: "two" })
}
