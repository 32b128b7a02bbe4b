//! HTTP handlers

pub mod health;
pub mod resources;

use axum::http::Uri;

use crate::AppError;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No resource at {}", uri.path()))
}
