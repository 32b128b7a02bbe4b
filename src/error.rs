//! Error handling

use std::path::PathBuf;

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the API service
#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // External service errors
    ExternalServiceError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, "External service error")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        AppError::ExternalServiceError(err.to_string())
    }
}

/// Failures talking to the threat-intel platform.
///
/// Non-2xx responses are not errors; they come back as a
/// [`PlatformResponse`](crate::platform::PlatformResponse) with the status set.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("platform credentials are not configured")]
    NotConfigured,

    #[error("invalid platform url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("cannot read platform response: {0}")]
    Read(#[from] std::io::Error),

    #[error("cannot sign request: {0}")]
    Signature(String),
}

/// Environment or test-setup failures raised while validating.
///
/// Data mismatches never produce one of these; they are reported through
/// [`Outcome`](crate::validate::Outcome).
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed entity file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid expected entity: {0}")]
    InvalidEntity(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

pub type ValidateResult<T> = Result<T, ValidateError>;
