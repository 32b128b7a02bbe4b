//! Threat-intel platform app kit
//!
//! An API service template whose resources receive the platform context
//! through middleware, plus the validation helpers used by app tests.
//!
//! # Modules
//! - `app`, `handlers`, `middleware`: the API service
//! - `platform`: entity model and signed REST client
//! - `staging`: key/value staging store
//! - `validate`: operator registry, key/value and entity validators

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod platform;
pub mod staging;
pub mod validate;

pub use app::{create_router, AppState};
pub use error::{AppError, AppResult, PlatformError, ValidateError, ValidateResult};
pub use validate::Validator;
