//! Request middleware

pub mod context;

pub use context::{inject_context, AppContext};
