//! Threat-intel platform access
//!
//! # Components
//! - `types.rs`: entity kinds, handles, responses and the `entities()` normaliser
//! - `client.rs`: `PlatformClient` trait and the signed blocking REST client

pub mod client;
pub mod types;

pub use client::{sha256_hex, PlatformClient, RestPlatformClient};
pub use types::{
    entities, EntityHandle, EntityKind, GroupType, IndicatorType, PlatformEntity,
    PlatformResponse, UnknownEntityType,
};
