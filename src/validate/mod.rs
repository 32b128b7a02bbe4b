//! Test validation helpers
//!
//! # Components
//! - `operators.rs`: operator registry (`eq`, `gt`, `rex`, `jeq`, ...)
//! - `diff.rs`: order-insensitive deep diff (feature `deep-diff`)
//! - `keyvalue.rs`: checks against playbook variables in the staging store
//! - `entity.rs`: checks of expected entities against the live platform
//!
//! ```no_run
//! use intel_app_kit::platform::RestPlatformClient;
//! use intel_app_kit::staging::MemoryStore;
//! use intel_app_kit::validate::Validator;
//! use serde_json::json;
//!
//! let store = MemoryStore::new("local-context");
//! store.stage("#App:1:count!String", json!(10));
//! let platform = RestPlatformClient::new("https://api.example.com", None, None);
//! let validator = Validator::new(&store, &platform);
//!
//! let outcome = validator.keyvalue().gt("#App:1:count!String", &json!(5));
//! assert!(outcome.is_valid());
//! ```

#[cfg(feature = "deep-diff")]
pub mod diff;
pub mod entity;
pub mod keyvalue;
pub mod operators;
pub mod outcome;

pub use entity::{compare_dicts, compare_lists, load_entities, EntityValidator, ExpectedEntity};
pub use keyvalue::{ContainerKind, KeyValueValidator, ProfileOutput, ProfileOutputs};
pub use operators::{Operator, OperatorOptions};
pub use outcome::{BatchOutcome, FileOutcome, Outcome};

use crate::platform::PlatformClient;
use crate::staging::KeyValueStore;

/// Entry point for a test session: owns both sub-validators, which borrow
/// the store and platform handles from the caller.
pub struct Validator<'a> {
    keyvalue: KeyValueValidator<'a>,
    entity: EntityValidator<'a>,
}

impl<'a> Validator<'a> {
    pub fn new(store: &'a dyn KeyValueStore, platform: &'a dyn PlatformClient) -> Self {
        Self {
            keyvalue: KeyValueValidator::new(store),
            entity: EntityValidator::new(platform),
        }
    }

    /// Resolve an operator token; `None` if it is not in the catalog
    pub fn get_operator(token: &str) -> Option<Operator> {
        Operator::from_token(token)
    }

    pub fn keyvalue(&self) -> &KeyValueValidator<'a> {
        &self.keyvalue
    }

    pub fn entity(&self) -> &EntityValidator<'a> {
        &self.entity
    }
}
