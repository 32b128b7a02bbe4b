//! Key/value staging store
//!
//! Apps under test read and write intermediate values by playbook variable
//! name (`#App:<job>:<key>!<Type>`). Validation only needs read access, so
//! the store is a trait; [`MemoryStore`] is the in-process implementation
//! used by tests and local runs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;

use crate::error::{ValidateError, ValidateResult};

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([A-Za-z]+):(\d+):([A-Za-z0-9_.\-\[\]]+)!([A-Za-z0-9_\-]+)$")
        .expect("variable pattern is valid")
});

/// A parsed playbook variable reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookVariable {
    pub app_type: String,
    pub job_id: String,
    pub key: String,
    pub var_type: String,
}

impl PlaybookVariable {
    pub fn parse(name: &str) -> Option<Self> {
        let caps = VARIABLE_PATTERN.captures(name.trim())?;
        Some(Self {
            app_type: caps[1].to_string(),
            job_id: caps[2].to_string(),
            key: caps[3].to_string(),
            var_type: caps[4].to_string(),
        })
    }
}

/// Read interface over the staging store
pub trait KeyValueStore {
    /// Value stored under `name`, if any
    fn read(&self, name: &str) -> Option<Value>;

    /// Declared schema type of a variable, e.g. `StringArray`
    fn variable_type(&self, name: &str) -> Option<String> {
        PlaybookVariable::parse(name).map(|v| v.var_type)
    }

    /// Store context (the hash key the variables live under)
    fn context(&self) -> &str;
}

/// In-memory staging store
pub struct MemoryStore {
    context: String,
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load staged data from a JSON object of `variable -> value`
    pub fn from_file(context: impl Into<String>, path: &Path) -> ValidateResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ValidateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: HashMap<String, Value> =
            serde_json::from_str(&contents).map_err(|source| ValidateError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!("Staged {} variables from {}", data.len(), path.display());

        Ok(Self {
            context: context.into(),
            data: RwLock::new(data),
        })
    }

    pub fn stage(&self, name: impl Into<String>, value: Value) {
        self.data.write().insert(name.into(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.data.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, name: &str) -> Option<Value> {
        self.data.read().get(name).cloned()
    }

    fn context(&self) -> &str {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_variable() {
        let var = PlaybookVariable::parse("#App:1234:output.hosts!StringArray").unwrap();
        assert_eq!(var.app_type, "App");
        assert_eq!(var.job_id, "1234");
        assert_eq!(var.key, "output.hosts");
        assert_eq!(var.var_type, "StringArray");

        assert!(PlaybookVariable::parse("plain-name").is_none());
        assert!(PlaybookVariable::parse("#App:abc:key!String").is_none());
    }

    #[test]
    fn test_memory_store_read_and_type() {
        let store = MemoryStore::new("ctx");
        assert!(store.is_empty());
        store.stage("#App:1:name!String", json!("value"));

        assert_eq!(store.read("#App:1:name!String"), Some(json!("value")));
        assert_eq!(store.read("#App:1:other!String"), None);
        assert_eq!(store.variable_type("#App:1:name!String").as_deref(), Some("String"));
        assert_eq!(store.context(), "ctx");

        assert_eq!(store.remove("#App:1:name!String"), Some(json!("value")));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_memory_store_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r##"{{"#App:1:count!String": "3", "#App:1:list!StringArray": ["a"]}}"##)
            .unwrap();

        let store = MemoryStore::from_file("ctx", file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.read("#App:1:list!StringArray"), Some(json!(["a"])));
    }

    #[test]
    fn test_memory_store_from_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();

        let err = MemoryStore::from_file("ctx", file.path()).err().unwrap();
        assert!(matches!(err, ValidateError::Json { .. }));
    }
}
