//! Key/value store validation
//!
//! Reads playbook variables out of the staging store and checks them for
//! presence, declared shape, or against test data with an [`Operator`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::staging::KeyValueStore;

use super::operators::{Operator, OperatorOptions};
use super::outcome::{BatchOutcome, Outcome};

/// Container shape implied by a declared variable type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Sequence,
    String,
    Mapping,
}

impl ContainerKind {
    /// `…Array` ⇒ sequence, `String…` ⇒ string, `KeyValuePair…` ⇒ mapping
    pub fn from_declared(declared: &str) -> Option<Self> {
        if declared.ends_with("Array") {
            Some(ContainerKind::Sequence)
        } else if declared.starts_with("String") {
            Some(ContainerKind::String)
        } else if declared.starts_with("KeyValuePair") {
            Some(ContainerKind::Mapping)
        } else {
            None
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ContainerKind::Sequence => value.is_array(),
            ContainerKind::String => value.is_string(),
            ContainerKind::Mapping => value.is_object(),
        }
    }
}

/// One entry of a test profile's `outputs` section
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileOutput {
    pub expected_output: Value,
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

pub type ProfileOutputs = BTreeMap<String, ProfileOutput>;

pub struct KeyValueValidator<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> KeyValueValidator<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Stored value, with JSON `null` treated as absent
    fn read(&self, variable: &str) -> Option<Value> {
        self.store.read(variable).filter(|v| !v.is_null())
    }

    /// Variable name is non-empty and has a stored value
    pub fn not_null(&self, variable: &str) -> Outcome {
        if variable.is_empty() {
            return Outcome::fail("NoneError: Key/value variable not provided");
        }

        let data = self.read(variable);
        tracing::info!("[validator] Variable: {}", variable);
        tracing::info!("[validator] DB Data: {:?}", data);

        if data.is_none() {
            return Outcome::fail(format!(
                "NotFoundError: Key/value variable {} was not found.",
                variable
            ));
        }
        Outcome::pass()
    }

    /// Stored value exists and has the shape implied by `declared_type`
    pub fn type_check(&self, variable: &str, declared_type: &str) -> Outcome {
        let data = self.read(variable);
        tracing::info!("[validator] Variable: {}", variable);
        tracing::info!("[validator] App Data:  {:?}", data);

        let Some(data) = data else {
            return Outcome::fail(format!(
                "NotFoundError: Key/value variable {} was not found.",
                variable
            ));
        };

        match ContainerKind::from_declared(declared_type) {
            Some(kind) if kind.matches(&data) => Outcome::pass(),
            Some(kind) => Outcome::fail(format!(
                "TypeMismatchError: Declared type {} ({:?}) and variable {} do not match",
                declared_type, kind, variable
            )),
            None => Outcome::fail(format!(
                "TypeMismatchError: Declared type {} of variable {} has no known container kind",
                declared_type, variable
            )),
        }
    }

    /// [`type_check`](Self::type_check) against the type the store declares
    pub fn declared_type_check(&self, variable: &str) -> Outcome {
        match self.store.variable_type(variable) {
            Some(declared) => self.type_check(variable, &declared),
            None => Outcome::fail(format!(
                "TypeMismatchError: Key/value variable {} has no declared type",
                variable
            )),
        }
    }

    /// Compare the stored value against `expected` with operator `op`
    pub fn data(
        &self,
        variable: &str,
        expected: &Value,
        op: &str,
        options: &OperatorOptions,
    ) -> Outcome {
        if variable.is_empty() {
            return Outcome::fail("NoneError: Key/value variable not provided");
        }

        let Some(operator) = Operator::from_token(op) else {
            return Outcome::fail(format!("Invalid operator provided ({})", op));
        };

        let actual = self.read(variable).unwrap_or(Value::Null);

        tracing::info!("[validator] Variable:  {}", variable);
        tracing::info!("[validator] App Data:  {}", actual);
        tracing::info!("[validator] Test Data: {}", expected);
        tracing::debug!("[validator] Lookup: hget {} '{}'", self.store.context(), variable);

        if operator.apply(&actual, expected, options) {
            Outcome::pass()
        } else {
            Outcome::fail(format!(
                "ComparisonError: Variable {} failed `{}` against test data {}",
                variable, operator, expected
            ))
        }
    }

    pub fn eq(&self, variable: &str, expected: &Value) -> Outcome {
        self.data(variable, expected, "eq", &OperatorOptions::default())
    }

    pub fn ne(&self, variable: &str, expected: &Value) -> Outcome {
        self.data(variable, expected, "ne", &OperatorOptions::default())
    }

    pub fn lt(&self, variable: &str, expected: &Value) -> Outcome {
        self.data(variable, expected, "lt", &OperatorOptions::default())
    }

    pub fn le(&self, variable: &str, expected: &Value) -> Outcome {
        self.data(variable, expected, "le", &OperatorOptions::default())
    }

    pub fn gt(&self, variable: &str, expected: &Value) -> Outcome {
        self.data(variable, expected, "gt", &OperatorOptions::default())
    }

    pub fn ge(&self, variable: &str, expected: &Value) -> Outcome {
        self.data(variable, expected, "ge", &OperatorOptions::default())
    }

    /// Test app data with regex
    pub fn rex(&self, variable: &str, pattern: &Value) -> Outcome {
        self.data(variable, pattern, "rex", &OperatorOptions::default())
    }

    /// Test JSON data equality
    pub fn jeq(&self, variable: &str, expected: &Value, options: &OperatorOptions) -> Outcome {
        self.data(variable, expected, "jeq", options)
    }

    /// Validate every entry of a test profile's `outputs` section
    pub fn outputs(&self, outputs: &ProfileOutputs) -> BatchOutcome {
        let results = outputs
            .iter()
            .map(|(variable, output)| {
                let op = output.op.as_deref().unwrap_or("eq");
                let options = OperatorOptions::exclude(output.exclude.iter().cloned());
                self.data(variable, &output.expected_output, op, &options)
            })
            .collect();

        BatchOutcome {
            results,
            diagnostics: Vec::new(),
        }
    }
}
