//! Comparison operator registry
//!
//! Operators are selected by string token. Every operator is a predicate
//! over `(actual, expected)`; actual is the data the app produced, expected
//! is the test data.

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Token table; several aliases map onto one operator
const TOKENS: &[(&str, Operator)] = &[
    ("dd", Operator::DeepDiff),
    ("eq", Operator::Eq),
    ("=", Operator::Eq),
    ("le", Operator::Le),
    ("<=", Operator::Le),
    ("lt", Operator::Lt),
    ("<", Operator::Lt),
    ("ge", Operator::Ge),
    (">=", Operator::Ge),
    ("gt", Operator::Gt),
    (">", Operator::Gt),
    ("jeq", Operator::JsonEq),
    ("ne", Operator::Ne),
    ("!=", Operator::Ne),
    ("rex", Operator::Regex),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Anchored regex match of actual against an expected pattern
    Regex,
    /// Order-insensitive structural equality
    DeepDiff,
    /// Structural equality after JSON-decoding strings and dropping excluded keys
    JsonEq,
}

/// Extra knobs for operators that take them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorOptions {
    /// Top-level keys removed from both sides before a `jeq` comparison
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl OperatorOptions {
    pub fn exclude<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Operator {
    /// Look up an operator by token; `None` for anything outside the catalog
    pub fn from_token(token: &str) -> Option<Operator> {
        TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
    }

    /// All accepted tokens
    pub fn tokens() -> impl Iterator<Item = &'static str> {
        TOKENS.iter().map(|(t, _)| *t)
    }

    /// Canonical token
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Regex => "rex",
            Operator::DeepDiff => "dd",
            Operator::JsonEq => "jeq",
        }
    }

    pub fn apply(&self, actual: &Value, expected: &Value, options: &OperatorOptions) -> bool {
        match self {
            Operator::Eq => loose_eq(actual, expected),
            Operator::Ne => !loose_eq(actual, expected),
            Operator::Lt => compare(actual, expected) == Some(Ordering::Less),
            Operator::Le => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt => compare(actual, expected) == Some(Ordering::Greater),
            Operator::Ge => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Regex => regex_match(actual, expected),
            Operator::DeepDiff => deep_diff(actual, expected),
            Operator::JsonEq => json_eq(actual, expected, options),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ============================================================================
// OPERATOR IMPLEMENTATIONS
// ============================================================================

/// Equality where numbers compare by value (`10 == 10.0`)
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => cmp_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(i, j)| loose_eq(i, j))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| loose_eq(v, w)))
        }
        _ => a == b,
    }
}

/// Ordering between values of the same JSON kind; mixed kinds are unordered
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => cmp_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (i, j) in x.iter().zip(y) {
                match compare(i, j)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        _ => None,
    }
}

/// Integers compare exactly; floats (or a float against an integer) go
/// through `f64`
pub(crate) fn cmp_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    // negative i64 against a u64 above i64::MAX
    match (x.as_i64(), y.as_u64(), x.as_u64(), y.as_i64()) {
        (Some(_), Some(_), None, None) => Some(Ordering::Less),
        (None, None, Some(_), Some(_)) => Some(Ordering::Greater),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

fn regex_match(actual: &Value, pattern: &Value) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_str(), pattern.as_str()) else {
        tracing::error!("[validator] Regex operator needs string data and a string pattern");
        return false;
    };

    match Regex::new(&format!("^(?:{})", pattern)) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::error!("[validator] Invalid regex pattern {}: {}", pattern, e);
            false
        }
    }
}

#[cfg(feature = "deep-diff")]
fn deep_diff(actual: &Value, expected: &Value) -> bool {
    let diffs = super::diff::deep_diff(actual, expected);
    if diffs.is_empty() {
        return true;
    }

    let rendered: Vec<String> = diffs.iter().map(ToString::to_string).collect();
    tracing::info!("[validator] Diff: {}", rendered.join("; "));
    false
}

#[cfg(not(feature = "deep-diff"))]
fn deep_diff(_actual: &Value, _expected: &Value) -> bool {
    tracing::error!("Deep diff support is not available (build with the `deep-diff` feature).");
    false
}

fn json_eq(actual: &Value, expected: &Value, options: &OperatorOptions) -> bool {
    let (Some(mut actual), Some(mut expected)) = (decode(actual), decode(expected)) else {
        return false;
    };

    // usually dynamic data like dates
    for key in &options.exclude {
        if let Value::Object(map) = &mut actual {
            map.remove(key);
        }
        if let Value::Object(map) = &mut expected {
            map.remove(key);
        }
    }

    deep_diff(&actual, &expected)
}

/// JSON-decode string data; other values are used as-is
fn decode(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => match serde_json::from_str(s) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("[validator] Data is not valid JSON: {}", e);
                None
            }
        },
        other => Some(other.clone()),
    }
}
