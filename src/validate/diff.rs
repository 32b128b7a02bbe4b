//! Order-insensitive structural diff over JSON values
//!
//! Arrays are compared as multisets: every actual item must pair with a
//! distinct, structurally equal expected item. Numbers compare by value, so
//! `1` and `1.0` are equal; integers compare exactly.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::operators::cmp_numbers;

/// A single structural difference, addressed by a `root[...]` path
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    /// Both sides hold a value of the same kind but it differs
    ValueChanged { path: String, actual: Value, expected: Value },
    /// The two sides hold different JSON kinds
    TypeChanged { path: String, actual: Value, expected: Value },
    /// Present in expected data only
    Missing { path: String, value: Value },
    /// Present in actual data only
    Unexpected { path: String, value: Value },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::ValueChanged { path, actual, expected } => {
                write!(f, "{}: value {} != expected {}", path, actual, expected)
            }
            Difference::TypeChanged { path, actual, expected } => {
                write!(f, "{}: type of {} != type of expected {}", path, actual, expected)
            }
            Difference::Missing { path, value } => write!(f, "{}: missing {}", path, value),
            Difference::Unexpected { path, value } => write!(f, "{}: unexpected {}", path, value),
        }
    }
}

/// Every difference between `actual` and `expected`; empty means equal
pub fn deep_diff(actual: &Value, expected: &Value) -> Vec<Difference> {
    let mut out = Vec::new();
    diff_at("root", actual, expected, &mut out);
    out
}

pub fn deep_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => cmp_numbers(a, e) == Some(Ordering::Equal),
        (Value::Object(a), Value::Object(e)) => {
            a.len() == e.len()
                && a.iter().all(|(k, v)| e.get(k).is_some_and(|ev| deep_equal(v, ev)))
        }
        (Value::Array(a), Value::Array(e)) => {
            a.len() == e.len() && unmatched(a, e).0.is_empty()
        }
        _ => actual == expected,
    }
}

fn diff_at(path: &str, actual: &Value, expected: &Value, out: &mut Vec<Difference>) {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => {
            for (key, value) in e {
                let child = format!("{}['{}']", path, key);
                match a.get(key) {
                    Some(av) => diff_at(&child, av, value, out),
                    None => out.push(Difference::Missing { path: child, value: value.clone() }),
                }
            }
            for (key, value) in a {
                if !e.contains_key(key) {
                    out.push(Difference::Unexpected {
                        path: format!("{}['{}']", path, key),
                        value: value.clone(),
                    });
                }
            }
        }
        (Value::Array(a), Value::Array(e)) => {
            let (extra, missing) = unmatched(a, e);
            for i in extra {
                out.push(Difference::Unexpected {
                    path: format!("{}[{}]", path, i),
                    value: a[i].clone(),
                });
            }
            for j in missing {
                out.push(Difference::Missing {
                    path: format!("{}[{}]", path, j),
                    value: e[j].clone(),
                });
            }
        }
        _ if kind(actual) != kind(expected) => out.push(Difference::TypeChanged {
            path: path.to_string(),
            actual: actual.clone(),
            expected: expected.clone(),
        }),
        _ if !deep_equal(actual, expected) => out.push(Difference::ValueChanged {
            path: path.to_string(),
            actual: actual.clone(),
            expected: expected.clone(),
        }),
        _ => {}
    }
}

/// Pair items greedily; returns (unpaired actual indexes, unpaired expected indexes)
fn unmatched(actual: &[Value], expected: &[Value]) -> (Vec<usize>, Vec<usize>) {
    let mut used = vec![false; expected.len()];
    let mut extra = Vec::new();

    for (i, item) in actual.iter().enumerate() {
        let hit = expected
            .iter()
            .enumerate()
            .position(|(j, candidate)| !used[j] && deep_equal(item, candidate));
        match hit {
            Some(j) => used[j] = true,
            None => extra.push(i),
        }
    }

    let missing = used
        .iter()
        .enumerate()
        .filter(|(_, u)| !**u)
        .map(|(j, _)| j)
        .collect();
    (extra, missing)
}

fn kind(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
