use serde::{Deserialize, Serialize};
use std::fmt;

/// A single item flowing between pipeline stages
///
/// Source items are integers; every hashing stage produces text. The
/// closed enum makes any other shape unrepresentable, so stages never
/// have to reject unexpected input at runtime.
///
/// Every value has a canonical text projection ([`Value::into_text`] /
/// [`fmt::Display`]) that is total and lossless for both variants. The
/// projection is what the hash primitives consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Canonical text projection, consuming the value
    pub fn into_text(self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Text(s) => s,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
