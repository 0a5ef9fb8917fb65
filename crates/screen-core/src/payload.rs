//! Raw provider payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider-specific field bag, keyed by upstream field name.
///
/// Values are kept as whatever shape the provider sent; interpretation is
/// left to the [`Normalizer`](crate::normalizer::Normalizer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload {
    fields: Map<String, Value>,
}

impl RawPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Read a field as a finite float.
    ///
    /// JSON numbers are taken as-is and strings are parsed. Null, booleans,
    /// containers, unparseable strings and non-finite values are all absent.
    pub fn number(&self, key: &str) -> Option<f64> {
        let parsed = match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    /// Whether the field exists with a non-null value
    pub fn has(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(|v| !v.is_null())
    }

    /// Copy fields from `other` that are missing or null here.
    pub fn merge_missing(&mut self, other: RawPayload) {
        for (key, value) in other.fields {
            if value.is_null() || self.has(&key) {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
