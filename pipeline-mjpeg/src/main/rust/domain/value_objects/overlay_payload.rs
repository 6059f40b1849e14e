use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, Result};

/// Keys a client may send that would otherwise collide with the stored identifier.
pub const RESERVED_ID_FIELDS: &[&str] = &["id", "_id"];

/// Opaque overlay attributes. Always a JSON object, never carries an identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayPayload(Map<String, Value>);

impl OverlayPayload {
    /// Accept a client body, discarding any identifier fields.
    pub fn from_client(value: Value) -> Result<Self> {
        match value {
            Value::Object(mut fields) => {
                for key in RESERVED_ID_FIELDS {
                    fields.remove(*key);
                }
                Ok(Self(fields))
            }
            other => Err(DomainError::InvalidPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Rebuild a payload previously written by the store.
    pub fn from_stored(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| DomainError::StoreFailed(format!("corrupt overlay document: {}", e)))?;
        Self::from_client(value)
    }

    /// Top-level keys of `patch` replace ours; everything else is kept.
    pub fn merge(&mut self, patch: OverlayPayload) {
        for (key, value) in patch.0 {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_string(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
