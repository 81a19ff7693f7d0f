//! Checked accessors over parsed JSON documents
//!
//! Documents stay `serde_json::Value` trees; every place that needs a
//! specific shape goes through these accessors so a wrong shape surfaces as
//! [`PresetError::TypeMismatch`] instead of a panic.

use serde_json::{Map, Value};

use crate::error::{PresetError, Result};

/// Name of the JSON kind of a value, for error messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed accessors that fail with a `TypeMismatch` error
pub trait ValueExt {
    fn as_object_checked(&self, context: &str) -> Result<&Map<String, Value>>;
    fn as_array_checked(&self, context: &str) -> Result<&Vec<Value>>;
    fn as_str_checked(&self, context: &str) -> Result<&str>;
}

fn mismatch(context: &str, expected: &'static str, found: &Value) -> PresetError {
    PresetError::TypeMismatch {
        context: context.to_string(),
        expected,
        found: kind_name(found),
    }
}

impl ValueExt for Value {
    fn as_object_checked(&self, context: &str) -> Result<&Map<String, Value>> {
        self.as_object().ok_or_else(|| mismatch(context, "object", self))
    }

    fn as_array_checked(&self, context: &str) -> Result<&Vec<Value>> {
        self.as_array().ok_or_else(|| mismatch(context, "array", self))
    }

    fn as_str_checked(&self, context: &str) -> Result<&str> {
        self.as_str().ok_or_else(|| mismatch(context, "string", self))
    }
}

/// Parse raw bytes into a document, naming the asset on failure
pub fn parse_document(name: &str, bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| PresetError::InvalidDocument {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
