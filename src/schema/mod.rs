//! Parameter schemas describing tool inputs.
//!
//! Schemas are plain JSON values shaped like a JSON Schema subset: an `object`
//! root with named `properties`, optional `required` and per-property
//! constraints such as `enum`, `minimum` and `maximum`.

pub mod builder;
pub mod validator;

pub use builder::SchemaBuilder;
pub use validator::{validate, validate_json, ValidationResult, VALID_TYPES};

use serde_json::Value;

/// Returns whether the schema stands for "no parameters" (absent or `{}`).
pub fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
