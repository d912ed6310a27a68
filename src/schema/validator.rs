//! Structural checks for parameter schemas.
//!
//! Validation is advisory: every problem found is collected so that a single
//! pass reports all of them, and callers decide whether to act on the result.

use serde_json::{Map, Value};
use tracing::error;

/// Property types a provider accepts.
pub const VALID_TYPES: [&str; 6] = ["string", "integer", "number", "boolean", "array", "object"];

/// The outcome of validating a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
}

impl ValidationResult {
    /// A passing result.
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing result carrying every error found.
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// All errors joined with `"; "`.
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// Validates a parameter schema.
///
/// An absent or empty schema is valid. A root without `type` fails
/// immediately; every other rule keeps collecting errors.
pub fn validate(schema: &Value) -> ValidationResult {
    let root = match schema {
        Value::Null => return ValidationResult::success(),
        Value::Object(map) if map.is_empty() => return ValidationResult::success(),
        Value::Object(map) => map,
        _ => return ValidationResult::failure(vec!["schema must be a JSON object".to_string()]),
    };

    let Some(kind) = root.get("type") else {
        return ValidationResult::failure(vec!["schema is missing 'type'".to_string()]);
    };

    let mut errors = Vec::new();

    if kind != "object" {
        errors.push(format!("schema root type must be 'object', found: {}", display(kind)));
    }
    if kind == "array" && !root.contains_key("items") {
        errors.push("schema root is of type 'array' but has no 'items'".to_string());
    }

    check_object_members(root, "", &mut errors);

    if errors.is_empty() {
        ValidationResult::success()
    } else {
        ValidationResult::failure(errors)
    }
}

/// Validates a schema given as JSON text. Blank text means "no parameters".
pub fn validate_json(schema_json: &str) -> ValidationResult {
    if schema_json.trim().is_empty() {
        return ValidationResult::success();
    }

    match serde_json::from_str::<Value>(schema_json) {
        Ok(schema) => validate(&schema),
        Err(e) => {
            error!(error = %e, "Failed to parse schema JSON");
            ValidationResult::failure(vec![format!("schema JSON is malformed: {}", e)])
        }
    }
}

/// Checks `properties` and `required` of an object node.
fn check_object_members(node: &Map<String, Value>, path: &str, errors: &mut Vec<String>) {
    if let Some(properties) = node.get("properties") {
        match properties.as_object() {
            Some(properties) => {
                for (name, definition) in properties {
                    check_property(&join(path, name), definition, errors);
                }
            }
            None => errors.push(format!("{}'properties' must be an object", location(path))),
        }
    }

    if let Some(required) = node.get("required") {
        if !required.is_array() {
            errors.push(format!("{}'required' must be an array", location(path)));
        }
    }
}

fn check_property(path: &str, definition: &Value, errors: &mut Vec<String>) {
    let Some(definition) = definition.as_object() else {
        errors.push(format!("property '{}' must be an object", path));
        return;
    };

    let kind = match definition.get("type") {
        None => {
            errors.push(format!("property '{}' is missing 'type'", path));
            return;
        }
        Some(Value::String(kind)) if VALID_TYPES.contains(&kind.as_str()) => kind.as_str(),
        Some(other) => {
            errors.push(format!("property '{}' has invalid type: {}", path, display(other)));
            return;
        }
    };

    match kind {
        "array" => match definition.get("items") {
            None => errors.push(format!(
                "property '{}' is of type 'array' but has no 'items'",
                path
            )),
            Some(items) => check_property(&format!("{}[]", path), items, errors),
        },
        "object" => check_object_members(definition, path, errors),
        _ => {}
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn location(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("property '{}': ", path)
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;
    use serde_json::json;

    #[test]
    fn test_empty_schemas_are_valid() {
        assert!(validate(&Value::Null).is_valid());
        assert!(validate(&json!({})).is_valid());
        assert!(validate(&SchemaBuilder::empty()).is_valid());
        assert!(validate_json("   ").is_valid());
    }

    #[test]
    fn test_builder_output_is_valid() {
        let schema = SchemaBuilder::new()
            .string("s", "a string", true)
            .integer("i", "an integer", false)
            .number_range("n", "a number", true, Some(0.0), Some(1.0))
            .boolean("b", "a flag", false)
            .string_enum("e", "a choice", false, ["x", "y"])
            .build();

        let result = validate(&schema);
        assert!(result.is_valid(), "{}", result.error_message());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_missing_type_stops_early() {
        let result = validate(&json!({"properties": "not a map", "required": "nope"}));
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("'type'"));
    }

    #[test]
    fn test_root_array_without_items() {
        let result = validate(&json!({"type": "array"}));
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 2);
        assert_eq!(
            result.errors().iter().filter(|e| e.contains("'items'")).count(),
            1
        );
        assert!(result.errors().iter().any(|e| e.contains("'object'")));
    }

    #[test]
    fn test_errors_are_collected() {
        let schema = json!({
            "type": "string",
            "properties": {
                "ok": {"type": "string"},
                "untyped": {"description": "no type here"},
                "weird": {"type": "date"},
                "list": {"type": "array"},
                "scalar": 42
            },
            "required": "ok"
        });

        let result = validate(&schema);
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 6, "{}", result.error_message());
        assert!(result.error_message().contains("'untyped' is missing 'type'"));
        assert!(result.error_message().contains("invalid type: date"));
        assert!(result.error_message().contains("'list' is of type 'array'"));
        assert!(result.error_message().contains("'scalar' must be an object"));
        assert!(result.error_message().contains("'required' must be an array"));
    }

    #[test]
    fn test_properties_must_be_a_map() {
        let result = validate(&json!({"type": "object", "properties": ["a"]}));
        assert_eq!(result.errors(), ["'properties' must be an object"]);
    }

    #[test]
    fn test_nested_nodes_are_checked() {
        let schema = json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "object",
                    "properties": {
                        "ids": {"type": "array"}
                    }
                },
                "points": {"type": "array", "items": {"type": "tuple"}}
            }
        });

        let result = validate(&schema);
        assert_eq!(result.errors().len(), 2, "{}", result.error_message());
        assert!(result.error_message().contains("'filter.ids'"));
        assert!(result.error_message().contains("'points[]' has invalid type"));
    }

    #[test]
    fn test_malformed_json() {
        let result = validate_json("{not json");
        assert!(!result.is_valid());
        assert!(result.errors()[0].starts_with("schema JSON is malformed"));
    }
}
