//! Maps tool descriptors onto the provider's function-calling contract.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::warn;

use super::ToolDescriptor;
use crate::schema::{is_empty_schema, validate, SchemaBuilder};
use crate::store::ToolRecord;

/// Function names the provider accepts.
static FUNCTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("function name pattern is valid")
});

/// A tool as the provider expects it in the `tools` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// `None` lets the provider assume "no arguments".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<FunctionParameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameters {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ProviderToolSpec {
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Converts a registered tool into its provider-facing spec.
pub fn to_wire_format(descriptor: &ToolDescriptor) -> ProviderToolSpec {
    spec_from_parts(
        descriptor.name(),
        descriptor.description(),
        &descriptor.parameters_schema(),
    )
}

/// Converts a persisted record; a record without parameters takes none.
pub fn record_to_wire_format(record: &ToolRecord) -> ProviderToolSpec {
    let schema = record
        .parameters
        .clone()
        .unwrap_or_else(SchemaBuilder::empty);
    spec_from_parts(&record.name, &record.description, &schema)
}

fn spec_from_parts(name: &str, description: &str, schema: &Value) -> ProviderToolSpec {
    if !FUNCTION_NAME.is_match(name) {
        warn!(tool = %name, "Tool name does not satisfy the provider's function name rules");
    }

    let findings = validate(schema);
    if !findings.is_valid() {
        warn!(tool = %name, errors = %findings.error_message(), "Tool parameter schema failed validation");
    }

    ProviderToolSpec {
        kind: "function".to_string(),
        function: FunctionSpec {
            name: name.to_string(),
            description: description.to_string(),
            parameters: build_parameters(name, schema),
        },
    }
}

/// Transcribes a schema into provider parameters.
///
/// Empty schemas yield `None`. A schema that cannot be transcribed falls back
/// to an `object` carrying only its `required` list, so the tool stays
/// invocable.
pub fn build_parameters(name: &str, schema: &Value) -> Option<FunctionParameters> {
    if is_empty_schema(schema) {
        return None;
    }

    match transcribe(schema) {
        Ok(parameters) => Some(parameters),
        Err(reason) => {
            warn!(tool = %name, reason = %reason, "Falling back to minimal parameters");
            Some(minimal_parameters(schema))
        }
    }
}

fn transcribe(schema: &Value) -> Result<FunctionParameters, String> {
    let parameters: FunctionParameters =
        serde_json::from_value(schema.clone()).map_err(|e| e.to_string())?;

    if parameters.kind != "object" {
        return Err(format!("root type must be 'object', found '{}'", parameters.kind));
    }

    if let Some(properties) = &parameters.properties {
        if let Some((name, _)) = properties.iter().find(|(_, definition)| !definition.is_object()) {
            return Err(format!("property '{}' is not an object", name));
        }
    }

    Ok(parameters)
}

fn minimal_parameters(schema: &Value) -> FunctionParameters {
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        });

    FunctionParameters {
        kind: "object".to_string(),
        properties: None,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{CalculatorTool, RemoteHttpTool, ToolKind};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_builtin_to_wire() {
        let descriptor = ToolDescriptor::Builtin(Arc::new(CalculatorTool));
        let spec = to_wire_format(&descriptor);

        assert_eq!(spec.kind, "function");
        assert_eq!(spec.function.name, "calculator");
        let parameters = spec.function.parameters.unwrap();
        assert_eq!(parameters.kind, "object");
        assert_eq!(
            parameters.required.unwrap(),
            ["a", "b", "operation"]
        );
        assert!(parameters.properties.unwrap().contains_key("operation"));
    }

    #[test]
    fn test_wire_json_round_trip_keeps_identity() {
        let descriptor = ToolDescriptor::Builtin(Arc::new(CalculatorTool));
        let spec = to_wire_format(&descriptor);

        let text = serde_json::to_string(&spec).unwrap();
        let back: ProviderToolSpec = serde_json::from_str(&text).unwrap();

        assert_eq!(back.function.name, descriptor.name());
        assert_eq!(back.function.description, descriptor.description());
        assert_eq!(back, spec);
    }

    #[test]
    fn test_wire_shape() {
        let tool = RemoteHttpTool::new("ping", "Ping a host", "https://example.com/ping");
        let spec = to_wire_format(&tool.into());
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "function",
                "function": {
                    "name": "ping",
                    "description": "Ping a host",
                    "parameters": {"type": "object", "properties": {}}
                }
            })
        );
    }

    #[test]
    fn test_empty_schema_has_no_parameters() {
        assert!(build_parameters("t", &json!({})).is_none());
        assert!(build_parameters("t", &Value::Null).is_none());

        let spec = serde_json::to_value(spec_from_parts("t", "d", &json!({}))).unwrap();
        assert!(spec["function"].get("parameters").is_none());
    }

    #[test]
    fn test_fallback_keeps_required() {
        let schema = json!({
            "type": "object",
            "properties": ["not", "a", "map"],
            "required": ["query"]
        });
        let parameters = build_parameters("search", &schema).unwrap();

        assert_eq!(parameters.kind, "object");
        assert!(parameters.properties.is_none());
        assert_eq!(parameters.required.unwrap(), ["query"]);
    }

    #[test]
    fn test_fallback_on_wrong_root_type() {
        let parameters = build_parameters("t", &json!({"type": "array"})).unwrap();
        assert_eq!(parameters.kind, "object");
        assert!(parameters.properties.is_none());
        assert!(parameters.required.is_none());
    }

    #[test]
    fn test_fallback_on_scalar_property() {
        let schema = json!({"type": "object", "properties": {"a": 1}, "required": "a"});
        let parameters = build_parameters("t", &schema).unwrap();
        assert!(parameters.properties.is_none());
        assert!(parameters.required.is_none());
    }

    #[test]
    fn test_record_conversion() {
        let mut record = ToolRecord::remote("lookup", "Look things up", "https://example.com", "GET");
        assert_eq!(record.kind, ToolKind::RemoteHttp);
        record.parameters = None;

        let spec = record_to_wire_format(&record);
        assert_eq!(spec.name(), "lookup");
        assert_eq!(spec.function.parameters.unwrap().kind, "object");
    }
}
