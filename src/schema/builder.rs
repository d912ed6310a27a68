use serde_json::{json, Map, Value};

/// A fluent accumulator for tool parameter schemas.
///
/// Properties keep their insertion order. Calling [`SchemaBuilder::build`]
/// projects the accumulated state into a fresh value, so later additions never
/// change a schema that was already built.
///
/// ```rust
/// use toolcall_agent::schema::SchemaBuilder;
///
/// let schema = SchemaBuilder::new()
///     .number("a", "First operand", true)
///     .string_enum("operation", "Operator", true, ["add", "subtract"])
///     .build();
///
/// assert_eq!(schema["type"], "object");
/// assert_eq!(schema["required"][1], "operation");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string property.
    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, "string", description, required, Map::new())
    }

    /// Adds a string property restricted to the given values.
    pub fn string_enum<I, S>(self, name: &str, description: &str, required: bool, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
        let mut constraints = Map::new();
        if !values.is_empty() {
            constraints.insert("enum".to_string(), Value::Array(values));
        }
        self.property(name, "string", description, required, constraints)
    }

    /// Adds an integer property.
    pub fn integer(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, "integer", description, required, Map::new())
    }

    /// Adds an integer property with optional inclusive bounds.
    pub fn integer_range(
        self,
        name: &str,
        description: &str,
        required: bool,
        minimum: Option<i64>,
        maximum: Option<i64>,
    ) -> Self {
        let constraints = bounds(minimum.map(Value::from), maximum.map(Value::from));
        self.property(name, "integer", description, required, constraints)
    }

    /// Adds a number property.
    pub fn number(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, "number", description, required, Map::new())
    }

    /// Adds a number property with optional inclusive bounds.
    pub fn number_range(
        self,
        name: &str,
        description: &str,
        required: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
    ) -> Self {
        let constraints = bounds(minimum.map(Value::from), maximum.map(Value::from));
        self.property(name, "number", description, required, constraints)
    }

    /// Adds a boolean property.
    pub fn boolean(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, "boolean", description, required, Map::new())
    }

    /// Adds an array property whose elements are of `item_type`.
    pub fn array(self, name: &str, description: &str, item_type: &str, required: bool) -> Self {
        let mut constraints = Map::new();
        constraints.insert("items".to_string(), json!({ "type": item_type }));
        self.property(name, "array", description, required, constraints)
    }

    /// Adds a nested object property.
    ///
    /// `schema` is usually the output of another builder; its `properties` and
    /// `required` entries are copied into the property definition.
    pub fn object(self, name: &str, description: &str, schema: Value, required: bool) -> Self {
        let constraints = match schema {
            Value::Object(map) => map
                .into_iter()
                .filter(|(key, _)| key != "type" && key != "description")
                .collect(),
            _ => Map::new(),
        };
        self.property(name, "object", description, required, constraints)
    }

    fn property(
        mut self,
        name: &str,
        kind: &str,
        description: &str,
        required: bool,
        constraints: Map<String, Value>,
    ) -> Self {
        let mut definition = Map::new();
        definition.insert("type".to_string(), Value::from(kind));
        definition.insert("description".to_string(), Value::from(description));
        definition.extend(constraints);

        self.properties.insert(name.to_string(), Value::Object(definition));

        let listed = self.required.iter().position(|r| r == name);
        match (required, listed) {
            (true, None) => self.required.push(name.to_string()),
            (false, Some(index)) => {
                self.required.remove(index);
            }
            _ => {}
        }

        self
    }

    /// Builds the schema: an `object` root, `properties` in insertion order and
    /// a `required` list only when something is required.
    pub fn build(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("object"));
        schema.insert("properties".to_string(), Value::Object(self.properties.clone()));

        if !self.required.is_empty() {
            schema.insert("required".to_string(), Value::from(self.required.clone()));
        }

        Value::Object(schema)
    }

    /// The schema of a tool that takes no parameters.
    pub fn empty() -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }
}

fn bounds(minimum: Option<Value>, maximum: Option<Value>) -> Map<String, Value> {
    let mut constraints = Map::new();
    if let Some(minimum) = minimum {
        constraints.insert("minimum".to_string(), minimum);
    }
    if let Some(maximum) = maximum {
        constraints.insert("maximum".to_string(), maximum);
    }
    constraints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_keeps_insertion_order() {
        let schema = SchemaBuilder::new()
            .string("zeta", "last letter", false)
            .integer("alpha", "first letter", true)
            .boolean("mid", "somewhere", false)
            .build();

        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(schema["required"], json!(["alpha"]));
    }

    #[test]
    fn test_required_omitted_when_empty() {
        let schema = SchemaBuilder::new().string("query", "search text", false).build();
        assert!(schema.get("required").is_none());
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn test_constraints() {
        let schema = SchemaBuilder::new()
            .string_enum("unit", "temperature unit", true, ["celsius", "fahrenheit"])
            .integer_range("days", "forecast days", false, Some(1), Some(7))
            .number_range("ratio", "a ratio", false, Some(0.0), None)
            .array("tags", "labels", "string", false)
            .build();

        let props = &schema["properties"];
        assert_eq!(props["unit"]["enum"], json!(["celsius", "fahrenheit"]));
        assert_eq!(props["days"]["minimum"], 1);
        assert_eq!(props["days"]["maximum"], 7);
        assert_eq!(props["ratio"]["minimum"], 0.0);
        assert!(props["ratio"].get("maximum").is_none());
        assert_eq!(props["tags"]["items"], json!({"type": "string"}));
    }

    #[test]
    fn test_nested_object() {
        let inner = SchemaBuilder::new().string("city", "city name", true).build();
        let schema = SchemaBuilder::new()
            .object("location", "where", inner, true)
            .build();

        let location = &schema["properties"]["location"];
        assert_eq!(location["type"], "object");
        assert_eq!(location["description"], "where");
        assert_eq!(location["properties"]["city"]["type"], "string");
        assert_eq!(location["required"], json!(["city"]));
    }

    #[test]
    fn test_build_is_a_snapshot() {
        let builder = SchemaBuilder::new().string("first", "one", true);
        let before = builder.build();
        let builder = builder.string("second", "two", true);
        let after = builder.build();

        assert_eq!(before["properties"].as_object().unwrap().len(), 1);
        assert_eq!(after["properties"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_redefining_property_updates_required() {
        let schema = SchemaBuilder::new()
            .string("name", "a name", true)
            .string("name", "a name", false)
            .build();

        assert_eq!(schema["properties"].as_object().unwrap().len(), 1);
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_empty() {
        assert_eq!(SchemaBuilder::empty(), json!({"type": "object", "properties": {}}));
    }
}
