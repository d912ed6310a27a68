use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::schema::SchemaBuilder;
use crate::tool::{Tool, ToolError};

/// Basic arithmetic on two numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform basic arithmetic: add, subtract, multiply or divide two numbers"
    }

    fn parameters_schema(&self) -> Value {
        SchemaBuilder::new()
            .number("a", "The first operand", true)
            .number("b", "The second operand", true)
            .string_enum(
                "operation",
                "The operation to perform",
                true,
                ["add", "subtract", "multiply", "divide"],
            )
            .build()
    }

    /// Calculation problems the model can act on, such as a zero divisor,
    /// come back as an `{"error": ...}` object instead of an `Err`.
    async fn execute(&self, args: Map<String, Value>) -> Result<String, ToolError> {
        let a = number_arg(&args, "a")?;
        let b = number_arg(&args, "b")?;
        let operation = args
            .get("operation")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();

        let result = match operation {
            "" => return Ok(error_json("operation must not be empty")),
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" if b == 0.0 => return Ok(error_json("divisor cannot be zero")),
            "divide" => a / b,
            other => return Ok(error_json(&format!("unsupported operation: {}", other))),
        };

        Ok(json!({
            "a": a,
            "b": b,
            "operation": operation,
            "result": result,
        })
        .to_string())
    }
}

/// Reads a number that may arrive as a JSON number or a numeric string.
fn number_arg(args: &Map<String, Value>, key: &str) -> Result<f64, ToolError> {
    let value = match args.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    value.ok_or_else(|| ToolError::InvalidArguments(format!("'{}' must be a number", key)))
}

fn error_json(message: &str) -> String {
    json!({ "error": message }).to_string()
}
