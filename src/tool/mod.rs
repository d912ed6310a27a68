pub mod builtin;
pub mod converter;
pub mod descriptor;
pub mod executor;
pub mod http;
pub mod loader;
pub mod registry;
pub mod remote;
pub mod sync;

pub use builtin::{builtin_tools, CalculatorTool, CurrentTimeTool};
pub use converter::{to_wire_format, FunctionParameters, FunctionSpec, ProviderToolSpec};
pub use descriptor::ToolDescriptor;
pub use executor::{ExecutionError, ExecutionFailure, ToolExecutor};
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use loader::{ToolLoader, ToolSet};
pub use registry::ToolRegistry;
pub use remote::{HttpMethod, RemoteHttpTool};
pub use sync::{BuiltinSynchronizer, SyncReport};
pub use tool_trait::{DynTool, Tool};
pub use tool_types::{ToolCallRecord, ToolDefinition, ToolError, ToolInvocationRequest, ToolKind};

mod tool_types {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::fmt;

    /// How a tool is carried out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ToolKind {
        /// Runs in-process
        #[serde(rename = "BUILTIN")]
        Builtin,
        /// Runs as an outbound HTTP call
        #[serde(rename = "HTTP")]
        RemoteHttp,
    }

    impl ToolKind {
        /// The marker stored alongside persisted tool records.
        pub fn as_str(&self) -> &'static str {
            match self {
                ToolKind::Builtin => "BUILTIN",
                ToolKind::RemoteHttp => "HTTP",
            }
        }
    }

    impl fmt::Display for ToolKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Definition of a tool that can be offered to the model.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ToolDefinition {
        /// The name of the tool
        pub name: String,
        /// A description of what the tool does
        pub description: String,
        /// JSON Schema for the tool's input parameters
        pub input_schema: Value,
    }

    /// Errors a builtin tool raises while executing.
    #[derive(Debug, thiserror::Error)]
    pub enum ToolError {
        #[error("Invalid arguments: {0}")]
        InvalidArguments(String),
        #[error("Execution failed: {0}")]
        ExecutionFailed(String),
    }

    /// A provider-issued request to run a tool.
    ///
    /// `id` is opaque and only pairs the request with its result message.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ToolInvocationRequest {
        pub id: String,
        pub name: String,
        /// Raw JSON arguments as sent by the provider
        pub arguments: String,
    }

    impl ToolInvocationRequest {
        pub fn new(
            id: impl Into<String>,
            name: impl Into<String>,
            arguments: impl Into<String>,
        ) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                arguments: arguments.into(),
            }
        }
    }

    /// Audit entry for one tool invocation, returned next to the final answer.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ToolCallRecord {
        pub id: String,
        pub name: String,
        pub arguments: String,
        /// What was handed back to the model
        pub result: String,
        pub success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub error_message: Option<String>,
    }

    impl ToolCallRecord {
        /// Records a successful invocation.
        pub fn succeeded(request: &ToolInvocationRequest, result: impl Into<String>) -> Self {
            Self {
                id: request.id.clone(),
                name: request.name.clone(),
                arguments: request.arguments.clone(),
                result: result.into(),
                success: true,
                error_message: None,
            }
        }

        /// Records a failed invocation; the result is the text the model sees.
        pub fn failed(request: &ToolInvocationRequest, error: impl fmt::Display) -> Self {
            let message = error.to_string();
            Self {
                id: request.id.clone(),
                name: request.name.clone(),
                arguments: request.arguments.clone(),
                result: format!("tool execution failed: {}", message),
                success: false,
                error_message: Some(message),
            }
        }
    }
}

mod tool_trait {
    use super::tool_types::{ToolDefinition, ToolError};
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::Arc;

    /// An in-process capability the model can invoke.
    #[async_trait]
    pub trait Tool: Send + Sync {
        /// Returns the name of the tool.
        fn name(&self) -> &str;
        /// Returns a description of what the tool does.
        fn description(&self) -> &str;
        /// Returns the JSON Schema for the tool's input parameters.
        fn parameters_schema(&self) -> Value;

        /// Health check consulted at registration and when tools are loaded.
        fn is_available(&self) -> bool {
            true
        }

        /// Executes the tool with the parsed arguments.
        async fn execute(&self, args: Map<String, Value>) -> Result<String, ToolError>;

        /// Converts the tool to its definition.
        fn to_definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name().to_string(),
                description: self.description().to_string(),
                input_schema: self.parameters_schema(),
            }
        }
    }

    /// A type alias for a dynamic tool reference.
    pub type DynTool = Arc<dyn Tool>;
}
