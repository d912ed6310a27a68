use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::remote::RemoteHttpTool;
use super::{DynTool, ToolDefinition, ToolKind};

/// A tool known to the system, dispatched on its kind.
#[derive(Clone)]
pub enum ToolDescriptor {
    /// In-process implementation
    Builtin(DynTool),
    /// Outbound HTTP endpoint
    Remote(Arc<RemoteHttpTool>),
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        match self {
            ToolDescriptor::Builtin(tool) => tool.name(),
            ToolDescriptor::Remote(tool) => &tool.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ToolDescriptor::Builtin(tool) => tool.description(),
            ToolDescriptor::Remote(tool) => &tool.description,
        }
    }

    pub fn parameters_schema(&self) -> Value {
        match self {
            ToolDescriptor::Builtin(tool) => tool.parameters_schema(),
            ToolDescriptor::Remote(tool) => tool.parameters.clone(),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolDescriptor::Builtin(_) => ToolKind::Builtin,
            ToolDescriptor::Remote(_) => ToolKind::RemoteHttp,
        }
    }

    /// Builtins report through their health check, remote tools through
    /// their stored active flag.
    pub fn is_available(&self) -> bool {
        match self {
            ToolDescriptor::Builtin(tool) => tool.is_available(),
            ToolDescriptor::Remote(tool) => tool.active,
        }
    }

    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

impl From<DynTool> for ToolDescriptor {
    fn from(tool: DynTool) -> Self {
        ToolDescriptor::Builtin(tool)
    }
}

impl From<RemoteHttpTool> for ToolDescriptor {
    fn from(tool: RemoteHttpTool) -> Self {
        ToolDescriptor::Remote(Arc::new(tool))
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("available", &self.is_available())
            .finish()
    }
}
