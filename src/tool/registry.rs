use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

use crate::tool::{builtin_tools, ToolDefinition, ToolDescriptor, ToolKind};

/// A registry of the tools known to the process, keyed by unique name.
///
/// The registry is filled once at startup and then shared behind an `Arc`, so
/// request handlers read it concurrently without locking.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Creates a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Creates a registry holding every discovered builtin tool.
    pub fn with_builtins() -> Self {
        info!("Initializing tool registry");

        let mut registry = Self::new();
        for tool in builtin_tools() {
            registry.register(tool);
        }

        info!(count = registry.len(), "Tool registry initialized");
        registry.log_registered();
        registry
    }

    /// Registers a tool.
    ///
    /// Tools with an empty or untrimmed name, or that report themselves
    /// unavailable, are skipped. A name collision replaces the earlier tool. Returns whether the
    /// tool was stored.
    pub fn register(&mut self, tool: impl Into<ToolDescriptor>) -> bool {
        let tool = tool.into();
        let name = tool.name().to_string();

        if name.trim().is_empty() {
            warn!(kind = %tool.kind(), "Tool name is empty, skipping registration");
            return false;
        }

        if name.trim() != name {
            warn!(tool = ?name, "Tool name has surrounding whitespace, skipping registration");
            return false;
        }

        if !tool.is_available() {
            warn!(tool = %name, "Tool is unavailable, skipping registration");
            return false;
        }

        if self.tools.contains_key(&name) {
            warn!(tool = %name, "Duplicate tool name, replacing the earlier registration");
        }

        info!(tool = %name, kind = %tool.kind(), "Registered tool");
        self.tools.insert(name, tool);
        true
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Returns whether a tool with this name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns every tool of the given kind.
    pub fn all_by_kind(&self, kind: ToolKind) -> HashMap<String, ToolDescriptor> {
        self.tools
            .iter()
            .filter(|(_, tool)| tool.kind() == kind)
            .map(|(name, tool)| (name.clone(), tool.clone()))
            .collect()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Converts all tools to their definitions, sorted by name.
    pub fn to_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(ToolDescriptor::to_definition)
            .collect()
    }

    fn log_registered(&self) {
        if self.tools.is_empty() {
            info!("No tools discovered");
            return;
        }

        for name in self.names() {
            if let Some(tool) = self.tools.get(name) {
                info!(tool = name, kind = %tool.kind(), "  - {}", tool.description());
            }
        }
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools_count", &self.tools.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a ToolRegistry {
    type Item = (&'a String, &'a ToolDescriptor);
    type IntoIter = std::collections::hash_map::Iter<'a, String, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}
