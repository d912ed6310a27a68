use std::sync::Arc;
use tracing::{error, info, warn};

use super::converter::{to_wire_format, ProviderToolSpec};
use super::{RemoteHttpTool, ToolDescriptor, ToolKind, ToolRegistry};
use crate::store::{ToolRecord, ToolStore};

/// The tools offered in one conversation, with their provider-facing specs.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<ToolDescriptor>,
    specs: Vec<ProviderToolSpec>,
}

impl ToolSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a tool, replacing one of the same name.
    pub fn push(&mut self, tool: ToolDescriptor) {
        let spec = to_wire_format(&tool);
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => {
                warn!(tool = %tool.name(), "Tool loaded twice, keeping the later one");
                self.tools[index] = tool;
                self.specs[index] = spec;
            }
            None => {
                self.tools.push(tool);
                self.specs.push(spec);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn specs(&self) -> &[ProviderToolSpec] {
        &self.specs
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDescriptor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<ToolDescriptor> for ToolSet {
    fn from_iter<I: IntoIterator<Item = ToolDescriptor>>(iter: I) -> Self {
        let mut set = ToolSet::empty();
        for tool in iter {
            set.push(tool);
        }
        set
    }
}

/// Gathers the tools applicable to a conversation.
#[derive(Clone)]
pub struct ToolLoader {
    registry: Arc<ToolRegistry>,
    store: Arc<dyn ToolStore>,
}

impl ToolLoader {
    pub fn new(registry: Arc<ToolRegistry>, store: Arc<dyn ToolStore>) -> Self {
        Self { registry, store }
    }

    /// Loads the tool set for an agent, or every builtin when no agent is given.
    ///
    /// Loading never fails: records that cannot be used are skipped and a store
    /// failure yields an empty set, so the conversation carries on without tools.
    pub async fn load(&self, agent_id: Option<i64>) -> ToolSet {
        let set = match agent_id {
            None => self.all_builtins(),
            Some(agent_id) => match self.store.list_tools_for_agent(agent_id).await {
                Ok(records) => self.from_records(agent_id, &records),
                Err(e) => {
                    error!(agent_id, error = %e, "Failed to load agent tools, continuing without tools");
                    ToolSet::empty()
                }
            },
        };

        info!(agent_id = ?agent_id, count = set.len(), tools = ?set.names(), "Loaded tools");
        set
    }

    fn all_builtins(&self) -> ToolSet {
        let mut builtins: Vec<ToolDescriptor> = self
            .registry
            .all_by_kind(ToolKind::Builtin)
            .into_values()
            .filter(ToolDescriptor::is_available)
            .collect();
        builtins.sort_by(|a, b| a.name().cmp(b.name()));
        builtins.into_iter().collect()
    }

    fn from_records(&self, agent_id: i64, records: &[ToolRecord]) -> ToolSet {
        let mut set = ToolSet::empty();
        for record in records {
            if !record.enabled {
                info!(agent_id, tool = %record.name, "Tool is disabled, skipping");
                continue;
            }

            if let Some(tool) = self.resolve(record) {
                set.push(tool);
            }
        }
        set
    }

    fn resolve(&self, record: &ToolRecord) -> Option<ToolDescriptor> {
        match record.kind {
            ToolKind::Builtin => match self.registry.get(&record.name) {
                Some(tool) if tool.is_available() => Some(tool.clone()),
                Some(_) => {
                    warn!(tool = %record.name, "Builtin tool is unavailable, skipping");
                    None
                }
                None => {
                    warn!(tool = %record.name, "Builtin tool is not registered, skipping");
                    None
                }
            },
            ToolKind::RemoteHttp => match RemoteHttpTool::from_record(record) {
                Ok(tool) if tool.endpoint.trim().is_empty() => {
                    warn!(tool = %record.name, "Remote tool has no endpoint, skipping");
                    None
                }
                Ok(tool) => Some(tool.into()),
                Err(e) => {
                    warn!(tool = %record.name, error = %e, "Remote tool could not be converted, skipping");
                    None
                }
            },
        }
    }
}

impl std::fmt::Debug for ToolLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLoader")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryToolStore, StoreError};
    use crate::tool::{ToolDefinition, ToolRegistry};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl ToolStore for BrokenStore {
        async fn find_tool_by_name_and_kind(
            &self,
            _name: &str,
            _kind: ToolKind,
        ) -> Result<Option<ToolRecord>, StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }

        async fn insert_tool(&self, _record: ToolRecord) -> Result<ToolRecord, StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }

        async fn list_tools_for_agent(&self, _agent_id: i64) -> Result<Vec<ToolRecord>, StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::with_builtins())
    }

    async fn bind(store: &InMemoryToolStore, agent_id: i64, record: ToolRecord) {
        let stored = store.insert_tool(record).await.unwrap();
        store.bind(agent_id, stored.id.unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_agent_loads_all_builtins() {
        let loader = ToolLoader::new(registry(), Arc::new(InMemoryToolStore::new()));
        let set = loader.load(None).await;

        assert_eq!(set.names(), ["calculator", "get_current_time"]);
        assert_eq!(set.specs().len(), 2);
        assert_eq!(set.specs()[0].name(), "calculator");
    }

    #[tokio::test]
    async fn test_agent_scope() {
        let store = Arc::new(InMemoryToolStore::new());
        let calculator = ToolDefinition {
            name: "calculator".to_string(),
            description: "Calculator".to_string(),
            input_schema: serde_json::json!({}),
        };
        let ghost = ToolDefinition {
            name: "ghost".to_string(),
            ..calculator.clone()
        };
        let mut disabled = ToolRecord::remote("off", "Off", "https://example.com/off", "GET");
        disabled.enabled = false;

        bind(&store, 1, ToolRecord::builtin(&calculator)).await;
        bind(&store, 1, ToolRecord::builtin(&ghost)).await;
        bind(&store, 1, disabled).await;
        bind(&store, 1, ToolRecord::remote("weather", "Weather", "https://example.com/w", "GET")).await;
        bind(&store, 1, ToolRecord::remote("odd", "Odd", "https://example.com/o", "TRACE")).await;

        let loader = ToolLoader::new(registry(), store);
        let set = loader.load(Some(1)).await;

        assert_eq!(set.names(), ["calculator", "weather"]);
        assert_eq!(set.get("weather").unwrap().kind(), ToolKind::RemoteHttp);
        assert!(loader.load(Some(2)).await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty() {
        let loader = ToolLoader::new(registry(), Arc::new(BrokenStore));
        assert!(loader.load(Some(1)).await.is_empty());
        assert_eq!(loader.load(None).await.len(), 2);
    }

    #[test]
    fn test_push_replaces_same_name() {
        let mut set = ToolSet::empty();
        set.push(RemoteHttpTool::new("w", "first", "https://example.com/1").into());
        set.push(RemoteHttpTool::new("w", "second", "https://example.com/2").into());

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("w").unwrap().description(), "second");
        assert_eq!(set.specs()[0].function.description, "second");
    }
}
