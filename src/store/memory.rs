use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

use super::{StoreError, ToolRecord, ToolStore};
use crate::tool::ToolKind;

#[derive(Debug, Default)]
struct Catalog {
    next_id: i64,
    tools: Vec<ToolRecord>,
    bindings: HashMap<i64, HashSet<i64>>,
}

/// A [`ToolStore`] kept in process memory. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct InMemoryToolStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryToolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a stored tool available to an agent.
    pub async fn bind(&self, agent_id: i64, tool_id: i64) -> Result<(), StoreError> {
        let mut catalog = self.catalog.write().await;
        if !catalog.tools.iter().any(|t| t.id == Some(tool_id)) {
            return Err(StoreError::Backend(format!("no tool with id {}", tool_id)));
        }

        catalog.bindings.entry(agent_id).or_default().insert(tool_id);
        Ok(())
    }

    /// Binds every stored tool of `kind` to an agent. Returns how many were bound.
    pub async fn bind_kind(&self, agent_id: i64, kind: ToolKind) -> usize {
        let mut catalog = self.catalog.write().await;
        let ids: Vec<i64> = catalog
            .tools
            .iter()
            .filter(|t| t.kind == kind)
            .filter_map(|t| t.id)
            .collect();

        let bound = catalog.bindings.entry(agent_id).or_default();
        bound.extend(ids.iter().copied());
        ids.len()
    }

    pub async fn len(&self) -> usize {
        self.catalog.read().await.tools.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns every stored record in insertion order.
    pub async fn all(&self) -> Vec<ToolRecord> {
        self.catalog.read().await.tools.clone()
    }
}

#[async_trait]
impl ToolStore for InMemoryToolStore {
    async fn find_tool_by_name_and_kind(
        &self,
        name: &str,
        kind: ToolKind,
    ) -> Result<Option<ToolRecord>, StoreError> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .tools
            .iter()
            .find(|t| t.name == name && t.kind == kind)
            .cloned())
    }

    async fn insert_tool(&self, mut record: ToolRecord) -> Result<ToolRecord, StoreError> {
        let mut catalog = self.catalog.write().await;
        catalog.next_id += 1;
        record.id = Some(catalog.next_id);

        debug!(tool = %record.name, id = catalog.next_id, "Inserted tool record");
        catalog.tools.push(record.clone());
        Ok(record)
    }

    async fn list_tools_for_agent(&self, agent_id: i64) -> Result<Vec<ToolRecord>, StoreError> {
        let catalog = self.catalog.read().await;
        let Some(bound) = catalog.bindings.get(&agent_id) else {
            return Ok(Vec::new());
        };

        Ok(catalog
            .tools
            .iter()
            .filter(|t| t.id.is_some_and(|id| bound.contains(&id)))
            .cloned()
            .collect())
    }
}
