//! Persisted tool catalog boundary.
//!
//! The engine only needs lookups, inserts and per-agent listings; any backend
//! that provides those implements [`ToolStore`].

pub mod memory;

pub use memory::InMemoryToolStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::SchemaBuilder;
use crate::tool::remote::{DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT};
use crate::tool::{ToolDefinition, ToolKind};

/// A tool as the catalog stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Assigned by the store on insert
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub kind: ToolKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    pub enabled: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_retry_count() -> u32 {
    DEFAULT_RETRY_COUNT
}

impl ToolRecord {
    /// Derives a record from a builtin tool's definition.
    pub fn builtin(definition: &ToolDefinition) -> Self {
        Self {
            id: None,
            name: definition.name.clone(),
            description: definition.description.clone(),
            kind: ToolKind::Builtin,
            endpoint: None,
            method: None,
            parameters: Some(definition.input_schema.clone()),
            headers: BTreeMap::new(),
            timeout_ms: default_timeout_ms(),
            retry_count: DEFAULT_RETRY_COUNT,
            enabled: true,
        }
    }

    /// A remote HTTP record with default limits and no parameters.
    pub fn remote(
        name: impl Into<String>,
        description: impl Into<String>,
        endpoint: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            kind: ToolKind::RemoteHttp,
            endpoint: Some(endpoint.into()),
            method: Some(method.into()),
            parameters: Some(SchemaBuilder::empty()),
            headers: BTreeMap::new(),
            timeout_ms: default_timeout_ms(),
            retry_count: DEFAULT_RETRY_COUNT,
            enabled: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Lookup and listing service over persisted tools.
#[async_trait]
pub trait ToolStore: Send + Sync {
    async fn find_tool_by_name_and_kind(
        &self,
        name: &str,
        kind: ToolKind,
    ) -> Result<Option<ToolRecord>, StoreError>;

    /// Inserts a record and returns it with its assigned id.
    async fn insert_tool(&self, record: ToolRecord) -> Result<ToolRecord, StoreError>;

    async fn list_tools_for_agent(&self, agent_id: i64) -> Result<Vec<ToolRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_limits_default_when_omitted() {
        let record: ToolRecord = serde_json::from_value(json!({
            "name": "weather",
            "description": "Weather lookup",
            "kind": "HTTP",
            "endpoint": "https://api.example.com/weather",
            "method": "GET",
            "enabled": true
        }))
        .unwrap();

        assert_eq!(record.timeout_ms, 30_000);
        assert_eq!(record.retry_count, 3);
        assert!(record.id.is_none());
        assert!(record.headers.is_empty());
    }
}
