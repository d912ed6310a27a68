use std::sync::Arc;
use tracing::{error, info};

use super::{ToolKind, ToolRegistry};
use crate::store::{StoreError, ToolRecord, ToolStore};

/// Counts from one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Copies registered builtins into the persisted catalog.
///
/// Records are only ever inserted. An existing record is left untouched so
/// edits made to it survive restarts.
pub struct BuiltinSynchronizer {
    registry: Arc<ToolRegistry>,
    store: Arc<dyn ToolStore>,
}

impl BuiltinSynchronizer {
    pub fn new(registry: Arc<ToolRegistry>, store: Arc<dyn ToolStore>) -> Self {
        Self { registry, store }
    }

    pub async fn synchronize(&self) -> SyncReport {
        info!("Synchronizing builtin tools into the catalog");

        let mut report = SyncReport::default();
        let builtins = self.registry.all_by_kind(ToolKind::Builtin);
        let mut names: Vec<&String> = builtins.keys().collect();
        names.sort();

        for name in names {
            let definition = builtins[name].to_definition();
            match self.sync_one(ToolRecord::builtin(&definition)).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    error!(tool = %name, error = %e, "Failed to synchronize builtin tool");
                    report.failed += 1;
                }
            }
        }

        info!(
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failed,
            "Builtin tool synchronization finished"
        );
        report
    }

    async fn sync_one(&self, record: ToolRecord) -> Result<bool, StoreError> {
        if self
            .store
            .find_tool_by_name_and_kind(&record.name, ToolKind::Builtin)
            .await?
            .is_some()
        {
            info!(tool = %record.name, "Builtin tool already in catalog");
            return Ok(false);
        }

        let stored = self.store.insert_tool(record).await?;
        info!(tool = %stored.name, id = ?stored.id, "Added builtin tool to catalog");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryToolStore;
    use async_trait::async_trait;

    /// Fails every operation on one tool name.
    struct FlakyStore {
        inner: InMemoryToolStore,
        poisoned: &'static str,
    }

    #[async_trait]
    impl ToolStore for FlakyStore {
        async fn find_tool_by_name_and_kind(
            &self,
            name: &str,
            kind: ToolKind,
        ) -> Result<Option<ToolRecord>, StoreError> {
            if name == self.poisoned {
                return Err(StoreError::Backend("lookup failed".to_string()));
            }
            self.inner.find_tool_by_name_and_kind(name, kind).await
        }

        async fn insert_tool(&self, record: ToolRecord) -> Result<ToolRecord, StoreError> {
            self.inner.insert_tool(record).await
        }

        async fn list_tools_for_agent(&self, agent_id: i64) -> Result<Vec<ToolRecord>, StoreError> {
            self.inner.list_tools_for_agent(agent_id).await
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent() {
        let registry = Arc::new(ToolRegistry::with_builtins());
        let store = Arc::new(InMemoryToolStore::new());
        let sync = BuiltinSynchronizer::new(registry, store.clone());

        let first = sync.synchronize().await;
        assert_eq!(first, SyncReport { inserted: 2, skipped: 0, failed: 0 });

        let second = sync.synchronize().await;
        assert_eq!(second, SyncReport { inserted: 0, skipped: 2, failed: 0 });
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_existing_record_is_not_updated() {
        let registry = Arc::new(ToolRegistry::with_builtins());
        let store = Arc::new(InMemoryToolStore::new());

        let mut edited = ToolRecord::builtin(&registry.get("calculator").unwrap().to_definition());
        edited.description = "Edited by hand".to_string();
        store.insert_tool(edited).await.unwrap();

        BuiltinSynchronizer::new(registry, store.clone()).synchronize().await;

        let kept = store
            .find_tool_by_name_and_kind("calculator", ToolKind::Builtin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.description, "Edited by hand");
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_loop() {
        let registry = Arc::new(ToolRegistry::with_builtins());
        let store = Arc::new(FlakyStore {
            inner: InMemoryToolStore::new(),
            poisoned: "calculator",
        });

        let report = BuiltinSynchronizer::new(registry, store.clone()).synchronize().await;

        assert_eq!(report, SyncReport { inserted: 1, skipped: 0, failed: 1 });
        assert_eq!(store.inner.all().await[0].name, "get_current_time");
    }
}
