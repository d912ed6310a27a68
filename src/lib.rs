//! # Toolcall Agent
//!
//! A tool-calling orchestration engine for OpenAI-compatible chat models.
//!
//! ## Features
//!
//! - **Tool Registry**: Builtin tools discovered at startup, shared lock-free
//! - **Schema Builder/Validator**: Describe and check tool parameters
//! - **Executor**: Builtin and remote HTTP tools with timeout and retry
//! - **Orchestrator**: Two-phase chat turn with an audit trail of tool calls
//! - **Catalog Sync**: Insert-if-absent copy of builtins into a tool store
//!
//! ## Quick Start
//!
//! ```no_run
//! use toolcall_agent::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProviderConfig::from_env()?;
//!     let provider = config.build_client()?;
//!
//!     let registry = Arc::new(ToolRegistry::with_builtins());
//!     let store: Arc<dyn ToolStore> = Arc::new(InMemoryToolStore::new());
//!     let executor = ToolExecutor::new(registry.clone(), Arc::new(ReqwestTransport::new()));
//!     let loader = ToolLoader::new(registry, store);
//!
//!     let orchestrator = ChatOrchestrator::new(provider, executor, loader, config.chat_defaults());
//!     let response = orchestrator
//!         .chat_with_tools(ChatRequest::user("What is 2 + 3?"))
//!         .await?;
//!
//!     println!("{}", response.content);
//!     for call in &response.tool_calls {
//!         println!("{} -> {}", call.name, call.result);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod schema;
pub mod session;
pub mod store;
pub mod tool;

// Re-exports for convenient usage
pub use agent::{ChatOrchestrator, ChatTurn, OrchestrationState};
pub use config::{ChatDefaults, ConfigError, ProviderConfig};
pub use error::AgentError;
pub use llm::{
    CompletionClientBuilder, CompletionProvider, CompletionRequest, CompletionResponse,
    OpenAiCompatibleClient, ProviderError,
};
pub use schema::{SchemaBuilder, ValidationResult};
pub use session::{ChatRequest, ChatResponse, Message, MessageContent, MessageRole};
pub use store::{InMemoryToolStore, StoreError, ToolRecord, ToolStore};
pub use tool::{
    BuiltinSynchronizer, DynTool, ExecutionError, ExecutionFailure, RemoteHttpTool, Tool,
    ToolCallRecord, ToolDescriptor, ToolError, ToolExecutor, ToolKind, ToolLoader, ToolRegistry,
    ToolSet,
};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::agent::ChatOrchestrator;
    pub use crate::config::ProviderConfig;
    pub use crate::error::AgentError;
    pub use crate::llm::CompletionProvider;
    pub use crate::session::{ChatRequest, ChatResponse, Message};
    pub use crate::store::{InMemoryToolStore, ToolStore};
    pub use crate::tool::{
        ReqwestTransport, Tool, ToolError, ToolExecutor, ToolLoader, ToolRegistry,
    };
    pub use std::sync::Arc;
}
