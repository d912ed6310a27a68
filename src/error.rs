//! Error types for the toolcall-agent library.

use thiserror::Error;

/// Unified error type for a chat turn.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The completion provider could not be reached or rejected the call
    #[error("Provider communication error: {0}")]
    ProviderCommunication(#[from] crate::llm::ProviderError),

    /// Tool execution error
    #[error("Execution error: {0}")]
    Execution(#[from] crate::tool::ExecutionError),

    /// Tool-related error
    #[error("Tool error: {0}")]
    Tool(#[from] crate::tool::ToolError),

    /// Tool catalog error
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The request was rejected before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The caller cancelled the turn
    #[error("Chat turn cancelled")]
    Cancelled,

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
