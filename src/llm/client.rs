use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::openai::OpenAiCompatibleClient;
use crate::session::{Message, MessageContent};
use crate::tool::{ProviderToolSpec, ToolInvocationRequest};

/// Input for a completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The model to use
    pub model: String,
    /// The messages to send
    pub messages: Vec<Message>,
    /// Tools offered to the model; `None` sends no `tools` field at all
    pub tools: Option<Vec<ProviderToolSpec>>,
    /// Optional temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Output from a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    /// The text of the reply, if any
    pub content: Option<String>,
    /// The reason the response finished
    pub finish_reason: FinishReason,
    /// Tool invocations the model asked for
    pub tool_calls: Vec<ToolInvocationRequest>,
    /// Token usage statistics
    pub usage: Usage,
}

impl CompletionResponse {
    /// A plain text reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            content: Some(content.into()),
            finish_reason: FinishReason::Stop,
            tool_calls: Vec::new(),
            usage: Usage::default(),
        }
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The reply as a conversation message, tool calls included.
    pub fn assistant_message(&self) -> Message {
        if self.requests_tools() {
            return Message::new_tool_request(self.content.clone(), &self.tool_calls);
        }

        Message::new_assistant(vec![MessageContent::Text {
            text: self.content.clone().unwrap_or_default(),
        }])
    }
}

/// The reason the model finished generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop point reached
    Stop,
    /// Stopped due to tool calls
    ToolCalls,
    /// Maximum tokens reached
    MaxTokens,
    /// Blocked by the provider's content filter
    ContentFilter,
    /// Anything the provider reported that is not listed above
    Other,
}

impl FinishReason {
    pub fn from_wire(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("length") => FinishReason::MaxTokens,
            Some("sensitive") | Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Sums usage across both calls of a turn.
    pub fn combine(self, other: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens.saturating_add(other.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(other.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(other.total_tokens),
        }
    }
}

/// Errors that can occur when communicating with the provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with an error status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// A network error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The response from the provider was invalid
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

/// A chat completion service.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a request and returns the complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

/// A builder for creating completion clients.
#[derive(Debug, Default)]
pub struct CompletionClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl CompletionClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Creates an OpenAI-compatible client.
    pub fn build(self) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::Auth("API key not provided".to_string()))?;

        Ok(Arc::new(OpenAiCompatibleClient::new(
            api_key,
            self.base_url,
            self.timeout,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MessageRole;

    #[test]
    fn test_finish_reason_from_wire() {
        assert_eq!(FinishReason::from_wire(Some("stop")), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire(Some("tool_calls")), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from_wire(Some("length")), FinishReason::MaxTokens);
        assert_eq!(FinishReason::from_wire(None), FinishReason::Other);
    }

    #[test]
    fn test_usage_combine_saturates() {
        let first = Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: u32::MAX - 1,
        };
        let second = Usage {
            prompt_tokens: 3,
            completion_tokens: 2,
            total_tokens: 20,
        };

        let combined = first.combine(second);
        assert_eq!(combined.prompt_tokens, 13);
        assert_eq!(combined.completion_tokens, 7);
        assert_eq!(combined.total_tokens, u32::MAX);
    }

    #[test]
    fn test_assistant_message_keeps_tool_calls() {
        let mut response = CompletionResponse::text("");
        response.tool_calls = vec![ToolInvocationRequest::new("c1", "calculator", "{}")];

        let message = response.assistant_message();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.tool_calls(), response.tool_calls);
    }

    #[test]
    fn test_builder_requires_key() {
        assert!(matches!(
            CompletionClientBuilder::new().build(),
            Err(ProviderError::Auth(_))
        ));
        assert!(CompletionClientBuilder::new().with_api_key("sk-test").build().is_ok());
    }
}
