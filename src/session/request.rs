use serde::{Deserialize, Serialize};

use super::Message;
use crate::error::AgentError;
use crate::llm::{FinishReason, Usage};
use crate::tool::ToolCallRecord;

/// A chat turn as requested by a caller.
///
/// Unset sampling parameters fall back to the orchestrator's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    /// Scopes the offered tools to one agent; `None` offers every builtin
    #[serde(default)]
    pub agent_id: Option<i64>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            agent_id: None,
        }
    }

    /// A single user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(vec![Message::new_user(text)])
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_agent(mut self, agent_id: i64) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.messages.is_empty() {
            return Err(AgentError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(AgentError::InvalidRequest(format!(
                    "temperature must be between 0 and 1, got {}",
                    t
                )));
            }
        }

        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(AgentError::InvalidRequest(format!(
                    "top_p must be between 0 and 1, got {}",
                    p
                )));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(AgentError::InvalidRequest(
                "max_tokens must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// The final answer of a chat turn together with its tool audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    /// One entry per executed tool call, in request order
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ChatRequest::user("hi").validate().is_ok());
        assert!(ChatRequest::new(Vec::new()).validate().is_err());
        assert!(ChatRequest::user("hi").with_temperature(1.5).validate().is_err());
        assert!(ChatRequest::user("hi").with_top_p(-0.1).validate().is_err());
        assert!(ChatRequest::user("hi").with_max_tokens(0).validate().is_err());
        assert!(ChatRequest::user("hi")
            .with_temperature(0.0)
            .with_top_p(1.0)
            .with_max_tokens(1)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_deserialize_minimal() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":[{"type":"text","text":"hi"}]}],"agent_id":3}"#,
        )
        .unwrap();

        assert_eq!(request.agent_id, Some(3));
        assert!(request.model.is_none());
    }
}
