use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::{ToolCallRecord, ToolInvocationRequest};

/// Represents a message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    #[serde(default = "new_message_id")]
    pub id: String,
    /// The role of the message sender
    pub role: MessageRole,
    /// The content of the message
    pub content: Vec<MessageContent>,
    /// Timestamp when the message was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// The role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model
    System,
    /// User message
    User,
    /// Assistant message (from the LLM)
    Assistant,
    /// Tool result message
    Tool,
}

/// The content of a message, which can be text or a tool call/result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text content
    Text {
        /// The text content
        text: String,
    },
    /// A tool call request
    ToolCall {
        /// Unique identifier for the tool call
        id: String,
        /// The name of the tool to call
        name: String,
        /// Raw JSON arguments, kept as the provider sent them
        arguments: String,
    },
    /// The result of a tool execution
    ToolResult {
        /// The ID of the tool call this result is for
        tool_call_id: String,
        /// The result returned by the tool
        result: String,
        /// Whether the tool execution resulted in an error
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl Message {
    fn with_role(role: MessageRole, content: Vec<MessageContent>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content,
            created_at: Utc::now(),
        }
    }

    /// Creates a new system message.
    pub fn new_system(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, vec![MessageContent::Text { text: text.into() }])
    }

    /// Creates a new user message.
    pub fn new_user(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, vec![MessageContent::Text { text: text.into() }])
    }

    /// Creates a new assistant message.
    pub fn new_assistant(content: Vec<MessageContent>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Creates an assistant message that asks for the given tool calls.
    pub fn new_tool_request(text: Option<String>, calls: &[ToolInvocationRequest]) -> Self {
        let mut content: Vec<MessageContent> = text
            .filter(|t| !t.is_empty())
            .map(|text| MessageContent::Text { text })
            .into_iter()
            .collect();
        content.extend(calls.iter().map(|call| MessageContent::ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        }));

        Self::new_assistant(content)
    }

    /// Creates a new tool result message.
    pub fn new_tool_result(
        tool_call_id: impl Into<String>,
        result: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self::with_role(
            MessageRole::Tool,
            vec![MessageContent::ToolResult {
                tool_call_id: tool_call_id.into(),
                result: result.into(),
                is_error: is_error.then_some(true),
            }],
        )
    }

    /// The result message fed back to the model for one recorded call.
    pub fn from_record(record: &ToolCallRecord) -> Self {
        Self::new_tool_result(&record.id, &record.result, !record.success)
    }

    /// Concatenated text parts of the message.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                MessageContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool calls carried by the message.
    pub fn tool_calls(&self) -> Vec<ToolInvocationRequest> {
        self.content
            .iter()
            .filter_map(|c| match c {
                MessageContent::ToolCall { id, name, arguments } => {
                    Some(ToolInvocationRequest::new(id, name, arguments))
                }
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_request_message() {
        let calls = vec![ToolInvocationRequest::new("call_1", "calculator", "{}")];
        let message = Message::new_tool_request(Some(String::new()), &calls);

        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content.len(), 1);
        assert_eq!(message.tool_calls(), calls);
        assert_eq!(message.text(), "");
    }

    #[test]
    fn test_tool_result_from_failed_record() {
        let request = ToolInvocationRequest::new("call_9", "weather", "{}");
        let record = ToolCallRecord::failed(&request, "timed out");
        let message = Message::from_record(&record);

        assert_eq!(message.role, MessageRole::Tool);
        assert_eq!(
            message.content[0],
            MessageContent::ToolResult {
                tool_call_id: "call_9".to_string(),
                result: "tool execution failed: timed out".to_string(),
                is_error: Some(true),
            }
        );
    }

    #[test]
    fn test_deserialize_without_id() {
        let message: Message = serde_json::from_str(
            r#"{"role":"user","content":[{"type":"text","text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(message.text(), "hi");
        assert!(!message.id.is_empty());
    }
}
