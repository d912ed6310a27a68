use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CompletionProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderError, Usage};
use crate::session::{Message, MessageContent, MessageRole};
use crate::tool::{ProviderToolSpec, ToolInvocationRequest};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Response body of `/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ProviderToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A client for OpenAI-compatible chat completion APIs, such as GLM.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
}

impl OpenAiCompatibleClient {
    /// Creates a new client.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut authorization =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| ProviderError::Auth("API key contains invalid characters".to_string()))?;
        authorization.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, authorization);
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let mut client_builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            client_builder = client_builder.timeout(timeout);
        }

        Ok(Self {
            client: client_builder.build()?,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds messages for the API request.
    fn build_messages(messages: &[Message]) -> Vec<WireMessage> {
        let mut wire = Vec::with_capacity(messages.len());

        for msg in messages {
            match msg.role {
                MessageRole::System => wire.push(WireMessage::text("system", msg.text())),
                MessageRole::User => wire.push(WireMessage::text("user", msg.text())),
                MessageRole::Assistant => {
                    let tool_calls: Vec<WireToolCall> = msg
                        .tool_calls()
                        .into_iter()
                        .map(|call| WireToolCall {
                            id: call.id,
                            call_type: function_type(),
                            function: WireFunctionCall {
                                name: call.name,
                                arguments: call.arguments,
                            },
                        })
                        .collect();

                    if tool_calls.is_empty() {
                        wire.push(WireMessage::text("assistant", msg.text()));
                    } else {
                        let text = msg.text();
                        wire.push(WireMessage {
                            role: "assistant",
                            content: (!text.is_empty()).then_some(text),
                            tool_calls: Some(tool_calls),
                            tool_call_id: None,
                        });
                    }
                }
                MessageRole::Tool => {
                    for content in &msg.content {
                        if let MessageContent::ToolResult {
                            tool_call_id,
                            result,
                            ..
                        } = content
                        {
                            wire.push(WireMessage {
                                role: "tool",
                                content: Some(result.clone()),
                                tool_calls: None,
                                tool_call_id: Some(tool_call_id.clone()),
                            });
                        }
                    }
                }
            }
        }

        wire
    }

    fn request_body<'a>(request: &'a CompletionRequest) -> WireRequest<'a> {
        WireRequest {
            model: &request.model,
            messages: Self::build_messages(&request.messages),
            tools: request.tools.as_deref(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stream: false,
        }
    }
}

/// Maps an error status onto the matching [`ProviderError`].
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit(message),
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn parse_completion(body: &str) -> Result<CompletionResponse, ProviderError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", e, body)))?;

    let Some(choice) = response.choices.into_iter().next() else {
        return Err(ProviderError::InvalidResponse(format!(
            "No choices in response. Response: {}",
            body
        )));
    };

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolInvocationRequest::new(call.id, call.function.name, call.function.arguments))
        .collect();

    Ok(CompletionResponse {
        id: response.id,
        model: response.model,
        content: choice.message.content,
        finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
        tool_calls,
        usage: Usage {
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: response.usage.completion_tokens,
            total_tokens: response.usage.total_tokens,
        },
    })
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = Self::request_body(&request);
        debug!(
            model = %request.model,
            messages = body.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Sending completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        debug!(status = status.as_u16(), "Completion response: {}", text);

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{to_wire_format, CalculatorTool, ToolDescriptor};
    use serde_json::json;
    use std::sync::Arc;

    fn request(tools: Option<Vec<ProviderToolSpec>>) -> CompletionRequest {
        CompletionRequest {
            model: "glm-4.6".to_string(),
            messages: vec![Message::new_system("Be brief"), Message::new_user("2+3?")],
            tools,
            temperature: Some(0.7),
            max_tokens: Some(256),
            top_p: None,
        }
    }

    #[test]
    fn test_tools_omitted_when_absent() {
        let request = request(None);
        let body = serde_json::to_value(OpenAiCompatibleClient::request_body(&request)).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("top_p").is_none());
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "Be brief"}));
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_tools_serialized_when_present() {
        let spec = to_wire_format(&ToolDescriptor::Builtin(Arc::new(CalculatorTool)));
        let request = request(Some(vec![spec]));
        let body = serde_json::to_value(OpenAiCompatibleClient::request_body(&request)).unwrap();

        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "calculator");
    }

    #[test]
    fn test_tool_round_messages() {
        let calls = vec![ToolInvocationRequest::new("call_1", "calculator", r#"{"a":1}"#)];
        let messages = vec![
            Message::new_user("hi"),
            Message::new_tool_request(None, &calls),
            Message::new_tool_result("call_1", "2", false),
        ];
        let wire = serde_json::to_value(OpenAiCompatibleClient::build_messages(&messages)).unwrap();

        assert_eq!(
            wire[1],
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "calculator", "arguments": "{\"a\":1}"}
                }]
            })
        );
        assert_eq!(
            wire[2],
            json!({"role": "tool", "content": "2", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn test_parse_tool_calls() {
        let body = json!({
            "id": "resp-1",
            "model": "glm-4.6",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "calculator", "arguments": "{\"a\":2}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
        .to_string();

        let response = parse_completion(&body).unwrap();
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.tool_calls[0].name, "calculator");
        assert_eq!(response.tool_calls[0].arguments, "{\"a\":2}");
        assert_eq!(response.usage.total_tokens, 15);
        assert!(response.content.is_none());
    }

    #[test]
    fn test_parse_rejects_empty_choices() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_completion("not json"),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_status_errors() {
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, body),
            ProviderError::Auth(m) if m == "bad key"
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            ProviderError::RateLimit(m) if m == "slow down"
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            ProviderError::Api { status: 500, .. }
        ));
    }
}
