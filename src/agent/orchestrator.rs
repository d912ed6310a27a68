use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::state::{OrchestrationState, StateTrace};
use crate::config::ChatDefaults;
use crate::error::AgentError;
use crate::llm::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::session::{ChatRequest, ChatResponse, Message};
use crate::tool::{ToolCallRecord, ToolExecutor, ToolLoader, ToolSet};

/// A finished turn with the states it passed through.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub response: ChatResponse,
    pub trace: Vec<OrchestrationState>,
}

/// Drives a chat turn through at most one round of tool calls.
///
/// The first completion call carries the loaded tools. When the model asks for
/// any of them, every call is executed, the results are appended to the
/// conversation and a second call without tools produces the final answer.
#[derive(Clone)]
pub struct ChatOrchestrator {
    provider: Arc<dyn CompletionProvider>,
    executor: ToolExecutor,
    loader: ToolLoader,
    defaults: ChatDefaults,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        executor: ToolExecutor,
        loader: ToolLoader,
        defaults: ChatDefaults,
    ) -> Self {
        Self {
            provider,
            executor,
            loader,
            defaults,
        }
    }

    /// A plain completion; no tools are offered.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        request.validate()?;
        let turn = self.run_with_tools(request, ToolSet::empty()).await?;
        Ok(turn.response)
    }

    /// A completion with the tools applicable to the request.
    pub async fn chat_with_tools(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        self.run(request).await.map(|turn| turn.response)
    }

    /// Like [`chat_with_tools`](Self::chat_with_tools), but gives up as soon
    /// as `token` is cancelled. In-flight provider and tool calls are dropped.
    pub async fn chat_with_tools_cancellable(
        &self,
        request: ChatRequest,
        token: &CancellationToken,
    ) -> Result<ChatResponse, AgentError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("Chat turn cancelled by caller");
                Err(AgentError::Cancelled)
            }
            result = self.chat_with_tools(request) => result,
        }
    }

    /// Runs a full turn and returns the state trace alongside the answer.
    pub async fn run(&self, request: ChatRequest) -> Result<ChatTurn, AgentError> {
        request.validate()?;
        let tools = self.loader.load(request.agent_id).await;
        self.run_with_tools(request, tools).await
    }

    /// Runs a turn against an already loaded tool set.
    pub async fn run_with_tools(
        &self,
        request: ChatRequest,
        tools: ToolSet,
    ) -> Result<ChatTurn, AgentError> {
        let mut trace = StateTrace::new();
        trace.advance(OrchestrationState::ToolsLoaded);

        let first_request = self.completion_request(&request, &tools);
        info!(
            model = %first_request.model,
            messages = first_request.messages.len(),
            tools = tools.len(),
            "Sending first completion call"
        );
        let first = self.complete(first_request).await?;
        trace.advance(OrchestrationState::FirstCallSent);

        if !first.requests_tools() || tools.is_empty() {
            if first.requests_tools() {
                warn!(
                    count = first.tool_calls.len(),
                    "Model requested tools although none were offered, ignoring"
                );
            }

            trace.advance(OrchestrationState::NoToolsRequested);
            trace.advance(OrchestrationState::Done);
            info!("No tool calls requested, returning first reply");
            return Ok(ChatTurn {
                response: final_response(first, Vec::new(), None),
                trace: trace.into_states(),
            });
        }

        trace.advance(OrchestrationState::ToolsRequested);
        info!(count = first.tool_calls.len(), "Model requested tool calls");

        let records = self.executor.execute_all(&first.tool_calls, &tools).await;
        trace.advance(OrchestrationState::ToolsExecuted);

        let mut messages = request.messages.clone();
        messages.push(first.assistant_message());
        messages.extend(records.iter().map(Message::from_record));

        let second_request = CompletionRequest {
            messages,
            tools: None,
            ..self.completion_request(&request, &ToolSet::empty())
        };
        info!(messages = second_request.messages.len(), "Sending second completion call");
        let second = self.complete(second_request).await?;
        trace.advance(OrchestrationState::SecondCallSent);
        trace.advance(OrchestrationState::Done);

        let first_usage = first.usage;
        Ok(ChatTurn {
            response: final_response(second, records, Some(first_usage)),
            trace: trace.into_states(),
        })
    }

    pub fn defaults(&self) -> &ChatDefaults {
        &self.defaults
    }

    fn completion_request(&self, request: &ChatRequest, tools: &ToolSet) -> CompletionRequest {
        CompletionRequest {
            model: request
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.defaults.model.clone()),
            messages: request.messages.clone(),
            tools: (!tools.is_empty()).then(|| tools.specs().to_vec()),
            temperature: request.temperature.or(Some(self.defaults.temperature)),
            max_tokens: request.max_tokens.or(Some(self.defaults.max_tokens)),
            top_p: request.top_p,
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AgentError> {
        self.provider.complete(request).await.map_err(|e| {
            error!(error = %e, "Completion call failed");
            AgentError::ProviderCommunication(e)
        })
    }
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("executor", &self.executor)
            .field("loader", &self.loader)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

fn final_response(
    reply: CompletionResponse,
    tool_calls: Vec<ToolCallRecord>,
    earlier_usage: Option<crate::llm::Usage>,
) -> ChatResponse {
    let usage = match earlier_usage {
        Some(earlier) => earlier.combine(reply.usage),
        None => reply.usage,
    };

    ChatResponse {
        id: reply.id,
        model: reply.model,
        content: reply.content.unwrap_or_default(),
        finish_reason: reply.finish_reason,
        usage,
        tool_calls,
    }
}
