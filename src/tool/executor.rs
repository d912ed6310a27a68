use futures::future::join_all;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::store::ToolRecord;
use crate::tool::remote::UnsupportedMethod;
use crate::tool::{
    HttpTransport, RemoteHttpTool, ToolCallRecord, ToolDescriptor, ToolInvocationRequest,
    ToolKind, ToolRegistry, ToolSet, TransportError,
};

const LOG_PREVIEW_CHARS: usize = 200;

/// Why a tool invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionFailure {
    /// No tool with that name could be resolved
    #[error("tool not found")]
    NotFound,
    /// The arguments payload was not a JSON object
    #[error("invalid arguments: {0}")]
    BadArguments(String),
    /// The builtin implementation returned an error or panicked
    #[error("runtime fault: {0}")]
    RuntimeFault(String),
    /// The remote endpoint answered with a non-2xx status
    #[error("remote call returned HTTP {status}: {body}")]
    RemoteFailure { status: u16, body: String },
    /// The remote endpoint could not be reached in time
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("tool is unavailable")]
    Unavailable,
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

impl From<UnsupportedMethod> for ExecutionFailure {
    fn from(e: UnsupportedMethod) -> Self {
        ExecutionFailure::UnsupportedMethod(e.0)
    }
}

/// A failed invocation, always naming the tool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tool '{tool}' failed: {reason}")]
pub struct ExecutionError {
    pub tool: String,
    pub reason: ExecutionFailure,
}

impl ExecutionError {
    pub fn new(tool: impl Into<String>, reason: ExecutionFailure) -> Self {
        Self {
            tool: tool.into(),
            reason,
        }
    }
}

/// Resolves tool names and carries out invocations.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn HttpTransport>,
}

impl ToolExecutor {
    /// Creates a new tool executor with the given registry and HTTP transport.
    pub fn new(registry: Arc<ToolRegistry>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Executes a registered tool by name.
    pub async fn execute(&self, tool_name: &str, arguments_json: &str) -> Result<String, ExecutionError> {
        let Some(tool) = self.registry.get(tool_name) else {
            error!(tool = %tool_name, "Tool not found in registry");
            return Err(ExecutionError::new(tool_name, ExecutionFailure::NotFound));
        };

        self.execute_descriptor(tool, arguments_json).await
    }

    /// Executes a persisted record directly. Builtin records resolve through
    /// the registry; remote records are built from their stored settings.
    pub async fn execute_record(
        &self,
        record: &ToolRecord,
        arguments_json: &str,
    ) -> Result<String, ExecutionError> {
        if record.kind == ToolKind::Builtin {
            return self.execute(&record.name, arguments_json).await;
        }

        let tool = RemoteHttpTool::from_record(record)
            .map_err(|e| ExecutionError::new(&record.name, e.into()))?;
        self.execute_descriptor(&tool.into(), arguments_json).await
    }

    /// Executes an already resolved tool.
    pub async fn execute_descriptor(
        &self,
        tool: &ToolDescriptor,
        arguments_json: &str,
    ) -> Result<String, ExecutionError> {
        let started = Instant::now();
        info!(
            tool = %tool.name(),
            arguments = %truncate_for_log(arguments_json),
            "Executing tool"
        );

        let outcome = self
            .dispatch(tool, arguments_json)
            .await
            .map_err(|reason| ExecutionError::new(tool.name(), reason));

        let duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(result) => info!(
                tool = %tool.name(),
                duration_ms,
                result = %truncate_for_log(result),
                "Tool executed"
            ),
            Err(e) => error!(tool = %tool.name(), duration_ms, error = %e, "Tool execution failed"),
        }

        outcome
    }

    async fn dispatch(
        &self,
        tool: &ToolDescriptor,
        arguments_json: &str,
    ) -> Result<String, ExecutionFailure> {
        if !tool.is_available() {
            return Err(ExecutionFailure::Unavailable);
        }

        let args = parse_arguments(arguments_json)?;

        match tool {
            ToolDescriptor::Builtin(builtin) => {
                match AssertUnwindSafe(builtin.execute(args)).catch_unwind().await {
                    Ok(Ok(output)) => Ok(output),
                    Ok(Err(e)) => Err(ExecutionFailure::RuntimeFault(e.to_string())),
                    Err(_) => Err(ExecutionFailure::RuntimeFault("tool panicked".to_string())),
                }
            }
            ToolDescriptor::Remote(remote) => self.call_remote(remote, &args).await,
        }
    }

    /// Sends the request, retrying transport failures up to the tool's retry
    /// count. Each attempt is bounded by the tool's timeout.
    async fn call_remote(
        &self,
        tool: &RemoteHttpTool,
        args: &Map<String, Value>,
    ) -> Result<String, ExecutionFailure> {
        let request = tool.request_for(args)?;
        let attempts = tool.retry_count.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!(tool = %tool.name, attempt, method = %request.method, url = %request.url, "Calling remote tool");

            let sent = tokio::time::timeout(tool.timeout, self.transport.send(request.clone())).await;
            let failure = match sent {
                Ok(Ok(response)) if response.is_success() => return Ok(response.body),
                Ok(Ok(response)) => {
                    return Err(ExecutionFailure::RemoteFailure {
                        status: response.status,
                        body: response.body,
                    });
                }
                Ok(Err(e)) => e,
                Err(_) => TransportError::Timeout(tool.timeout),
            };

            warn!(tool = %tool.name, attempt, attempts, error = %failure, "Remote tool call failed");
            last_error = Some(failure);
        }

        Err(ExecutionFailure::TransportFailure(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }

    /// Executes every request against the given tool set.
    ///
    /// Requests run concurrently and the records come back in request order. A
    /// failed request yields a `success = false` record whose result tells the
    /// model what went wrong; it never affects the other requests.
    pub async fn execute_all(
        &self,
        requests: &[ToolInvocationRequest],
        tools: &ToolSet,
    ) -> Vec<ToolCallRecord> {
        info!(count = requests.len(), "Executing tool calls");

        let records = join_all(requests.iter().map(|request| async move {
            let outcome = match tools.get(&request.name) {
                Some(tool) => self.execute_descriptor(tool, &request.arguments).await,
                None => {
                    error!(tool = %request.name, id = %request.id, "Requested tool is not in the loaded tool set");
                    Err(ExecutionError::new(&request.name, ExecutionFailure::NotFound))
                }
            };

            match outcome {
                Ok(result) => ToolCallRecord::succeeded(request, result),
                Err(e) => ToolCallRecord::failed(request, e),
            }
        }))
        .await;

        let succeeded = records.iter().filter(|r| r.success).count();
        info!(total = records.len(), succeeded, "Tool calls finished");
        records
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Parses the provider's argument payload. Blank text and `null` mean "no
/// arguments"; anything but a JSON object is rejected.
fn parse_arguments(arguments_json: &str) -> Result<Map<String, Value>, ExecutionFailure> {
    if arguments_json.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(arguments_json) {
        Ok(Value::Object(args)) => Ok(args),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(ExecutionFailure::BadArguments(format!(
            "expected a JSON object, found: {}",
            truncate_for_log(&other.to_string())
        ))),
        Err(e) => Err(ExecutionFailure::BadArguments(e.to_string())),
    }
}

pub(crate) fn truncate_for_log(content: &str) -> String {
    match content.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...[truncated]", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        assert!(parse_arguments("").unwrap().is_empty());
        assert!(parse_arguments("null").unwrap().is_empty());
        assert_eq!(parse_arguments(r#"{"a":1}"#).unwrap()["a"], 1);
        assert!(matches!(
            parse_arguments("[1, 2]"),
            Err(ExecutionFailure::BadArguments(_))
        ));
        assert!(matches!(
            parse_arguments("{oops"),
            Err(ExecutionFailure::BadArguments(_))
        ));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");

        let long = "é".repeat(250);
        let cut = truncate_for_log(&long);
        assert!(cut.ends_with("...[truncated]"));
        assert_eq!(cut.chars().count(), 200 + "...[truncated]".len());
    }

    #[test]
    fn test_error_display_names_tool() {
        let err = ExecutionError::new(
            "weather",
            ExecutionFailure::RemoteFailure {
                status: 503,
                body: "down".to_string(),
            },
        );
        assert_eq!(err.to_string(), "tool 'weather' failed: remote call returned HTTP 503: down");
    }

    #[tokio::test]
    async fn test_record_with_unsupported_method() {
        let executor = ToolExecutor::new(
            Arc::new(ToolRegistry::new()),
            Arc::new(crate::tool::ReqwestTransport::new()),
        );
        let record = ToolRecord::remote("trace", "Trace", "https://example.com", "TRACE");

        let err = executor.execute_record(&record, "{}").await.unwrap_err();
        assert_eq!(err.tool, "trace");
        assert_eq!(err.reason, ExecutionFailure::UnsupportedMethod("TRACE".to_string()));
    }
}
