use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::executor::ExecutionFailure;
use super::http::HttpRequest;
use crate::schema::SchemaBuilder;
use crate::store::ToolRecord;

/// Per-call timeout applied when a record does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Retries after a transport failure when a record does not set a count.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// HTTP methods a remote tool may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST, PUT and PATCH send arguments as a JSON body; the rest use the query.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

/// A tool served by an HTTP endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteHttpTool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub endpoint: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
    pub retry_count: u32,
    pub active: bool,
}

impl RemoteHttpTool {
    /// Creates an active POST tool with no parameters and default limits.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: SchemaBuilder::empty(),
            endpoint: endpoint.into(),
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            active: true,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Builds a tool from its persisted record. A missing method means POST and
    /// a zero timeout means [`DEFAULT_TIMEOUT`].
    pub fn from_record(record: &ToolRecord) -> Result<Self, UnsupportedMethod> {
        let method = match record.method.as_deref() {
            Some(method) if !method.trim().is_empty() => method.parse()?,
            _ => HttpMethod::Post,
        };

        Ok(Self {
            name: record.name.clone(),
            description: record.description.clone(),
            parameters: record
                .parameters
                .clone()
                .unwrap_or_else(SchemaBuilder::empty),
            endpoint: record.endpoint.clone().unwrap_or_default(),
            method,
            headers: record.headers.clone(),
            timeout: match record.timeout_ms {
                0 => DEFAULT_TIMEOUT,
                ms => Duration::from_millis(ms),
            },
            retry_count: record.retry_count,
            active: record.enabled,
        })
    }

    /// Builds the outbound request for one invocation.
    pub(crate) fn request_for(&self, args: &Map<String, Value>) -> Result<HttpRequest, ExecutionFailure> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let (url, body) = if self.method.carries_body() {
            let body = serde_json::to_string(args)
                .map_err(|e| ExecutionFailure::BadArguments(e.to_string()))?;
            (self.endpoint.clone(), Some(body))
        } else {
            (with_query(&self.endpoint, args)?, None)
        };

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

/// Appends non-null arguments to the endpoint's query string.
fn with_query(endpoint: &str, args: &Map<String, Value>) -> Result<String, ExecutionFailure> {
    let pairs: Vec<(&str, String)> = args
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key.as_str(), s.clone())),
            other => Some((key.as_str(), other.to_string())),
        })
        .collect();

    if pairs.is_empty() {
        return Ok(endpoint.to_string());
    }

    let mut url = Url::parse(endpoint).map_err(|e| {
        ExecutionFailure::TransportFailure(format!("invalid endpoint '{}': {}", endpoint, e))
    })?;
    url.query_pairs_mut().extend_pairs(pairs);

    Ok(url.to_string())
}
