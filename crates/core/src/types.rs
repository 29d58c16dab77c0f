// Request and result envelopes shared by the dispatcher and both transports

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// Correlation token assigned by the transport (JSON-RPC id or HTTP request id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<i32> for RequestId {
    fn from(id: i32) -> Self {
        Self::Number(i64::from(id))
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

/// A decoded tool invocation, independent of the transport it arrived on
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: RequestId,
    pub tool: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<RequestId>, tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            arguments,
        }
    }
}

/// Why a tool call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The incoming message could not be decoded
    ProtocolParse,
    UnknownTool,
    InvalidArguments,
    Unauthorized,
    NotFound,
    ServerError,
    Unreachable,
    Timeout,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProtocolParse => "protocol_parse",
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
            Self::Unreachable => "unreachable",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure half of a [`ToolCallResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Upstream HTTP status, when the gateway answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Upstream error body, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
        }
    }
}

/// Outcome of one dispatched tool call.
///
/// The success payload is the gateway's JSON body exactly as received.
#[derive(Debug, Clone)]
pub enum ToolCallResult {
    Success(Box<RawValue>),
    Failure(ToolFailure),
}

impl ToolCallResult {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(ToolFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Raw payload text for a successful call
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Success(raw) => Some(raw.get()),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}
