//! Error types for the FinPilot gateway client.

use finpilot_core::FailureKind;
use std::time::Duration;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Message used when an error body carries nothing better.
const FALLBACK_MESSAGE: &str = "API request failed";

/// Coarse classification of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorKind {
    Unauthorized,
    NotFound,
    ServerError,
    Unreachable,
    Timeout,
    Unknown,
}

impl GatewayErrorKind {
    /// Classify an upstream HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

impl From<GatewayErrorKind> for FailureKind {
    fn from(kind: GatewayErrorKind) -> Self {
        match kind {
            GatewayErrorKind::Unauthorized => Self::Unauthorized,
            GatewayErrorKind::NotFound => Self::NotFound,
            GatewayErrorKind::ServerError => Self::ServerError,
            GatewayErrorKind::Unreachable => Self::Unreachable,
            GatewayErrorKind::Timeout => Self::Timeout,
            GatewayErrorKind::Unknown => Self::Unknown,
        }
    }
}

/// Errors that can occur when calling the API Gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        kind: GatewayErrorKind,
        status: u16,
        message: String,
        body: String,
    },

    /// Connection refused, DNS failure or another send error.
    #[error("Failed to connect to API: {0}")]
    Unreachable(String),

    /// No complete response within the route's timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A success status with a body that is not JSON.
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::Api { kind, .. } => *kind,
            Self::Unreachable(_) => GatewayErrorKind::Unreachable,
            Self::Timeout(_) => GatewayErrorKind::Timeout,
            Self::InvalidResponse(_) | Self::Config(_) => GatewayErrorKind::Unknown,
        }
    }

    /// Upstream HTTP status, if the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message: the gateway's own for API errors.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Upstream error body, verbatim.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Create an API error from a status code and response body.
    ///
    /// The message comes from the body's `message`, `error` or `detail`
    /// field when the body is a JSON object carrying one as a string.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error", "detail"].iter().find_map(|field| {
                    value
                        .get(field)
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        Self::Api {
            kind: GatewayErrorKind::from_status(status),
            status,
            message,
            body: body.to_string(),
        }
    }

    /// Map a reqwest failure onto the error taxonomy.
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}
