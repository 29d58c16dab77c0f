//! Configuration types for the gateway client.

use finpilot_core::{Configuration, TimeoutClass};
use std::time::Duration;

/// Configuration for the gateway client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the API Gateway, without a trailing slash.
    pub base_url: String,
    /// API key, sent as `X-API-Key`.
    pub api_key: String,
    /// Token sent as `Authorization: Bearer`.
    pub bearer_token: String,
    /// Timeout for regular calls.
    pub request_timeout: Duration,
    /// Timeout for calls carrying document uploads.
    pub upload_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new configuration; the API key doubles as bearer token.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: api_key.clone(),
            api_key,
            request_timeout: finpilot_core::config::DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: finpilot_core::config::DEFAULT_UPLOAD_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }

    /// Derive the client settings from the resolved process configuration.
    pub fn from_configuration(config: &Configuration) -> Self {
        Self {
            base_url: config.gateway_url.clone(),
            api_key: config.api_key.expose().to_string(),
            bearer_token: config.bearer_token().to_string(),
            request_timeout: config.request_timeout,
            upload_timeout: config.upload_timeout,
            user_agent: default_user_agent(),
        }
    }

    /// Timeout bounding a route of the given class.
    pub fn timeout_for(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Standard => self.request_timeout,
            TimeoutClass::Upload => self.upload_timeout,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("bearer_token", &"***")
            .field("request_timeout", &self.request_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_user_agent() -> String {
    format!("finpilot-mcp/{}", env!("CARGO_PKG_VERSION"))
}
