//! Main client for the FinPilot API Gateway.

use crate::config::ClientConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use finpilot_core::{Configuration, Route};
use serde_json::value::RawValue;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Anything that can forward a tool call to a backend route.
///
/// The dispatcher depends on this seam rather than on [`GatewayClient`].
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send `arguments` to `route` and return the success body verbatim.
    async fn invoke(&self, route: &Route, arguments: &Value) -> GatewayResult<Box<RawValue>>;
}

/// Client for the FinPilot API Gateway.
///
/// Never retries; callers own any retry policy.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    config: Arc<ClientConfig>,
    http: HttpTransport,
}

impl GatewayClient {
    /// Create a new client builder.
    pub fn builder() -> GatewayClientBuilder {
        GatewayClientBuilder::new()
    }

    /// Create a client from the resolved process configuration.
    pub fn from_configuration(config: &Configuration) -> GatewayResult<Self> {
        Self::from_config(ClientConfig::from_configuration(config))
    }

    /// Create a client from client configuration.
    pub fn from_config(config: ClientConfig) -> GatewayResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Gateway base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn invoke(&self, route: &Route, arguments: &Value) -> GatewayResult<Box<RawValue>> {
        self.http.send(route, arguments).await
    }
}

/// Builder for creating a [`GatewayClient`].
pub struct GatewayClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    jwt_token: Option<String>,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl GatewayClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            jwt_token: None,
            request_timeout: finpilot_core::config::DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: finpilot_core::config::DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Set the base URL of the API Gateway.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a JWT to send as bearer token instead of the API key.
    pub fn jwt_token(mut self, token: impl Into<String>) -> Self {
        self.jwt_token = Some(token.into());
        self
    }

    /// Set the timeout for regular calls.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the timeout for upload calls.
    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> GatewayResult<GatewayClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| GatewayError::Config("base_url is required".to_string()))?;
        Url::parse(&base_url)
            .map_err(|e| GatewayError::Config(format!("Invalid base_url '{}': {}", base_url, e)))?;

        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GatewayError::Config("api_key is required".to_string()))?;

        let mut config = ClientConfig::new(base_url, api_key);
        if let Some(token) = self.jwt_token {
            config.bearer_token = token;
        }
        config.request_timeout = self.request_timeout;
        config.upload_timeout = self.upload_timeout;

        GatewayClient::from_config(config)
    }
}

impl Default for GatewayClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
