//! HTTP transport layer for the gateway client.

use crate::config::ClientConfig;
use crate::error::{GatewayError, GatewayResult};
use finpilot_core::{HttpMethod, Route};
use reqwest::{header, Client};
use serde_json::value::RawValue;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP transport for making gateway requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> GatewayResult<Self> {
        let mut headers = header::HeaderMap::new();

        let mut authorization =
            header::HeaderValue::from_str(&format!("Bearer {}", config.bearer_token))
                .map_err(|_| GatewayError::Config("Invalid bearer token format".to_string()))?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);

        let mut api_key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| GatewayError::Config("Invalid API key format".to_string()))?;
        api_key.set_sensitive(true);
        headers.insert(header::HeaderName::from_static("x-api-key"), api_key);

        // Per-route timeouts are applied on each request.
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Build the URL for the given route path, keeping any base path.
    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Send `body` to `route` and return the success body untouched.
    pub async fn send(&self, route: &Route, body: &Value) -> GatewayResult<Box<RawValue>> {
        let url = self.build_url(route.path);
        let timeout = self.config.timeout_for(route.timeout);
        debug!(method = %route.method, url = %url, timeout_ms = timeout.as_millis() as u64, "Gateway request");

        let request = match route.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };

        let response = request
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Gateway request failed");
                GatewayError::from_transport(&e, timeout)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "Gateway returned an error status");
            return Err(GatewayError::from_response(status.as_u16(), &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_transport(&e, timeout))?;
        debug!(url = %url, status = status.as_u16(), bytes = bytes.len(), "Gateway response");

        parse_payload(&bytes)
    }
}

/// Validate a success body as JSON without re-encoding it.
fn parse_payload(bytes: &[u8]) -> GatewayResult<Box<RawValue>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return RawValue::from_string("null".to_string())
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()));
    }

    serde_json::from_slice::<Box<RawValue>>(bytes)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}
