use anyhow::{Context, Result};
use finpilot_core::{Configuration, Environment};
use finpilot_mcp::{Dispatcher, McpServer, ToolRegistry};
use finpilot_sdk::{Gateway, GatewayClient};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub mcp: Arc<McpServer>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(config: &Configuration) -> Result<Self> {
        let client =
            GatewayClient::from_configuration(config).context("Failed to create API Gateway client")?;

        tracing::info!(
            gateway = %client.base_url(),
            environment = %config.environment,
            "API Gateway client ready"
        );

        Ok(Self::with_gateway(Arc::new(client), config.environment))
    }

    pub fn with_gateway(gateway: Arc<dyn Gateway>, environment: Environment) -> Self {
        let registry = Arc::new(ToolRegistry::finpilot());
        let dispatcher = Arc::new(Dispatcher::new(registry, gateway));
        let mcp = Arc::new(McpServer::new(dispatcher.clone()));

        Self {
            dispatcher,
            mcp,
            environment,
        }
    }
}
