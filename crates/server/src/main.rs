use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use finpilot_core::{CliOverrides, Configuration, Environment, TransportMode};
use tokio_util::sync::CancellationToken;

mod api;
mod config;

use config::AppState;

#[derive(Parser, Debug)]
#[command(name = "finpilot-mcp", version)]
#[command(about = "FinPilot MCP Server - AI financial co-pilot tools backed by the FinPilot API Gateway", long_about = None)]
struct Args {
    /// Transport mode [default: stdio]
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Host to bind to in http mode [default: 0.0.0.0]
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on in http mode [default: 8002]
    #[arg(long)]
    port: Option<u16>,

    /// FinPilot API Gateway URL (overrides FINPILOT_API_GATEWAY_URL)
    #[arg(long)]
    api_gateway_url: Option<String>,

    /// Environment (overrides ENVIRONMENT) [default: production]
    #[arg(long, value_enum)]
    environment: Option<EnvironmentArg>,

    /// Enable auto-reload for development (http mode only)
    #[arg(long)]
    reload: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Stdio,
    Http,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnvironmentArg {
    Production,
    Staging,
    Development,
}

impl From<Mode> for TransportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Stdio => TransportMode::Stdio,
            Mode::Http => TransportMode::Http,
        }
    }
}

impl From<EnvironmentArg> for Environment {
    fn from(env: EnvironmentArg) -> Self {
        match env {
            EnvironmentArg::Production => Environment::Production,
            EnvironmentArg::Staging => Environment::Staging,
            EnvironmentArg::Development => Environment::Development,
        }
    }
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            mode: self.mode.map(Into::into),
            host: self.host.clone(),
            port: self.port,
            api_gateway_url: self.api_gateway_url.clone(),
            environment: self.environment.map(Into::into),
            reload: self.reload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the stdio protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finpilot=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = finpilot_core::config::from_process_env(&args.overrides()).context(
        "Invalid configuration. Set FINPILOT_API_KEY and FINPILOT_API_GATEWAY_URL \
         (the gateway URL may be omitted with --environment development)",
    )?;

    tracing::info!("Starting FinPilot MCP Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Gateway: {}", config.gateway_url);
    tracing::info!("Transport: {}", config.mode);

    let state = AppState::new(&config)?;
    let shutdown = shutdown_token();

    run(config, state, shutdown).await
}

async fn run(config: Configuration, state: AppState, shutdown: CancellationToken) -> Result<()> {
    match config.mode {
        TransportMode::Stdio => state
            .mcp
            .start(shutdown)
            .await
            .context("stdio transport failed"),
        TransportMode::Http => {
            if config.reload {
                tracing::info!("Auto-reload requested; run under an external watcher to restart on changes");
            }
            api::serve(&config.bind_addr(), state, shutdown).await
        }
    }
}

/// Token cancelled on Ctrl-C
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                trigger.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for shutdown signal: {}", e),
        }
    });

    token
}
