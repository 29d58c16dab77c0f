//! # FinPilot SDK
//!
//! HTTP client for the FinPilot API Gateway. Every tool call exposed over MCP
//! ends up here as one authenticated JSON request.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finpilot_sdk::{Gateway, GatewayClient, GatewayResult};
//! use finpilot_core::routes::CREDIT_HEALTH;
//!
//! #[tokio::main]
//! async fn main() -> GatewayResult<()> {
//!     let client = GatewayClient::builder()
//!         .base_url("https://api.finpilot.ai")
//!         .api_key("fp-your-api-key")
//!         .build()?;
//!
//!     let health = client
//!         .invoke(&CREDIT_HEALTH, &serde_json::json!({}))
//!         .await?;
//!     println!("{}", health.get());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{Gateway, GatewayClient, GatewayClientBuilder};
pub use config::ClientConfig;
pub use error::{GatewayError, GatewayErrorKind, GatewayResult};
