// Core types for the FinPilot MCP shim: configuration, backend routes and
// the request/result envelopes shared by every transport.

pub mod config;
pub mod routes;
pub mod types;

pub use config::{
    resolve, CliOverrides, ConfigError, Configuration, Environment, Secret, TransportMode,
};
pub use routes::{HttpMethod, Route, TimeoutClass};
pub use types::*;
