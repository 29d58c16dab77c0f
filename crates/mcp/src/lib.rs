// MCP (Model Context Protocol) front end for the FinPilot API Gateway.
// Tool calls arrive over stdio or HTTP and are forwarded by the dispatcher.

pub mod adapter;
pub mod dispatcher;
pub mod prompts;
pub mod protocol;
pub mod server;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use server::McpServer;
pub use tools::ToolRegistry;
