//! Transport layer for the gateway client.

pub mod http;

pub use http::HttpTransport;
