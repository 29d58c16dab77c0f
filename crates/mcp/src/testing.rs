// Stub gateway shared by the crate's tests

use async_trait::async_trait;
use finpilot_core::Route;
use finpilot_sdk::{Gateway, GatewayError, GatewayResult};
use serde_json::value::RawValue;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

type Reply = Box<dyn Fn(&Route, &Value) -> GatewayResult<Box<RawValue>> + Send + Sync>;

/// Gateway double that answers from a closure and records every call
pub(crate) struct StubGateway {
    reply: Reply,
    delay: Option<Duration>,
    calls: Mutex<Vec<(Route, Value)>>,
}

impl StubGateway {
    pub(crate) fn new<F>(reply: F) -> Self
    where
        F: Fn(&Route, &Value) -> GatewayResult<Box<RawValue>> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `body`
    pub(crate) fn returning(body: &'static str) -> Self {
        Self::new(move |_, _| Ok(raw(body)))
    }

    /// Always fail with an HTTP status
    pub(crate) fn failing(status: u16, body: &'static str) -> Self {
        Self::new(move |_, _| Err(GatewayError::from_response(status, body)))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Route, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for StubGateway {
    async fn invoke(&self, route: &Route, arguments: &Value) -> GatewayResult<Box<RawValue>> {
        self.calls.lock().unwrap().push((*route, arguments.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.reply)(route, arguments)
    }
}

pub(crate) fn raw(body: &str) -> Box<RawValue> {
    RawValue::from_string(body.to_string()).unwrap()
}
