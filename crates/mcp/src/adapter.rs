// Transport adapters: the encode/decode boundary in front of the dispatcher

use crate::dispatcher::Dispatcher;
use crate::protocol::{
    CallToolParams, CallToolResult, JsonRpcError, JsonRpcResponse, ToolContent, GATEWAY_NOT_FOUND,
    GATEWAY_SERVER_ERROR, GATEWAY_TIMEOUT, GATEWAY_UNAUTHORIZED, GATEWAY_UNKNOWN,
    GATEWAY_UNREACHABLE, INVALID_PARAMS, PARSE_ERROR,
};
use finpilot_core::{FailureKind, RequestId, ToolCallRequest, ToolCallResult, ToolFailure};
use serde_json::Value;

/// A transport-specific way to decode tool calls and encode their results.
///
/// The dispatcher never sees transport types; each transport implements this
/// once and runs every call through [`handle`].
pub trait Adapter {
    /// Incoming tool-call message as the transport delivers it
    type Message;
    /// Outgoing reply in the transport's encoding
    type Reply;

    /// Decode a message, or produce the reply for an undecodable one
    fn decode(&self, message: Self::Message) -> Result<ToolCallRequest, Self::Reply>;

    fn encode(&self, id: RequestId, result: ToolCallResult) -> Self::Reply;
}

/// Decode, dispatch and encode one tool call
pub async fn handle<A: Adapter>(adapter: &A, dispatcher: &Dispatcher, message: A::Message) -> A::Reply {
    let request = match adapter.decode(message) {
        Ok(request) => request,
        Err(reply) => return reply,
    };

    let id = request.id.clone();
    let result = dispatcher.dispatch(request).await;
    adapter.encode(id, result)
}

/// JSON-RPC encoding of `tools/call`, used by the stdio transport and `/mcp`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcAdapter;

impl Adapter for JsonRpcAdapter {
    type Message = (RequestId, Option<Value>);
    type Reply = JsonRpcResponse;

    fn decode(&self, (id, params): Self::Message) -> Result<ToolCallRequest, Self::Reply> {
        let params = params.ok_or_else(|| {
            JsonRpcResponse::error(Some(id.clone()), JsonRpcError::invalid_params("Missing params"))
        })?;

        let call: CallToolParams = serde_json::from_value(params).map_err(|e| {
            JsonRpcResponse::error(
                Some(id.clone()),
                JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
            )
        })?;

        let arguments = call
            .arguments
            .unwrap_or_else(|| Value::Object(Default::default()));
        Ok(ToolCallRequest::new(id, call.name, arguments))
    }

    fn encode(&self, id: RequestId, result: ToolCallResult) -> Self::Reply {
        match result {
            ToolCallResult::Success(payload) => JsonRpcResponse::from_serializable(
                Some(id),
                CallToolResult {
                    content: vec![ToolContent::text(payload.get())],
                    is_error: Some(false),
                },
            ),
            ToolCallResult::Failure(failure) => {
                JsonRpcResponse::error(Some(id), failure_to_rpc_error(&failure))
            }
        }
    }
}

/// JSON-RPC error code for a failure kind
pub fn error_code(kind: FailureKind) -> i32 {
    match kind {
        FailureKind::ProtocolParse => PARSE_ERROR,
        FailureKind::UnknownTool | FailureKind::InvalidArguments => INVALID_PARAMS,
        FailureKind::Unauthorized => GATEWAY_UNAUTHORIZED,
        FailureKind::NotFound => GATEWAY_NOT_FOUND,
        FailureKind::ServerError => GATEWAY_SERVER_ERROR,
        FailureKind::Unreachable => GATEWAY_UNREACHABLE,
        FailureKind::Timeout => GATEWAY_TIMEOUT,
        FailureKind::Unknown => GATEWAY_UNKNOWN,
    }
}

/// Structured MCP error object; `data` carries kind, status and upstream body
pub fn failure_to_rpc_error(failure: &ToolFailure) -> JsonRpcError {
    let mut data = serde_json::json!({ "kind": failure.kind });
    if let Some(status) = failure.status {
        data["status"] = status.into();
    }
    if let Some(body) = &failure.body {
        data["body"] = Value::String(body.clone());
    }

    JsonRpcError::custom(error_code(failure.kind), failure.message.clone()).with_data(data)
}
