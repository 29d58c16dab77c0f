use super::adapter::{self, HttpAdapter, HttpToolCall};
use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use finpilot_mcp::protocol::{JsonRpcResponse, ListToolsResult};
use finpilot_mcp::server::{parse_frame, Frame};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "finpilot-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment.as_str(),
    }))
}

/// List registered tools and their input schemas
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResult> {
    Json(ListToolsResult {
        tools: state.dispatcher.registry().list_schemas(),
    })
}

/// Invoke one tool; the body is its arguments object
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = adapter::request_id(&headers);
    tracing::debug!(request_id = %request_id, tool = %name, "Tool call over HTTP");

    let call = HttpToolCall {
        request_id,
        tool: name,
        body,
    };

    finpilot_mcp::adapter::handle(&HttpAdapter, &state.dispatcher, call).await
}

/// One JSON-RPC message per request, handled like a stdio frame
pub async fn mcp_message(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match parse_frame(&body) {
        Frame::Request(request) => Json(state.mcp.handle_request(request).await).into_response(),
        Frame::Invalid(response) => Json::<JsonRpcResponse>(response).into_response(),
        Frame::Notification(notification) => {
            tracing::debug!(method = %notification.method, "Notification over HTTP");
            StatusCode::ACCEPTED.into_response()
        }
        Frame::Response => StatusCode::ACCEPTED.into_response(),
    }
}
