// HTTP encoding of tool calls for the development listener

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use finpilot_core::{FailureKind, RequestId, ToolCallRequest, ToolCallResult, ToolFailure};
use finpilot_mcp::adapter::Adapter;
use serde::Serialize;
use serde_json::Value;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// One `POST /tools/{name}` call
pub struct HttpToolCall {
    pub request_id: String,
    pub tool: String,
    pub body: Bytes,
}

/// Error body returned for failed tool calls
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ToolFailure,
    pub request_id: String,
}

pub struct HttpAdapter;

impl Adapter for HttpAdapter {
    type Message = HttpToolCall;
    type Reply = Response;

    fn decode(&self, call: HttpToolCall) -> Result<ToolCallRequest, Response> {
        // No body means no arguments
        let arguments = if call.body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(&call.body).map_err(|e| {
                let failure = ToolFailure::new(
                    FailureKind::ProtocolParse,
                    format!("Request body is not valid JSON: {}", e),
                );
                failure_response(&call.request_id, failure)
            })?
        };

        Ok(ToolCallRequest::new(call.request_id, call.tool, arguments))
    }

    fn encode(&self, id: RequestId, result: ToolCallResult) -> Response {
        let request_id = id.to_string();

        match result {
            ToolCallResult::Success(payload) => {
                let mut response = (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    String::from(payload.get()),
                )
                    .into_response();
                set_request_id(response.headers_mut(), &request_id);
                response
            }
            ToolCallResult::Failure(failure) => failure_response(&request_id, failure),
        }
    }
}

/// HTTP status for a failure kind
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ProtocolParse => StatusCode::BAD_REQUEST,
        FailureKind::UnknownTool | FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::InvalidArguments => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::ServerError | FailureKind::Unreachable | FailureKind::Unknown => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn failure_response(request_id: &str, failure: ToolFailure) -> Response {
    let status = status_for(failure.kind);
    let mut response = (
        status,
        Json(ErrorResponse {
            error: failure,
            request_id: request_id.to_string(),
        }),
    )
        .into_response();
    set_request_id(response.headers_mut(), request_id);
    response
}

/// Caller-supplied request id, or a fresh UUID v4
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn set_request_id(headers: &mut HeaderMap, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(FailureKind::UnknownTool), StatusCode::NOT_FOUND);
        assert_eq!(status_for(FailureKind::InvalidArguments), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(FailureKind::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(FailureKind::ServerError), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(FailureKind::Unreachable), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(FailureKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_request_id_from_header_or_generated() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        assert_eq!(request_id(&headers), "req-42");

        let generated = request_id(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn test_decode_empty_body_as_no_arguments() {
        let call = HttpToolCall {
            request_id: "r1".to_string(),
            tool: "get_credit_health".to_string(),
            body: Bytes::new(),
        };

        let request = HttpAdapter.decode(call).unwrap();
        assert_eq!(request.arguments, serde_json::json!({}));
        assert_eq!(request.id, RequestId::from("r1"));
    }

    #[test]
    fn test_decode_invalid_json_is_bad_request() {
        let call = HttpToolCall {
            request_id: "r2".to_string(),
            tool: "optimize_loans".to_string(),
            body: Bytes::from_static(b"{not json"),
        };

        let response = HttpAdapter.decode(call).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "r2");
    }
}
