// MCP server: JSON-RPC method handling and the stdio transport loop

use crate::adapter::{self, JsonRpcAdapter};
use crate::dispatcher::Dispatcher;
use crate::prompts;
use crate::protocol::*;
use anyhow::Result;
use finpilot_core::RequestId;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "FinPilot";

const INSTRUCTIONS: &str = "FinPilot is an AI financial co-pilot for credit report analysis \
and optimization, portfolio analysis and recommendations, loan optimization (LAMF swaps, \
refinancing) and comprehensive financial planning. All analysis runs on the FinPilot API Gateway.";

/// One decoded stdio frame
#[derive(Debug)]
pub enum Frame {
    Request(JsonRpcRequest),
    Notification(JsonRpcRequest),
    /// A response to a server-initiated request; this server sends none, so it is dropped
    Response,
    /// Undecodable input, with the error response to send back
    Invalid(JsonRpcResponse),
}

/// Decode one newline-delimited JSON-RPC message
pub fn parse_frame(bytes: &[u8]) -> Frame {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            return Frame::Invalid(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(e.to_string()),
            ))
        }
    };

    let Some(object) = value.as_object() else {
        let detail = if value.is_array() {
            "batch requests are not supported"
        } else {
            "expected a JSON object"
        };
        return Frame::Invalid(JsonRpcResponse::error(None, JsonRpcError::invalid_request(detail)));
    };

    if !object.contains_key("method")
        && (object.contains_key("result") || object.contains_key("error"))
    {
        return Frame::Response;
    }

    // Echo the id back when it is usable, even if the rest is not
    let id = object
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Frame::Invalid(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(e.to_string()),
            ))
        }
    };

    if request.jsonrpc != "2.0" {
        return Frame::Invalid(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
        ));
    }

    if request.is_notification() {
        Frame::Notification(request)
    } else {
        Frame::Request(request)
    }
}

/// MCP server over the shared dispatcher
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle a JSON-RPC request and return a response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::from_serializable(
                id,
                ListToolsResult {
                    tools: self.dispatcher.registry().list_schemas(),
                },
            ),
            "tools/call" => match id {
                Some(id) => {
                    adapter::handle(&JsonRpcAdapter, &self.dispatcher, (id, request.params)).await
                }
                None => JsonRpcResponse::error(None, JsonRpcError::invalid_request("missing id")),
            },
            "prompts/list" => JsonRpcResponse::from_serializable(id, prompts::list_prompts()),
            "prompts/get" => self.handle_prompts_get(id, request.params),
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        }
    }

    fn handle_initialize(&self, id: Option<RequestId>, params: Option<Value>) -> JsonRpcResponse {
        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(params) => {
                    let client = params
                        .client_info
                        .map(|c| format!("{} {}", c.name, c.version))
                        .unwrap_or_else(|| "unknown client".to_string());
                    info!(client = %client, protocol = %params.protocol_version, "Client initializing");
                }
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                    )
                }
            }
        }

        JsonRpcResponse::from_serializable(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                    prompts: Some(PromptsCapability {
                        list_changed: false,
                    }),
                },
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(INSTRUCTIONS.to_string()),
            },
        )
    }

    fn handle_prompts_get(&self, id: Option<RequestId>, params: Option<Value>) -> JsonRpcResponse {
        let params = match params.map(serde_json::from_value::<GetPromptParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                )
            }
            None => return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params")),
        };

        match prompts::get_prompt(&params) {
            Ok(result) => JsonRpcResponse::from_serializable(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        }
    }

    /// Notifications never get a response; cancellation aborts the matching call
    fn handle_notification(
        &self,
        notification: &JsonRpcRequest,
        in_flight: &mut HashMap<RequestId, AbortHandle>,
    ) {
        match notification.method.as_str() {
            "notifications/initialized" => debug!("Client initialized"),
            "notifications/cancelled" => {
                let params = notification
                    .params
                    .clone()
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                let Some(params) = params else {
                    warn!("Ignoring malformed cancellation");
                    return;
                };

                match in_flight.remove(&params.request_id) {
                    Some(handle) => {
                        handle.abort();
                        info!(id = %params.request_id, reason = ?params.reason, "Request cancelled");
                    }
                    None => debug!(id = %params.request_id, "Cancellation for unknown or finished request"),
                }
            }
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    /// Serve over the process's stdin and stdout until EOF or shutdown
    pub async fn start(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout(), shutdown)
            .await
            .map(|_| ())
    }

    /// Main loop: read newline-delimited frames, dispatch each request as its
    /// own task and write responses as they complete.
    ///
    /// A bad frame produces one error response and reading resumes with the
    /// next line. On EOF in-flight calls are drained; on shutdown they are
    /// aborted. Returns the writer once every response is flushed.
    pub async fn serve<R, W>(
        self: Arc<Self>,
        reader: R,
        writer: W,
        shutdown: CancellationToken,
    ) -> Result<W>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        let mut tasks: JoinSet<RequestId> = JoinSet::new();
        let mut in_flight: HashMap<RequestId, AbortHandle> = HashMap::new();

        info!("MCP server started on stdio, waiting for requests");

        loop {
            let read = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, aborting {} in-flight request(s)", tasks.len());
                    tasks.shutdown().await;
                    break;
                }
                Some(joined) = tasks.join_next() => {
                    if let Ok(id) = joined {
                        if in_flight.get(&id).is_some_and(AbortHandle::is_finished) {
                            in_flight.remove(&id);
                        }
                    }
                    continue;
                }
                // Partial reads stay in `line` if another branch wins
                read = reader.read_until(b'\n', &mut line) => read?,
            };

            let eof = read == 0;
            if !line.iter().all(u8::is_ascii_whitespace) {
                let frame = parse_frame(&line);
                if !Self::process_frame(&self, frame, &tx, &mut tasks, &mut in_flight) {
                    break;
                }
            }
            line.clear();

            if eof {
                debug!("EOF received, draining {} in-flight request(s)", tasks.len());
                while tasks.join_next().await.is_some() {}
                break;
            }
        }

        drop(tx);
        let writer = writer_task.await??;
        info!("MCP server stopped");
        Ok(writer)
    }

    /// Act on one decoded frame. Returns false once the writer is gone.
    fn process_frame(
        server: &Arc<Self>,
        frame: Frame,
        tx: &mpsc::UnboundedSender<JsonRpcResponse>,
        tasks: &mut JoinSet<RequestId>,
        in_flight: &mut HashMap<RequestId, AbortHandle>,
    ) -> bool {
        match frame {
            Frame::Invalid(response) => {
                warn!("Rejected malformed frame");
                return tx.send(response).is_ok();
            }
            Frame::Response => debug!("Ignoring response frame"),
            Frame::Notification(notification) => {
                server.handle_notification(&notification, in_flight);
            }
            Frame::Request(request) => {
                let Some(id) = request.id.clone() else {
                    return true;
                };
                debug!(id = %id, method = %request.method, "<- request");

                if in_flight.get(&id).is_some_and(|handle| !handle.is_finished()) {
                    warn!(id = %id, "Rejected request reusing an in-flight id");
                    let error = JsonRpcError::invalid_request(format!(
                        "request id {} is already in flight",
                        id
                    ));
                    return tx.send(JsonRpcResponse::error(Some(id), error)).is_ok();
                }

                let server = Arc::clone(server);
                let tx = tx.clone();
                let task_id = id.clone();
                let handle = tasks.spawn(async move {
                    let response = server.handle_request(request).await;
                    if tx.send(response).is_err() {
                        warn!(id = %task_id, "Response dropped, writer closed");
                    }
                    task_id
                });
                in_flight.insert(id, handle);
            }
        }
        true
    }
}

/// Single writer: one JSON line per response, flushed immediately
async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        if let Some(error) = &response.error {
            debug!(id = ?response.id, code = error.code, "-> error: {}", error.message);
        } else {
            debug!(id = ?response.id, "-> ok");
        }

        let mut output = serde_json::to_vec(&response)?;
        output.push(b'\n');
        writer.write_all(&output).await?;
        writer.flush().await?;
    }

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubGateway;
    use crate::tools::ToolRegistry;
    use finpilot_sdk::Gateway;
    use std::time::Duration;

    fn server_with(gateway: Arc<dyn Gateway>) -> Arc<McpServer> {
        let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::finpilot()), gateway);
        Arc::new(McpServer::new(Arc::new(dispatcher)))
    }

    /// Feed `input` through the stdio loop and collect the response lines
    async fn run(server: Arc<McpServer>, input: &str) -> Vec<Value> {
        let output = server
            .serve(input.as_bytes(), Vec::new(), CancellationToken::new())
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn by_id(responses: &[Value], id: Value) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response with id {}", id))
    }

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"claude","version":"1.0"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );

        let responses = run(server, input).await;
        assert_eq!(responses.len(), 2);

        let init = by_id(&responses, json!(1));
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(init["result"]["capabilities"]["tools"].is_object());

        let tools = by_id(&responses, json!(2))["result"]["tools"].as_array().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"analyze_credit_report"));
        assert!(names.contains(&"create_financial_plan"));
    }

    #[tokio::test]
    async fn test_malformed_frame_then_recovery() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/ca"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );

        let responses = run(server, input).await;
        assert_eq!(responses.len(), 2);

        let parse_errors: Vec<_> = responses
            .iter()
            .filter(|r| r["error"]["code"] == PARSE_ERROR)
            .collect();
        assert_eq!(parse_errors.len(), 1);
        assert_eq!(parse_errors[0]["id"], Value::Null);

        assert_eq!(by_id(&responses, json!(2))["result"], json!({}));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_parse_error() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#);

        let output = server
            .serve(&input[..], Vec::new(), CancellationToken::new())
            .await
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|r| r["error"]["code"] == PARSE_ERROR));
        assert!(lines.iter().any(|r| r["id"] == "p"));
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let input = concat!(
            "[1, 2]\n",
            r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":8,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":99,"result":{}}"#,
            "\n",
        );

        let responses = run(server, input).await;
        assert_eq!(responses.len(), 3);

        assert!(responses
            .iter()
            .any(|r| r["id"].is_null() && r["error"]["code"] == INVALID_REQUEST));
        assert_eq!(by_id(&responses, json!(7))["error"]["code"], INVALID_REQUEST);
        assert_eq!(by_id(&responses, json!(8))["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_call_success_and_gateway_failure() {
        let gateway = Arc::new(StubGateway::new(|route, _| {
            if route.path == "/v1/credit/analyze" {
                Ok(crate::testing::raw(r#"{"score": 750}"#))
            } else {
                Err(finpilot_sdk::GatewayError::from_response(401, r#"{"message":"expired key"}"#))
            }
        }));
        let server = server_with(gateway);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_credit_health","arguments":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"analyze_credit_report","arguments":{"pdf_base64":"JVBERi0="}}}"#,
            "\n",
        );

        let responses = run(server, input).await;
        assert_eq!(responses.len(), 2);

        let failed = by_id(&responses, json!(1));
        assert_eq!(failed["error"]["code"], GATEWAY_UNAUTHORIZED);
        assert_eq!(failed["error"]["data"]["kind"], "unauthorized");
        assert_eq!(failed["error"]["data"]["status"], 401);

        let ok = by_id(&responses, json!(2));
        assert_eq!(ok["result"]["content"][0]["text"], r#"{"score": 750}"#);
        assert_eq!(ok["result"]["isError"], false);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":"x","method":"tools/call","params":{"name":"buy_stocks","arguments":{}}}"#,
            "\n",
        );

        let responses = run(server, input).await;
        let error = &by_id(&responses, json!("x"))["error"];
        assert_eq!(error["code"], INVALID_PARAMS);
        assert_eq!(error["data"]["kind"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_cancelled_request_gets_no_response() {
        let gateway = Arc::new(StubGateway::returning("{}").with_delay(Duration::from_secs(60)));
        let server = server_with(gateway);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_credit_health"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1,"reason":"user"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );

        let responses = run(server, input).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_id_rejected() {
        let gateway = Arc::new(StubGateway::returning("{}").with_delay(Duration::from_secs(60)));
        let server = server_with(gateway);
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_credit_health"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );

        // The cancellation still reaches the first call, so EOF drains promptly
        let responses = tokio::time::timeout(Duration::from_secs(5), run(server, input))
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(by_id(&responses, json!(1))["error"]["code"], INVALID_REQUEST);
        assert_eq!(by_id(&responses, json!(2))["result"], json!({}));
    }

    #[tokio::test]
    async fn test_prompts() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"prompts/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"prompts/get","params":{"name":"financial_advisor_prompt","arguments":{"user_query":"Is my SIP enough?"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"prompts/get","params":{"name":"financial_advisor_prompt"}}"#,
            "\n",
        );

        let responses = run(server, input).await;
        assert_eq!(
            by_id(&responses, json!(1))["result"]["prompts"][0]["name"],
            "financial_advisor_prompt"
        );
        let text = by_id(&responses, json!(2))["result"]["messages"][0]["content"]["text"]
            .as_str()
            .unwrap();
        assert!(text.contains("Is my SIP enough?"));
        assert_eq!(by_id(&responses, json!(3))["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_loop() {
        let server = server_with(Arc::new(StubGateway::returning("{}")));
        let (client, server_side) = tokio::io::duplex(1024);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(server.serve(server_side, Vec::new(), shutdown.clone()));
        shutdown.cancel();

        let output = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(output.is_empty());
        drop(client);
    }
}
