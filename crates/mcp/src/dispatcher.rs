// Dispatcher: registry lookup, shallow argument validation, gateway call

use crate::tools::{ToolDescriptor, ToolRegistry};
use finpilot_core::{FailureKind, ToolCallRequest, ToolCallResult, ToolFailure};
use finpilot_sdk::Gateway;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a call's arguments do not fit the tool's declared parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required argument '{0}'")]
    Missing(&'static str),

    #[error("argument '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

/// Check `arguments` against the tool's parameters and build the gateway body.
///
/// Declared optional parameters missing from the call are sent as `null`,
/// unless the parameter is marked to be left out.
pub fn validate_arguments(
    tool: &ToolDescriptor,
    arguments: &Value,
) -> Result<Value, ArgumentError> {
    let provided = arguments.as_object().ok_or(ArgumentError::NotAnObject)?;

    if let Some(unexpected) = provided.keys().find(|key| tool.param(key).is_none()) {
        return Err(ArgumentError::Unexpected(unexpected.clone()));
    }

    let mut body = Map::with_capacity(tool.params.len());
    for param in &tool.params {
        match provided.get(param.name) {
            None | Some(Value::Null) if param.required => {
                return Err(ArgumentError::Missing(param.name));
            }
            None | Some(Value::Null) if param.omit_when_absent => {}
            None | Some(Value::Null) => {
                body.insert(param.name.to_string(), Value::Null);
            }
            Some(value) if !param.kind.matches(value) => {
                return Err(ArgumentError::WrongType {
                    field: param.name,
                    expected: param.kind.describe(),
                });
            }
            Some(value) => {
                body.insert(param.name.to_string(), value.clone());
            }
        }
    }

    Ok(Value::Object(body))
}

/// Resolves tool calls against the registry and forwards them to the gateway.
///
/// Holds only immutable state, so one instance serves every transport and
/// every concurrent request.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    gateway: Arc<dyn Gateway>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, gateway: Arc<dyn Gateway>) -> Self {
        Self { registry, gateway }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolCallResult {
        let Some(tool) = self.registry.lookup(&request.tool) else {
            warn!(id = %request.id, tool = %request.tool, "Unknown tool");
            return ToolCallResult::failure(
                FailureKind::UnknownTool,
                format!("Unknown tool: {}", request.tool),
            );
        };

        let body = match validate_arguments(tool, &request.arguments) {
            Ok(body) => body,
            Err(e) => {
                warn!(id = %request.id, tool = tool.name, error = %e, "Invalid arguments");
                return ToolCallResult::failure(
                    FailureKind::InvalidArguments,
                    format!("Invalid arguments for {}: {}", tool.name, e),
                );
            }
        };

        debug!(id = %request.id, tool = tool.name, route = %tool.route, "Dispatching tool call");

        match self.gateway.invoke(&tool.route, &body).await {
            Ok(payload) => ToolCallResult::Success(payload),
            Err(e) => {
                warn!(id = %request.id, tool = tool.name, error = %e, "Gateway call failed");
                ToolCallResult::Failure(ToolFailure {
                    kind: e.kind().into(),
                    message: e.message(),
                    status: e.status(),
                    body: e.body().map(str::to_string),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubGateway;
    use crate::tools::credit::ANALYZE_CREDIT_REPORT;
    use finpilot_core::routes::{CREDIT_ANALYZE, CREDIT_HEALTH, FINANCIAL_PLAN};
    use serde_json::json;

    fn dispatcher_with(gateway: Arc<StubGateway>) -> Dispatcher {
        Dispatcher::new(Arc::new(ToolRegistry::finpilot()), gateway)
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let gateway = Arc::new(StubGateway::returning("{}"));
        let dispatcher = dispatcher_with(gateway.clone());

        let result = dispatcher
            .dispatch(ToolCallRequest::new(1, "wire_transfer", json!({})))
            .await;

        let failure = result.as_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::UnknownTool);
        assert!(failure.message.contains("wire_transfer"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_success_payload_passes_through() {
        let gateway = Arc::new(StubGateway::returning(r#"{"score": 750}"#));
        let dispatcher = dispatcher_with(gateway.clone());

        let result = dispatcher
            .dispatch(ToolCallRequest::new(
                1,
                ANALYZE_CREDIT_REPORT,
                json!({"pdf_base64": "JVBERi0xLjQ=", "bureau": "cibil"}),
            ))
            .await;

        assert_eq!(result.payload(), Some(r#"{"score": 750}"#));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, CREDIT_ANALYZE);
        assert_eq!(calls[0].1, json!({"pdf_base64": "JVBERi0xLjQ=", "bureau": "cibil"}));
    }

    #[tokio::test]
    async fn test_missing_optionals_sent_as_null() {
        let gateway = Arc::new(StubGateway::returning("{}"));
        let dispatcher = dispatcher_with(gateway.clone());

        dispatcher
            .dispatch(ToolCallRequest::new(
                "req-1",
                "create_financial_plan",
                json!({"goals": [{"name": "house"}], "current_situation": {"income": 100000}}),
            ))
            .await;

        let calls = gateway.calls();
        assert_eq!(calls[0].0, FINANCIAL_PLAN);
        assert_eq!(
            calls[0].1,
            json!({
                "goals": [{"name": "house"}],
                "current_situation": {"income": 100000},
                "user_id": null
            })
        );
    }

    #[tokio::test]
    async fn test_absent_user_id_left_out_of_credit_health_body() {
        let gateway = Arc::new(StubGateway::returning("{}"));
        let dispatcher = dispatcher_with(gateway.clone());

        dispatcher
            .dispatch(ToolCallRequest::new(1, "get_credit_health", json!({})))
            .await;

        let calls = gateway.calls();
        assert_eq!(calls[0].0, CREDIT_HEALTH);
        assert_eq!(calls[0].1, json!({}));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_failure() {
        let gateway = Arc::new(StubGateway::failing(401, r#"{"message": "bad key"}"#));
        let dispatcher = dispatcher_with(gateway);

        let result = dispatcher
            .dispatch(ToolCallRequest::new(1, "get_credit_health", json!({})))
            .await;

        let failure = result.as_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Unauthorized);
        assert_eq!(failure.status, Some(401));
        assert_eq!(failure.message, "bad key");
        assert_eq!(failure.body.as_deref(), Some(r#"{"message": "bad key"}"#));
    }

    #[tokio::test]
    async fn test_invalid_arguments_name_the_field() {
        let gateway = Arc::new(StubGateway::returning("{}"));
        let dispatcher = dispatcher_with(gateway.clone());

        let result = dispatcher
            .dispatch(ToolCallRequest::new(1, ANALYZE_CREDIT_REPORT, json!({"bureau": "cibil"})))
            .await;
        let failure = result.as_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::InvalidArguments);
        assert!(failure.message.contains("pdf_base64"));

        let result = dispatcher
            .dispatch(ToolCallRequest::new(1, "optimize_loans", json!({"loans": "two"})))
            .await;
        let failure = result.as_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::InvalidArguments);
        assert!(failure.message.contains("loans"));

        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_validate_arguments_cases() {
        let registry = ToolRegistry::finpilot();
        let plan = registry.lookup("create_financial_plan").unwrap();

        assert_eq!(
            validate_arguments(plan, &json!([1, 2])),
            Err(ArgumentError::NotAnObject)
        );
        assert_eq!(
            validate_arguments(plan, &json!({"goals": [], "current_situation": null})),
            Err(ArgumentError::Missing("current_situation"))
        );
        assert_eq!(
            validate_arguments(plan, &json!({"goals": [], "current_situation": {}, "extra": 1})),
            Err(ArgumentError::Unexpected("extra".to_string()))
        );
        assert_eq!(
            validate_arguments(plan, &json!({"goals": {}, "current_situation": {}})),
            Err(ArgumentError::WrongType {
                field: "goals",
                expected: "an array of objects"
            })
        );

        let health = registry.lookup("get_credit_health").unwrap();
        assert_eq!(
            validate_arguments(health, &json!({"user_id": null})).unwrap(),
            json!({})
        );
        assert_eq!(
            validate_arguments(health, &json!({"user_id": "u1"})).unwrap(),
            json!({"user_id": "u1"})
        );
    }
}
