//! Event boundary for the orchestrator when deployed behind an API gateway.
//!
//! The incoming event carries the raw request body as a string; the
//! outgoing response carries a status code, CORS headers, and a serialized
//! JSON body. Every outcome, including failure, is a well-formed response.

use std::collections::BTreeMap;

use maildraft_core::draft::DraftRequest;
use maildraft_core::error::{ErrorEnvelope, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::orchestrator::DraftOrchestrator;
use crate::validation::parse_draft_request;

/// Inbound event. Only the body is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerEvent {
    #[serde(default)]
    pub body: Option<String>,
}

impl HandlerEvent {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }
}

/// Outbound response in the shape API gateways expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Handler: response serialization failed");
                return Self::envelope(&ErrorEnvelope::new(
                    500,
                    "Failed to generate a draft response.",
                ));
            }
        };
        Self {
            status_code,
            headers: default_headers(),
            body,
        }
    }

    fn envelope(envelope: &ErrorEnvelope) -> Self {
        // An envelope of three plain fields always serializes.
        let body = serde_json::to_string(envelope).unwrap_or_default();
        Self {
            status_code: envelope.status_code,
            headers: default_headers(),
            body,
        }
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
    ])
}

/// Parse and validate an event body into a draft request.
pub fn parse_request(body: Option<&str>) -> Result<DraftRequest, ValidationError> {
    parse_draft_request(body.unwrap_or_default().as_bytes())
}

/// Handle one event end to end.
pub async fn handle_event(orchestrator: &DraftOrchestrator, event: HandlerEvent) -> HandlerResponse {
    let request = match parse_request(event.body.as_deref()) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Handler: rejected request");
            return HandlerResponse::envelope(&ErrorEnvelope::from(&e));
        }
    };

    match orchestrator.draft(&request).await {
        Ok(response) => HandlerResponse::json(200, &response),
        Err(e) => {
            error!(error = %e, status = e.status_code(), "Handler: draft failed");
            HandlerResponse::envelope(&e.envelope())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrchestratorConfig;
    use crate::test_helpers::*;
    use maildraft_core::error::{ProviderError, RetrievalError};
    use maildraft_core::model::ModelId;
    use std::sync::Arc;

    fn orchestrator(retriever: StaticRetriever, provider: ScriptedProvider) -> DraftOrchestrator {
        DraftOrchestrator::new(
            OrchestratorConfig::new("KB123", ModelId::Claude3Haiku),
            Arc::new(retriever),
            Arc::new(provider),
        )
    }

    fn body_json(response: &HandlerResponse) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    fn assert_cors(response: &HandlerResponse) {
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn success_returns_draft() {
        let orch = orchestrator(
            StaticRetriever::passages(vec![web_passage("Refunds take 5 days.", "https://help.example.com/refunds")]),
            ScriptedProvider::text("Your refund will arrive within 5 days."),
        );
        let event = HandlerEvent::with_body(
            r#"{"question":"Where is my refund?","sessionId":"s-1"}"#,
        );

        let response = handle_event(&orch, event).await;

        assert_eq!(response.status_code, 200);
        assert_cors(&response);
        let json = body_json(&response);
        assert_eq!(
            json["response"],
            "Hi {{CUSTOMER_NAME}},\n\nYour refund will arrive within 5 days."
        );
        assert_eq!(json["citation"], "https://help.example.com/refunds");
        assert_eq!(json["sessionId"], "s-1");
    }

    #[tokio::test]
    async fn accepts_request_session_id_alias() {
        let orch = orchestrator(StaticRetriever::empty(), ScriptedProvider::text("ok"));
        let event = HandlerEvent::with_body(r#"{"question":"Q","requestSessionId":"alias-7"}"#);

        let json = body_json(&handle_event(&orch, event).await);
        assert_eq!(json["sessionId"], "alias-7");
        assert!(json["citation"].is_null());
    }

    #[tokio::test]
    async fn null_history_is_treated_as_absent() {
        let provider = Arc::new(ScriptedProvider::text("ok"));
        let orch = DraftOrchestrator::new(
            OrchestratorConfig::new("KB123", ModelId::Claude3Haiku),
            Arc::new(StaticRetriever::empty()),
            provider.clone(),
        );
        let event = HandlerEvent::with_body(r#"{"question":"Q","conversationHistory":null}"#);

        let response = handle_event(&orch, event).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn both_session_keys_prefer_request_session_id() {
        let orch = orchestrator(StaticRetriever::empty(), ScriptedProvider::text("ok"));
        let event =
            HandlerEvent::with_body(r#"{"question":"Q","sessionId":"a","requestSessionId":"b"}"#);

        let response = handle_event(&orch, event).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(body_json(&response)["sessionId"], "b");
    }

    #[tokio::test]
    async fn missing_body_is_bad_request() {
        let orch = orchestrator(StaticRetriever::empty(), ScriptedProvider::text("ok"));
        let response = handle_event(&orch, HandlerEvent::default()).await;

        assert_eq!(response.status_code, 400);
        assert_cors(&response);
        let json = body_json(&response);
        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["error"], "Bad Request");
        assert_eq!(json["message"], "Request body is required");
    }

    #[tokio::test]
    async fn array_body_is_not_an_object() {
        let orch = orchestrator(StaticRetriever::empty(), ScriptedProvider::text("ok"));
        let response = handle_event(&orch, HandlerEvent::with_body(r#"["Q"]"#)).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response)["message"], "Request body must be a JSON object");
    }

    #[tokio::test]
    async fn wrong_typed_question_matches_gateway_message() {
        let orch = orchestrator(StaticRetriever::empty(), ScriptedProvider::text("ok"));
        let response = handle_event(&orch, HandlerEvent::with_body(r#"{"question":42}"#)).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response)["message"], "question must be a string");
    }

    #[tokio::test]
    async fn unparseable_body_is_bad_request() {
        let provider = Arc::new(ScriptedProvider::text("ok"));
        let orch = DraftOrchestrator::new(
            OrchestratorConfig::new("KB123", ModelId::Claude3Haiku),
            Arc::new(StaticRetriever::empty()),
            provider.clone(),
        );
        let response = handle_event(&orch, HandlerEvent::with_body("{not json")).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response)["message"], "Request body must be valid JSON");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_question_is_bad_request() {
        let orch = orchestrator(StaticRetriever::empty(), ScriptedProvider::text("ok"));
        let response = handle_event(&orch, HandlerEvent::with_body(r#"{"question":"   "}"#)).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(body_json(&response)["message"], "question must not be empty");
    }

    #[tokio::test]
    async fn unavailable_collaborator_is_503() {
        let orch = orchestrator(
            StaticRetriever::failing(RetrievalError::Timeout("secret-host:443".into())),
            ScriptedProvider::text("ok"),
        );
        let response = handle_event(&orch, HandlerEvent::with_body(r#"{"question":"Q"}"#)).await;

        assert_eq!(response.status_code, 503);
        assert_cors(&response);
        let json = body_json(&response);
        assert_eq!(json["error"], "Service Unavailable");
        assert!(!response.body.contains("secret-host"));
    }

    #[tokio::test]
    async fn internal_failure_is_500_without_detail() {
        let orch = orchestrator(
            StaticRetriever::empty(),
            ScriptedProvider::failing(ProviderError::AuthenticationFailed(
                "token sk-live-123 rejected".into(),
            )),
        );
        let response = handle_event(&orch, HandlerEvent::with_body(r#"{"question":"Q"}"#)).await;

        assert_eq!(response.status_code, 500);
        let json = body_json(&response);
        assert_eq!(json["message"], "Failed to generate a draft response.");
        assert!(!response.body.contains("sk-live-123"));
    }

    #[test]
    fn event_deserializes_without_body() {
        let event: HandlerEvent = serde_json::from_str("{}").unwrap();
        assert!(event.body.is_none());
        let event: HandlerEvent =
            serde_json::from_str(r#"{"body":"{\"question\":\"Q\"}","headers":{}}"#).unwrap();
        assert_eq!(event.body.as_deref(), Some(r#"{"question":"Q"}"#));
    }

    #[test]
    fn response_serializes_camel_case() {
        let response = HandlerResponse::envelope(&ErrorEnvelope::new(400, "bad"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["headers"]["Access-Control-Allow-Origin"], "*");
    }
}
