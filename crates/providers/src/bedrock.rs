//! Model runtime provider implementation.
//!
//! Invokes Anthropic models through the runtime's `POST /model/{id}/invoke`
//! endpoint using the Anthropic Messages request body.
//!
//! Features:
//! - `Authorization: Bearer` API key authentication (optional)
//! - System prompt as top-level field
//! - Trailing assistant message is sent as a prefill; the reply holds only
//!   the continuation
//! - Status codes mapped onto `ProviderError` so callers can tell a throttled
//!   or unreachable service from a rejected request

use async_trait::async_trait;
use maildraft_core::error::ProviderError;
use maildraft_core::message::{Message, Role};
use maildraft_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::endpoint_url;

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Model runtime provider speaking the Anthropic Messages format.
pub struct BedrockProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl BedrockProvider {
    /// Create a provider for the runtime at `base_url`.
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: "bedrock".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client,
        }
    }

    /// Authenticate with a bearer API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn invoke_url(&self, model: &str) -> Result<reqwest::Url, ProviderError> {
        endpoint_url(&self.base_url, &["model", model, "invoke"])
            .map_err(ProviderError::InvalidEndpoint)
    }

    /// Convert messages to API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: m.content.clone(),
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> InvokeBody<'_> {
        InvokeBody {
            anthropic_version: ANTHROPIC_VERSION,
            system: request.system.as_deref(),
            messages: Self::to_api_messages(&request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Convert the API response to our ProviderResponse.
    fn response_to_provider_response(
        resp: InvokeResponse,
        requested_model: &str,
    ) -> ProviderResponse {
        let text: String = resp
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text.as_str()),
                ResponseContentBlock::Other => None,
            })
            .collect();

        let usage = resp.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        ProviderResponse {
            text,
            usage,
            model: resp.model.unwrap_or_else(|| requested_model.to_string()),
            stop_reason: resp.stop_reason,
        }
    }
}

#[async_trait]
impl Provider for BedrockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = self.invoke_url(&request.model)?;
        let body = Self::build_body(&request);

        debug!(provider = "bedrock", model = %request.model, "Sending invoke request");

        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Model runtime rejected the credentials".into(),
            ));
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model runtime API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: InvokeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse invoke response: {e}")))?;

        Ok(Self::response_to_provider_response(api_resp, &request.model))
    }
}

// --- API types ---

#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Path, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "anthropic.claude-3-haiku-20240307-v1:0".into(),
            system: Some("You are helpful.".into()),
            messages: vec![
                Message::user("Draft a reply."),
                Message::assistant("Hi {{CUSTOMER_NAME}},"),
            ],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn constructor_trims_base_url() {
        let provider = BedrockProvider::new("http://localhost:9000/", reqwest::Client::new());
        assert_eq!(provider.name(), "bedrock");
        assert_eq!(
            provider
                .invoke_url("anthropic.claude-3-haiku-20240307-v1:0")
                .unwrap()
                .as_str(),
            "http://localhost:9000/model/anthropic.claude-3-haiku-20240307-v1:0/invoke"
        );
    }

    #[test]
    fn body_keeps_prefill_as_last_message() {
        let req = request();
        let body = serde_json::to_value(BedrockProvider::build_body(&req)).unwrap();
        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["system"], "You are helpful.");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "Hi {{CUSTOMER_NAME}},");
        assert!(body.get("stop_sequences").is_none());
    }

    #[test]
    fn parse_text_response() {
        let resp: InvokeResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku",
            "content": [
                {"type": "text", "text": "Thanks for reaching out."},
                {"type": "tool_use", "id": "t", "name": "x", "input": {}}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 120, "output_tokens": 30}
        }))
        .unwrap();

        let result = BedrockProvider::response_to_provider_response(resp, "requested");
        assert_eq!(result.text, "Thanks for reaching out.");
        assert_eq!(result.model, "claude-3-haiku");
        assert_eq!(result.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(result.usage.unwrap().total_tokens, 150);
    }

    #[tokio::test]
    async fn complete_against_local_runtime() {
        let seen: Arc<Mutex<Option<(String, serde_json::Value)>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let app = Router::new().route(
            "/model/{model}/invoke",
            post(move |Path(model): Path<String>, Json(body): Json<serde_json::Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some((model, body));
                    Json(serde_json::json!({
                        "content": [{"type": "text", "text": "\n\nYour password can be reset from the login page."}],
                        "stop_reason": "end_turn"
                    }))
                }
            }),
        );
        let base = serve(app).await;

        let provider = BedrockProvider::new(base, reqwest::Client::new()).with_api_key("key");
        let response = provider.complete(request()).await.unwrap();

        assert!(response.text.contains("reset from the login page"));
        assert_eq!(response.model, "anthropic.claude-3-haiku-20240307-v1:0");
        let (model, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(model, "anthropic.claude-3-haiku-20240307-v1:0");
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn throttling_maps_to_rate_limited() {
        let app = Router::new().route(
            "/model/{model}/invoke",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "12")], "slow down") }),
        );
        let base = serve(app).await;

        let provider = BedrockProvider::new(base, reqwest::Client::new());
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after_secs: 12 }));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let app = Router::new().route(
            "/model/{model}/invoke",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;

        let provider = BedrockProvider::new(base, reqwest::Client::new());
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 500, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let app = Router::new().route(
            "/model/{model}/invoke",
            post(|| async { Json(serde_json::json!({"unexpected": true})) }),
        );
        let base = serve(app).await;

        let provider = BedrockProvider::new(base, reqwest::Client::new());
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn unreachable_runtime_is_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = BedrockProvider::new(format!("http://{addr}"), reqwest::Client::new());
        let err = provider.complete(request()).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
