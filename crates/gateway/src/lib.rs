//! HTTP gateway for maildraft.
//!
//! Exposes the browser-facing API: `POST /ai-draft` (validated draft
//! requests), `GET /health`, and `GET /models`. Drafts are produced by a
//! [`DraftService`], either in-process or by forwarding to a remote
//! orchestrator exposed through [`orchestrator_router`].
//!
//! Built on Axum for high performance async HTTP.

pub mod service;

pub use maildraft_draft::{parse_draft_request, validate_draft_request};
pub use service::{DraftService, LocalDraftService, RemoteDraftService};

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use maildraft_config::AppConfig;
use maildraft_core::error::ErrorEnvelope;
use maildraft_core::model::ModelId;
use maildraft_draft::{DraftOrchestrator, HandlerEvent, OrchestratorConfig, handle_event};

/// Maximum accepted request body.
pub const BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub service: Arc<dyn DraftService>,
}

impl GatewayState {
    pub fn new(service: Arc<dyn DraftService>) -> Self {
        Self { service }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the public gateway router.
///
/// Layers applied:
/// - Permissive CORS (any origin, method, header)
/// - Request logging (method, path, timestamp)
/// - Request body size limit (1 MB), rejected with the JSON envelope
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/ai-draft", post(draft_handler))
        .route("/health", get(|| health("maildraft-gateway")))
        .route("/models", get(models_handler))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(envelope_oversized_body))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the orchestrator boundary router.
///
/// `POST /draft` passes the raw body to [`handle_event`] and returns its
/// status, headers, and body unchanged.
pub fn orchestrator_router(orchestrator: Arc<DraftOrchestrator>) -> Router {
    Router::new()
        .route("/draft", post(orchestrator_handler))
        .route("/health", get(|| health("maildraft-orchestrator")))
        .fallback(not_found)
        .with_state(orchestrator)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(envelope_oversized_body))
        .layer(middleware::from_fn(log_request))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Wire an in-process orchestrator from configuration.
///
/// Fails when the knowledge base or endpoints are not configured.
pub fn local_orchestrator(config: &AppConfig) -> Result<DraftOrchestrator, Box<dyn std::error::Error>> {
    let orchestrator_config = OrchestratorConfig::from_app_config(config)?;
    let backends = maildraft_providers::build_from_config(config)?;
    Ok(DraftOrchestrator::new(
        orchestrator_config,
        backends.retriever,
        backends.provider,
    ))
}

/// Pick the draft service: proxy when an upstream is configured,
/// in-process otherwise.
pub fn build_service(config: &AppConfig) -> Result<Arc<dyn DraftService>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.gateway.upstream_url {
        let client = maildraft_providers::http_client(config.request_timeout_secs)?;
        info!(upstream = %url, "Gateway forwarding drafts to remote orchestrator");
        return Ok(Arc::new(RemoteDraftService::new(url.clone(), client)));
    }

    let orchestrator = local_orchestrator(config)?;
    info!(
        knowledge_base = %orchestrator.config().knowledge_base_id,
        default_model = %orchestrator.config().default_model,
        "Gateway drafting in-process"
    );
    Ok(Arc::new(LocalDraftService::new(Arc::new(orchestrator))))
}

/// Start the public gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let service = build_service(&config)?;
    let app = build_router(Arc::new(GatewayState::new(service)));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Start the standalone orchestrator boundary server.
pub async fn start_orchestrator(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.orchestrator.host, config.orchestrator.port);

    let orchestrator = Arc::new(local_orchestrator(&config)?);
    let app = orchestrator_router(orchestrator);

    info!(addr = %addr, "Orchestrator starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Middleware ---

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = uuid::Uuid::new_v4();

    info!(
        method = %method,
        path = %path,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        request_id = %request_id,
        "Request received"
    );

    let started = Instant::now();
    let response = next.run(req).await;

    debug!(
        request_id = %request_id,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

/// Axum rejects bodies over the limit with a plain-text 413; replace it
/// with the JSON error envelope every other failure uses.
async fn envelope_oversized_body(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    warn!(limit = BODY_LIMIT, "Rejected oversized request body");
    error_response(ErrorEnvelope::new(
        StatusCode::PAYLOAD_TOO_LARGE.as_u16(),
        format!("Request body exceeds the {BODY_LIMIT} byte limit"),
    ))
}

// --- Handlers ---

fn error_response(envelope: ErrorEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

/// `POST /ai-draft`
async fn draft_handler(State(state): State<SharedState>, body: Bytes) -> Response {
    let request = match parse_draft_request(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "Rejected draft request");
            return error_response(ErrorEnvelope::from(&err));
        }
    };

    info!(
        question_len = request.question.len(),
        history_turns = request.conversation_history.len(),
        model = request.model_id.map(|m| m.as_str()).unwrap_or("default"),
        service = state.service.name(),
        "Drafting response"
    );

    match state.service.draft(request).await {
        Ok(draft) => (StatusCode::OK, Json(draft)).into_response(),
        Err(e) => {
            error!(service = state.service.name(), error = %e, "Draft failed");
            error_response(e.envelope())
        }
    }
}

/// `POST /draft` on the orchestrator boundary.
async fn orchestrator_handler(
    State(orchestrator): State<Arc<DraftOrchestrator>>,
    body: Bytes,
) -> Response {
    let event = HandlerEvent {
        body: String::from_utf8(body.to_vec()).ok(),
    };
    let result = handle_event(&orchestrator, event).await;

    let status = StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, result.body).into_response();
    for (name, value) in result.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    service: &'static str,
}

async fn health(service: &'static str) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        service,
    })
}

#[derive(Serialize)]
struct ModelDto {
    id: &'static str,
    label: &'static str,
}

/// `GET /models`
async fn models_handler() -> Json<Vec<ModelDto>> {
    Json(
        ModelId::all()
            .iter()
            .map(|m| ModelDto {
                id: m.as_str(),
                label: m.label(),
            })
            .collect(),
    )
}

async fn not_found(method: Method, uri: Uri) -> Response {
    error_response(ErrorEnvelope::new(
        404,
        format!("Route {method} {} not found", uri.path()),
    ))
}
