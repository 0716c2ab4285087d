//! The seam between the gateway and whatever produces drafts.
//!
//! In-process deployments wrap the orchestrator directly; proxy
//! deployments forward each validated request to a remote orchestrator
//! endpoint over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use maildraft_core::draft::{DraftRequest, DraftResponse};
use maildraft_core::error::DraftError;
use maildraft_draft::DraftOrchestrator;
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Produces a draft for an already-validated request.
#[async_trait]
pub trait DraftService: Send + Sync {
    fn name(&self) -> &str;

    async fn draft(&self, request: DraftRequest) -> Result<DraftResponse, DraftError>;
}

/// Drafts in-process with a local orchestrator.
pub struct LocalDraftService {
    orchestrator: Arc<DraftOrchestrator>,
}

impl LocalDraftService {
    pub fn new(orchestrator: Arc<DraftOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl DraftService for LocalDraftService {
    fn name(&self) -> &str {
        "local"
    }

    async fn draft(&self, request: DraftRequest) -> Result<DraftResponse, DraftError> {
        self.orchestrator.draft(&request).await
    }
}

/// Forwards requests to a remote orchestrator endpoint.
pub struct RemoteDraftService {
    client: reqwest::Client,
    url: String,
}

impl RemoteDraftService {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DraftService for RemoteDraftService {
    fn name(&self) -> &str {
        "remote"
    }

    async fn draft(&self, request: DraftRequest) -> Result<DraftResponse, DraftError> {
        debug!(url = %self.url, "Forwarding draft request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else {
                    "request"
                };
                DraftError::UpstreamUnavailable(format!("orchestrator {kind}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Orchestrator returned an error");
            return Err(match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => {
                    DraftError::UpstreamUnavailable(format!("orchestrator status {status}: {body}"))
                }
                _ => DraftError::Internal(format!("orchestrator status {status}: {body}")),
            });
        }

        response
            .json::<DraftResponse>()
            .await
            .map_err(|e| DraftError::Internal(format!("unparseable orchestrator response: {e}")))
    }
}
