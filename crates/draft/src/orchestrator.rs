//! Retrieval-augmented reply drafting.
//!
//! # Flow
//!
//! 1. Retrieve up to [`TOP_K`] passages for the raw question
//! 2. Compose the prompt (history, knowledge or no-knowledge instruction)
//! 3. Invoke the model with the greeting prefilled
//! 4. Cite the top-ranked passage's source, if any
//! 5. Prepend the greeting to the continuation
//!
//! Strictly linear and stateless: no retries, no partial degradation. A
//! retrieval failure ends the request; it never falls back to drafting
//! without knowledge.

use std::sync::Arc;
use std::time::Instant;

use maildraft_config::{AppConfig, ConfigError};
use maildraft_core::draft::{DraftRequest, DraftResponse};
use maildraft_core::error::DraftError;
use maildraft_core::model::ModelId;
use maildraft_core::provider::{Provider, ProviderRequest};
use maildraft_core::retriever::{RetrievalQuery, RetrievedPassage, Retriever};
use tracing::{debug, error, info};

use crate::prompt::{assemble_response, compose_prompt};

/// Passages requested per draft.
pub const TOP_K: u32 = 5;
/// Generation cap per draft.
pub const MAX_TOKENS: u32 = 1000;
/// Sampling temperature per draft.
pub const TEMPERATURE: f32 = 0.7;

/// Process-wide settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub knowledge_base_id: String,
    pub default_model: ModelId,
}

impl OrchestratorConfig {
    pub fn new(knowledge_base_id: impl Into<String>, default_model: ModelId) -> Self {
        Self {
            knowledge_base_id: knowledge_base_id.into(),
            default_model,
        }
    }

    /// Extract the orchestrator settings, failing if the knowledge base id
    /// is not configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.require_knowledge_base_id()?, config.default_model))
    }
}

/// Composes one retrieval call and one model call into a drafted email.
pub struct DraftOrchestrator {
    config: OrchestratorConfig,
    retriever: Arc<dyn Retriever>,
    provider: Arc<dyn Provider>,
}

impl DraftOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            config,
            retriever,
            provider,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Draft a reply for one request.
    ///
    /// The request is expected to have passed validation already.
    pub async fn draft(&self, request: &DraftRequest) -> Result<DraftResponse, DraftError> {
        let started = Instant::now();
        let model = request.model_id.unwrap_or(self.config.default_model);

        info!(
            model = %model,
            history_turns = request.conversation_history.len(),
            session_id = request.session_id.as_deref().unwrap_or("-"),
            "Draft: starting retrieval"
        );

        // ── Step 1: Retrieve ──
        let passages = self
            .retriever
            .retrieve(RetrievalQuery {
                knowledge_base_id: self.config.knowledge_base_id.clone(),
                text: request.question.clone(),
                top_k: TOP_K,
            })
            .await
            .map_err(|e| {
                error!(retriever = self.retriever.name(), error = %e, "Draft: retrieval failed");
                DraftError::from(e)
            })?;

        debug!(passages = passages.len(), "Draft: passages retrieved");

        // ── Step 2: Compose ──
        let bundle = compose_prompt(&request.question, &passages, &request.conversation_history);

        // ── Step 3: Invoke ──
        let provider_request = ProviderRequest {
            model: model.as_str().to_string(),
            system: Some(bundle.system.to_string()),
            messages: bundle.messages(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let reply = self.provider.complete(provider_request).await.map_err(|e| {
            error!(provider = self.provider.name(), error = %e, "Draft: model invocation failed");
            DraftError::from(e)
        })?;

        if reply.text.trim().is_empty() {
            error!(
                provider = self.provider.name(),
                stop_reason = reply.stop_reason.as_deref().unwrap_or("-"),
                "Draft: model returned no text"
            );
            return Err(DraftError::Internal("model returned an empty continuation".into()));
        }

        // ── Step 4: Cite ──
        let citation = extract_citation(&passages);

        // ── Step 5: Assemble ──
        let response = assemble_response(&reply.text);

        let usage = reply.usage.unwrap_or_default();
        info!(
            passages = passages.len(),
            cited = citation.is_some(),
            response_len = response.len(),
            responding_model = %reply.model,
            stop_reason = reply.stop_reason.as_deref().unwrap_or("-"),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Draft: response generated"
        );

        Ok(DraftResponse {
            response,
            citation,
            session_id: request.session_id.clone(),
        })
    }
}

/// The source of the highest-ranked passage only.
pub fn extract_citation(passages: &[RetrievedPassage]) -> Option<String> {
    passages
        .first()
        .and_then(|p| p.location.reference())
        .map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────
