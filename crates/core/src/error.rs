//! Error types for the maildraft domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `DraftError` is the
//! normalized form every failure is converted into before it leaves the
//! orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Collaborator errors ---

/// Failure reported by the language model invoker.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether this failure means the model service could not be reached
    /// or is temporarily unable to serve (as opposed to a bad request or a
    /// malformed reply).
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Failure reported by the knowledge retriever.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retrieve request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Retrieval throttled")]
    Throttled,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Knowledge base not found: {0}")]
    KnowledgeBaseNotFound(String),

    #[error("Malformed retrieve response: {0}")]
    InvalidResponse(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl RetrievalError {
    /// Whether the knowledge base could not be reached or is overloaded.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::Throttled => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

// --- Client errors ---

/// A draft request rejected before it reaches the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body is required")]
    MissingBody,

    #[error("Request body must be valid JSON")]
    InvalidJson,

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("question is required")]
    MissingQuestion,

    #[error("question must be a string")]
    QuestionNotText,

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("modelId must be a string")]
    ModelIdNotText,

    #[error("Invalid modelId '{0}'")]
    InvalidModelId(String),

    #[error("requestSessionId must be a string")]
    SessionIdNotText,

    #[error("conversationHistory must be an array")]
    HistoryNotArray,

    #[error("conversationHistory[{index}] must have string 'role' and 'content' fields")]
    MalformedHistoryEntry { index: usize },

    #[error("conversationHistory[{index}] has invalid role '{role}' (expected 'customer' or 'agent')")]
    InvalidRole { index: usize, role: String },
}

// --- Normalized orchestrator failure ---

/// The only two ways a draft can fail once the request is valid.
///
/// Detail strings are for server-side logs. They are never placed in a
/// response body; use [`DraftError::public_message`] for that.
#[derive(Debug, Clone, Error)]
pub enum DraftError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DraftError {
    /// HTTP status this failure is surfaced as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UpstreamUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Generic, client-safe message.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable(_) => {
                "The drafting service is temporarily unavailable. Please try again later."
            }
            Self::Internal(_) => "Failed to generate a draft response.",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.status_code(), self.public_message())
    }
}

impl From<ProviderError> for DraftError {
    fn from(err: ProviderError) -> Self {
        if err.is_unavailable() {
            Self::UpstreamUnavailable(format!("language model: {err}"))
        } else {
            Self::Internal(format!("language model: {err}"))
        }
    }
}

impl From<RetrievalError> for DraftError {
    fn from(err: RetrievalError) -> Self {
        if err.is_unavailable() {
            Self::UpstreamUnavailable(format!("knowledge base: {err}"))
        } else {
            Self::Internal(format!("knowledge base: {err}"))
        }
    }
}

/// Machine-readable error body: `{ statusCode, error, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            error: reason_phrase(status_code).into(),
            message: message.into(),
        }
    }
}

impl From<&ValidationError> for ErrorEnvelope {
    fn from(err: &ValidationError) -> Self {
        Self::new(400, err.to_string())
    }
}

fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn network_failures_are_unavailable() {
        assert!(ProviderError::Network("refused".into()).is_unavailable());
        assert!(ProviderError::Timeout("29s".into()).is_unavailable());
        assert!(RetrievalError::Network("dns".into()).is_unavailable());
        assert!(RetrievalError::Throttled.is_unavailable());
        assert!(
            RetrievalError::ApiError {
                status_code: 503,
                message: String::new()
            }
            .is_unavailable()
        );
    }

    #[test]
    fn client_side_failures_are_internal() {
        let err: DraftError = ProviderError::InvalidResponse("no text".into()).into();
        assert!(matches!(err, DraftError::Internal(_)));
        assert_eq!(err.status_code(), 500);

        let err: DraftError = RetrievalError::AuthenticationFailed("bad key".into()).into();
        assert!(matches!(err, DraftError::Internal(_)));
    }

    #[test]
    fn invalid_endpoint_is_internal() {
        let err: DraftError = ProviderError::InvalidEndpoint("not a url".into()).into();
        assert_eq!(err.status_code(), 500);
        let err: DraftError = RetrievalError::InvalidEndpoint("not a url".into()).into();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn retrieval_network_error_maps_to_503() {
        let err: DraftError = RetrievalError::Network("connection refused".into()).into();
        assert_eq!(err.status_code(), 503);
        let envelope = err.envelope();
        assert_eq!(envelope.error, "Service Unavailable");
        assert!(!envelope.message.contains("connection refused"));
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let json = serde_json::to_value(ErrorEnvelope::new(404, "Route GET /x not found")).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["message"], "Route GET /x not found");
    }

    #[test]
    fn oversized_body_has_reason_phrase() {
        let envelope = ErrorEnvelope::new(413, "too big");
        assert_eq!(envelope.error, "Payload Too Large");
    }

    #[test]
    fn validation_error_envelope() {
        let err = ValidationError::InvalidRole {
            index: 1,
            role: "bot".into(),
        };
        let envelope = ErrorEnvelope::from(&err);
        assert_eq!(envelope.status_code, 400);
        assert!(envelope.message.contains("bot"));
    }
}
