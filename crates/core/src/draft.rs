//! Draft request and response value objects.
//!
//! These flow through the whole system:
//! UI sends a question → Gateway validates it → Orchestrator drafts a reply.

use serde::{Deserialize, Serialize};

use crate::model::ModelId;

/// Who spoke a line of the prior conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The customer writing in
    Customer,
    /// The customer-service representative
    Agent,
}

impl Speaker {
    /// Parse a wire role; only `customer` and `agent` are accepted.
    pub fn from_role(role: &str) -> Option<Self> {
        match role {
            "customer" => Some(Self::Customer),
            "agent" => Some(Self::Agent),
            _ => None,
        }
    }

    /// Label used when rendering history into a prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Agent => "CS Rep",
        }
    }
}

/// One line of the conversation that preceded the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Speaker,
    pub content: String,
}

impl ConversationTurn {
    pub fn customer(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Customer,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Agent,
            content: content.into(),
        }
    }
}

/// A validated request to draft one reply email.
///
/// Inbound bodies are turned into this type by field-level validation,
/// not by deserializing it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub question: String,

    /// Opaque correlation token, echoed back unchanged
    pub session_id: Option<String>,

    /// Model override; the orchestrator's default is used when absent
    pub model_id: Option<ModelId>,

    /// Prior turns, oldest first
    pub conversation_history: Vec<ConversationTurn>,
}

impl DraftRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            session_id: None,
            model_id: None,
            conversation_history: Vec::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_model(mut self, model_id: ModelId) -> Self {
        self.model_id = Some(model_id);
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.conversation_history = history;
        self
    }
}

/// The drafted reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    /// Email body, always starting with the greeting prefill
    pub response: String,
    /// Source of the top-ranked passage, if one was retrieved
    pub citation: Option<String>,
    pub session_id: Option<String>,
}
