//! Request validation shared by every entry point.
//!
//! The body is inspected as a raw JSON value so each malformed field gets
//! its own descriptive message instead of a generic deserializer error.
//! The gateway route and the orchestrator event handler both go through
//! [`parse_draft_request`], so they accept and reject the same bodies.

use maildraft_core::draft::{ConversationTurn, DraftRequest, Speaker};
use maildraft_core::error::ValidationError;
use maildraft_core::model::ModelId;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse raw body bytes and validate them into a [`DraftRequest`].
///
/// Deserializer detail is logged, never returned.
pub fn parse_draft_request(body: &[u8]) -> Result<DraftRequest, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MissingBody);
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Unparseable request body");
        ValidationError::InvalidJson
    })?;
    validate_draft_request(&value)
}

/// Validate a draft request body and convert it into a [`DraftRequest`].
///
/// Optional fields that are present but `null` are treated as absent.
pub fn validate_draft_request(body: &Value) -> Result<DraftRequest, ValidationError> {
    let obj = body
        .as_object()
        .ok_or(ValidationError::NotAnObject)?;

    let question = match obj.get("question") {
        None | Some(Value::Null) => return Err(ValidationError::MissingQuestion),
        Some(Value::String(q)) => q,
        Some(_) => return Err(ValidationError::QuestionNotText),
    };
    if question.trim().is_empty() {
        return Err(ValidationError::EmptyQuestion);
    }

    let model_id = match present(obj, "modelId") {
        None => None,
        Some(Value::String(id)) => Some(
            id.parse::<ModelId>()
                .map_err(|_| ValidationError::InvalidModelId(id.clone()))?,
        ),
        Some(_) => return Err(ValidationError::ModelIdNotText),
    };

    let session_id = match present(obj, "requestSessionId").or_else(|| present(obj, "sessionId")) {
        None => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(_) => return Err(ValidationError::SessionIdNotText),
    };

    let conversation_history = match present(obj, "conversationHistory") {
        None => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_turn(index, entry))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(ValidationError::HistoryNotArray),
    };

    Ok(DraftRequest {
        question: question.clone(),
        session_id,
        model_id,
        conversation_history,
    })
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn parse_turn(index: usize, entry: &Value) -> Result<ConversationTurn, ValidationError> {
    let role = entry.get("role").and_then(Value::as_str);
    let content = entry.get("content").and_then(Value::as_str);

    let (Some(role), Some(content)) = (role, content) else {
        return Err(ValidationError::MalformedHistoryEntry { index });
    };

    let role = Speaker::from_role(role).ok_or_else(|| ValidationError::InvalidRole {
        index,
        role: role.to_string(),
    })?;

    Ok(ConversationTurn {
        role,
        content: content.to_string(),
    })
}
