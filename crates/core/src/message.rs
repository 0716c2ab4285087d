//! Message types sent to the language model.
//!
//! The system prompt travels as a top-level field of the provider request,
//! so only the two conversational roles exist here.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The prompt author (our composed user turn)
    User,
    /// The model, or a prefilled partial model turn
    Assistant,
}

/// A single message in a model conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    ///
    /// When it is the last message of a request, the model continues it
    /// rather than starting a fresh turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("Hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Hi"}"#);
    }
}
