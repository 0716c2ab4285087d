//! The whitelist of language models a draft may be generated with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A language model the drafting assistant is allowed to invoke.
///
/// Serialized as its wire identifier; deserializing any identifier outside
/// the whitelist fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelId {
    #[default]
    Claude3Haiku,
    Claude3Sonnet,
    Claude35Sonnet,
    Claude35Haiku,
}

impl ModelId {
    const ALL: [ModelId; 4] = [
        ModelId::Claude3Haiku,
        ModelId::Claude3Sonnet,
        ModelId::Claude35Sonnet,
        ModelId::Claude35Haiku,
    ];

    /// Every whitelisted model, in model-picker order.
    pub fn all() -> &'static [ModelId] {
        &Self::ALL
    }

    /// The identifier used on the wire and in the invoke URL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude3Haiku => "anthropic.claude-3-haiku-20240307-v1:0",
            Self::Claude3Sonnet => "anthropic.claude-3-sonnet-20240229-v1:0",
            Self::Claude35Sonnet => "anthropic.claude-3-5-sonnet-20240620-v1:0",
            Self::Claude35Haiku => "anthropic.claude-3-5-haiku-20241022-v1:0",
        }
    }

    /// Human-readable name for the model picker.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Claude3Haiku => "Claude 3 Haiku",
            Self::Claude3Sonnet => "Claude 3 Sonnet",
            Self::Claude35Sonnet => "Claude 3.5 Sonnet",
            Self::Claude35Haiku => "Claude 3.5 Haiku",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a whitelisted model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model identifier '{}'", self.0)
    }
}

impl std::error::Error for UnknownModel {}

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

impl TryFrom<String> for ModelId {
    type Error = UnknownModel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelId> for String {
    fn from(model: ModelId) -> Self {
        model.as_str().to_string()
    }
}
