//! Retriever trait: the abstraction over the knowledge base.
//!
//! Given a free-text query, a retriever returns up to `top_k` passages,
//! most relevant first, each carrying the location of its source document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A single retrieval call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// Which knowledge base to search
    pub knowledge_base_id: String,
    /// The query text, passed through as-is
    pub text: String,
    /// Maximum number of passages to return
    pub top_k: u32,
}

/// Where a retrieved passage came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceLocation {
    /// A document in object storage, e.g. `s3://bucket/faq.pdf`
    S3 { uri: String },
    /// A crawled web page
    Web { url: String },
    /// The retriever reported no usable location
    None,
}

impl SourceLocation {
    /// The reference string to cite, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::S3 { uri } => Some(uri),
            Self::Web { url } => Some(url),
            Self::None => None,
        }
    }
}

/// A text passage returned by the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub location: SourceLocation,
    /// Relevance score, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl RetrievedPassage {
    pub fn new(text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            text: text.into(),
            location,
            score: None,
        }
    }
}

/// The core Retriever trait.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// A human-readable name for this retriever.
    fn name(&self) -> &str;

    /// Fetch the most relevant passages, ranked best first.
    ///
    /// An empty result is not an error.
    async fn retrieve(&self, query: RetrievalQuery) -> Result<Vec<RetrievedPassage>, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_per_location_kind() {
        let s3 = SourceLocation::S3 {
            uri: "s3://kb/faq.pdf".into(),
        };
        let web = SourceLocation::Web {
            url: "https://example.com/help".into(),
        };
        assert_eq!(s3.reference(), Some("s3://kb/faq.pdf"));
        assert_eq!(web.reference(), Some("https://example.com/help"));
        assert_eq!(SourceLocation::None.reference(), None);
    }
}
