//! Knowledge base retriever.
//!
//! Calls `POST /knowledgebases/{id}/retrieve` and maps each retrieval
//! result to a [`RetrievedPassage`], classifying its source location as an
//! object-storage URI, a web URL, or nothing.

use async_trait::async_trait;
use maildraft_core::error::RetrievalError;
use maildraft_core::retriever::{RetrievalQuery, RetrievedPassage, Retriever, SourceLocation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::endpoint_url;

/// HTTP client for the knowledge base retrieve API.
pub struct KnowledgeBaseRetriever {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl KnowledgeBaseRetriever {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
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

    fn retrieve_url(&self, knowledge_base_id: &str) -> Result<reqwest::Url, RetrievalError> {
        endpoint_url(&self.base_url, &["knowledgebases", knowledge_base_id, "retrieve"])
            .map_err(RetrievalError::InvalidEndpoint)
    }

    fn build_body(query: &RetrievalQuery) -> RetrieveBody<'_> {
        RetrieveBody {
            retrieval_query: ApiQuery { text: &query.text },
            retrieval_configuration: ApiRetrievalConfiguration {
                vector_search_configuration: ApiVectorSearch {
                    number_of_results: query.top_k,
                },
            },
        }
    }

    fn classify_location(location: Option<ApiLocation>) -> SourceLocation {
        let Some(location) = location else {
            return SourceLocation::None;
        };
        match location.kind.as_deref() {
            Some("S3") => location
                .s3_location
                .map(|s3| SourceLocation::S3 { uri: s3.uri })
                .unwrap_or(SourceLocation::None),
            Some("WEB") => location
                .web_location
                .map(|web| SourceLocation::Web { url: web.url })
                .unwrap_or(SourceLocation::None),
            _ => SourceLocation::None,
        }
    }

    fn to_passages(resp: RetrieveResponse, top_k: u32) -> Vec<RetrievedPassage> {
        resp.retrieval_results
            .into_iter()
            .take(top_k as usize)
            .map(|r| RetrievedPassage {
                text: r.content.text,
                location: Self::classify_location(r.location),
                score: r.score,
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for KnowledgeBaseRetriever {
    fn name(&self) -> &str {
        "knowledge_base"
    }

    async fn retrieve(&self, query: RetrievalQuery) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let url = self.retrieve_url(&query.knowledge_base_id)?;
        let body = Self::build_body(&query);

        debug!(knowledge_base = %query.knowledge_base_id, top_k = query.top_k, "Sending retrieve request");

        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RetrievalError::Timeout(e.to_string())
            } else {
                RetrievalError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(RetrievalError::Throttled);
        }
        if status == 401 || status == 403 {
            return Err(RetrievalError::AuthenticationFailed(
                "Knowledge base rejected the credentials".into(),
            ));
        }
        if status == 404 {
            return Err(RetrievalError::KnowledgeBaseNotFound(query.knowledge_base_id));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Knowledge base API error");
            return Err(RetrievalError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(format!("Failed to parse retrieve response: {e}")))?;

        Ok(Self::to_passages(api_resp, query.top_k))
    }
}

// --- API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveBody<'a> {
    retrieval_query: ApiQuery<'a>,
    retrieval_configuration: ApiRetrievalConfiguration,
}

#[derive(Debug, Serialize)]
struct ApiQuery<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRetrievalConfiguration {
    vector_search_configuration: ApiVectorSearch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiVectorSearch {
    number_of_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    content: ApiContent,
    #[serde(default)]
    location: Option<ApiLocation>,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    s3_location: Option<ApiS3Location>,
    #[serde(default)]
    web_location: Option<ApiWebLocation>,
}

#[derive(Debug, Deserialize)]
struct ApiS3Location {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct ApiWebLocation {
    url: String,
}
