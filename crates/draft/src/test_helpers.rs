//! Shared test doubles for the two external collaborators.

use maildraft_core::error::{ProviderError, RetrievalError};
use maildraft_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use maildraft_core::retriever::{RetrievalQuery, RetrievedPassage, Retriever, SourceLocation};
use std::sync::Mutex;

/// A retriever that returns a fixed result and records every query.
pub struct StaticRetriever {
    result: Result<Vec<RetrievedPassage>, RetrievalError>,
    queries: Mutex<Vec<RetrievalQuery>>,
}

impl StaticRetriever {
    pub fn passages(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            result: Ok(passages),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::passages(Vec::new())
    }

    pub fn failing(err: RetrievalError) -> Self {
        Self {
            result: Err(err),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<RetrievalQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        "static_mock"
    }

    async fn retrieve(&self, query: RetrievalQuery) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        self.queries.lock().unwrap().push(query);
        self.result.clone()
    }
}

/// A provider that returns a scripted reply and records every request.
pub struct ScriptedProvider {
    result: Result<String, ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ProviderError) -> Self {
        Self {
            result: Err(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let text = self.result.clone()?;
        Ok(ProviderResponse {
            text,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
            stop_reason: Some("end_turn".into()),
        })
    }
}

pub fn s3_passage(text: &str, uri: &str) -> RetrievedPassage {
    RetrievedPassage::new(text, SourceLocation::S3 { uri: uri.into() })
}

pub fn web_passage(text: &str, url: &str) -> RetrievedPassage {
    RetrievedPassage::new(text, SourceLocation::Web { url: url.into() })
}
