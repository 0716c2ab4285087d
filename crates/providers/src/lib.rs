//! HTTP implementations of maildraft's external collaborators.
//!
//! - [`BedrockProvider`] implements `maildraft_core::Provider` against the
//!   model runtime's invoke API (Anthropic Messages body).
//! - [`KnowledgeBaseRetriever`] implements `maildraft_core::Retriever`
//!   against the knowledge base retrieve API.
//!
//! [`build_from_config`] wires both from an [`AppConfig`].

pub mod bedrock;
pub mod knowledge_base;

pub use bedrock::BedrockProvider;
pub use knowledge_base::KnowledgeBaseRetriever;

use std::sync::Arc;
use std::time::Duration;

use maildraft_config::{AppConfig, ConfigError};
use maildraft_core::{Provider, Retriever};

/// The two collaborators the orchestrator needs.
pub struct Backends {
    pub retriever: Arc<dyn Retriever>,
    pub provider: Arc<dyn Provider>,
}

/// Errors while constructing backends at startup.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build a pooled HTTP client with the given per-request deadline.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Build the retriever and model provider from configuration.
///
/// Fails when the region/endpoints are not configured, so a misconfigured
/// process never starts serving.
pub fn build_from_config(config: &AppConfig) -> Result<Backends, BuildError> {
    let client = http_client(config.request_timeout_secs)?;

    let mut retriever =
        KnowledgeBaseRetriever::new(config.require_agent_runtime_url()?, client.clone());
    let mut provider = BedrockProvider::new(config.require_runtime_url()?, client);

    if let Some(key) = &config.bedrock.api_key {
        retriever = retriever.with_api_key(key);
        provider = provider.with_api_key(key);
    }

    Ok(Backends {
        retriever: Arc::new(retriever),
        provider: Arc::new(provider),
    })
}

/// Append path segments to a base URL, percent-encoding each one.
///
/// Any path already on the base is kept, so runtimes mounted under a
/// prefix still resolve.
pub(crate) fn endpoint_url(base: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(base).map_err(|e| format!("'{base}': {e}"))?;
    url.path_segments_mut()
        .map_err(|()| format!("'{base}' cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_encodes_segments() {
        let url = endpoint_url("http://localhost:9000", &["knowledgebases", "KB 1/2", "retrieve"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/knowledgebases/KB%201%2F2/retrieve");
    }

    #[test]
    fn endpoint_url_keeps_base_path() {
        let url = endpoint_url("https://proxy.example.com/runtime/", &["model", "m", "invoke"])
            .unwrap();
        assert_eq!(url.as_str(), "https://proxy.example.com/runtime/model/m/invoke");
    }

    #[test]
    fn endpoint_url_rejects_unparseable_base() {
        assert!(endpoint_url("not a url", &["x"]).is_err());
        assert!(endpoint_url("mailto:ops@example.com", &["x"]).is_err());
    }

    #[test]
    fn build_requires_endpoints() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(BuildError::Config(ConfigError::Missing(_)))
        ));
    }

    #[test]
    fn build_from_region() {
        let config = AppConfig {
            region: Some("us-east-1".into()),
            ..AppConfig::default()
        };
        let backends = build_from_config(&config).unwrap();
        assert_eq!(backends.provider.name(), "bedrock");
        assert_eq!(backends.retriever.name(), "knowledge_base");
    }
}
