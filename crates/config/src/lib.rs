//! Configuration loading, validation, and management for maildraft.
//!
//! Loads configuration from `~/.maildraft/config.toml` with environment
//! variable overrides. Structural problems are rejected at load time;
//! settings a particular server mode needs (knowledge base, endpoints,
//! upstream) are checked by the `require_*` accessors before that mode
//! starts, so a missing value is a fatal startup error rather than a
//! per-request one.

use maildraft_core::ModelId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.maildraft/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Knowledge base searched for every draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<String>,

    /// Cloud region; used to derive endpoint URLs that are not set explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Model used when a request does not pick one
    #[serde(default)]
    pub default_model: ModelId,

    /// Per-call HTTP deadline for outbound requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Model runtime and knowledge base endpoints
    #[serde(default)]
    pub bedrock: BedrockConfig,

    /// Public gateway (the browser-facing API)
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Standalone orchestrator boundary server
    #[serde(default)]
    pub orchestrator: OrchestratorServerConfig,
}

fn default_request_timeout_secs() -> u64 {
    29
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("knowledge_base_id", &self.knowledge_base_id)
            .field("region", &self.region)
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("bedrock", &self.bedrock)
            .field("gateway", &self.gateway)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BedrockConfig {
    /// Bearer API key for both endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model runtime base URL (overrides the region-derived default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_url: Option<String>,

    /// Knowledge base runtime base URL (overrides the region-derived default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_runtime_url: Option<String>,
}

impl std::fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("api_key", &redact(&self.api_key))
            .field("runtime_url", &self.runtime_url)
            .field("agent_runtime_url", &self.agent_runtime_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// When set, the gateway forwards drafts to this orchestrator endpoint
    /// instead of running the orchestrator in-process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_gateway_port() -> u16 {
    3001
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_gateway_port(),
            upstream_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_orchestrator_port")]
    pub port: u16,
}

fn default_orchestrator_port() -> u16 {
    3002
}

impl Default for OrchestratorServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_orchestrator_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.maildraft/config.toml),
    /// then apply environment overrides from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from a specific file, then apply process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (highest priority).
    ///
    /// `lookup` resolves a variable name; the process environment is used by
    /// [`AppConfig::load`].
    ///
    /// - `MAILDRAFT_KNOWLEDGE_BASE_ID`, then `KNOWLEDGE_BASE_ID`
    /// - `MAILDRAFT_REGION`, then `AWS_REGION`
    /// - `MAILDRAFT_RUNTIME_URL`, `MAILDRAFT_AGENT_RUNTIME_URL`
    /// - `MAILDRAFT_API_KEY`, then `AWS_BEARER_TOKEN_BEDROCK`
    /// - `MAILDRAFT_DEFAULT_MODEL`
    /// - `MAILDRAFT_UPSTREAM_URL`
    /// - `PORT` (gateway port)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .find(|v| !v.trim().is_empty())
        };

        if let Some(kb) = first(&["MAILDRAFT_KNOWLEDGE_BASE_ID", "KNOWLEDGE_BASE_ID"]) {
            self.knowledge_base_id = Some(kb);
        }
        if let Some(region) = first(&["MAILDRAFT_REGION", "AWS_REGION"]) {
            self.region = Some(region);
        }
        if let Some(url) = first(&["MAILDRAFT_RUNTIME_URL"]) {
            self.bedrock.runtime_url = Some(url);
        }
        if let Some(url) = first(&["MAILDRAFT_AGENT_RUNTIME_URL"]) {
            self.bedrock.agent_runtime_url = Some(url);
        }
        if let Some(key) = first(&["MAILDRAFT_API_KEY", "AWS_BEARER_TOKEN_BEDROCK"]) {
            self.bedrock.api_key = Some(key);
        }
        if let Some(model) = first(&["MAILDRAFT_DEFAULT_MODEL"]) {
            self.default_model = model.parse().map_err(|e| ConfigError::InvalidEnv {
                var: "MAILDRAFT_DEFAULT_MODEL",
                reason: format!("{e}"),
            })?;
        }
        if let Some(url) = first(&["MAILDRAFT_UPSTREAM_URL"]) {
            self.gateway.upstream_url = Some(url);
        }
        if let Some(port) = first(&["PORT"]) {
            self.gateway.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "PORT",
                reason: format!("'{port}' is not a valid port number"),
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".maildraft")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        let urls = [
            ("bedrock.runtime_url", &self.bedrock.runtime_url),
            ("bedrock.agent_runtime_url", &self.bedrock.agent_runtime_url),
            ("gateway.upstream_url", &self.gateway.upstream_url),
        ];
        for (field, url) in urls {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::ValidationError(format!(
                        "{field} must be an http(s) URL, got '{url}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// The knowledge base id, required to run the orchestrator.
    pub fn require_knowledge_base_id(&self) -> Result<&str, ConfigError> {
        self.knowledge_base_id
            .as_deref()
            .map(str::trim)
            .filter(|kb| !kb.is_empty())
            .ok_or(ConfigError::Missing("knowledge_base_id (or MAILDRAFT_KNOWLEDGE_BASE_ID)"))
    }

    /// Base URL of the model runtime.
    pub fn require_runtime_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.bedrock.runtime_url, "bedrock-runtime")
            .ok_or(ConfigError::Missing("region or bedrock.runtime_url"))
    }

    /// Base URL of the knowledge base runtime.
    pub fn require_agent_runtime_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.bedrock.agent_runtime_url, "bedrock-agent-runtime")
            .ok_or(ConfigError::Missing("region or bedrock.agent_runtime_url"))
    }

    /// Upstream orchestrator endpoint, required in proxy mode.
    pub fn require_upstream_url(&self) -> Result<&str, ConfigError> {
        self.gateway
            .upstream_url
            .as_deref()
            .ok_or(ConfigError::Missing("gateway.upstream_url (or MAILDRAFT_UPSTREAM_URL)"))
    }

    /// Check everything the in-process orchestrator needs.
    pub fn require_orchestrator(&self) -> Result<(), ConfigError> {
        self.require_knowledge_base_id()?;
        self.require_runtime_url()?;
        self.require_agent_runtime_url()?;
        Ok(())
    }

    fn endpoint(&self, explicit: &Option<String>, service: &str) -> Option<String> {
        if let Some(url) = explicit {
            return Some(url.trim_end_matches('/').to_string());
        }
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|region| format!("https://{service}.{region}.amazonaws.com"))
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            knowledge_base_id: None,
            region: None,
            default_model: ModelId::default(),
            request_timeout_secs: default_request_timeout_secs(),
            bedrock: BedrockConfig::default(),
            gateway: GatewayConfig::default(),
            orchestrator: OrchestratorServerConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid value in environment variable {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}
