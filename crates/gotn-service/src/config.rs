//! Layered configuration: compiled-in defaults overridden by `GOTN_*`
//! environment variables (§4.11).

use std::env;

use thiserror::Error;

/// A configuration value failed to parse.
#[derive(Debug, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    /// The environment variable that held the bad value.
    pub key: &'static str,
    /// What was wrong with it.
    pub message: String,
}

/// Recognized options (§6), with their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root for `.gotn/` (`GOTN_WORKSPACE`).
    pub workspace_path: String,
    /// Vector dimensionality `D` (`GOTN_EMBED_DIM`).
    pub embed_dim: usize,
    /// Enables the remote vector backend when set (`GOTN_VECTOR_ENDPOINT`).
    pub remote_vector_endpoint: Option<String>,
    /// Auth for the remote vector backend (`GOTN_VECTOR_TOKEN`).
    pub remote_vector_token: Option<String>,
    /// Embedding provider base URL (`GOTN_EMBEDDER_ENDPOINT`).
    pub embedder_endpoint: Option<String>,
    /// Auth for the embedder (`GOTN_EMBEDDER_API_KEY`).
    pub embedder_api_key: Option<String>,
    /// KNN neighbors per node (`GOTN_SOFT_K`).
    pub soft_k: usize,
    /// Minimum cosine score for soft edges (`GOTN_SOFT_THRESHOLD`).
    pub soft_threshold: f32,
    /// Default project scope for vectors (`GOTN_PROJECT_ID`).
    pub project_id: String,
    /// Listen address for `gotnd` (`GOTN_MCP_ADDR`, binary-only).
    pub mcp_bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_path: ".".to_string(),
            embed_dim: 1536,
            remote_vector_endpoint: None,
            remote_vector_token: None,
            embedder_endpoint: None,
            embedder_api_key: None,
            soft_k: 5,
            soft_threshold: 0.78,
            project_id: "default".to_string(),
            mcp_bind_addr: "127.0.0.1:7878".to_string(),
        }
    }
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_optional<T: std::str::FromStr>(
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError {
            key,
            message: format!("expected a number, got {raw:?}"),
        }),
    }
}

impl Config {
    /// Load from compiled-in defaults, overridden by `GOTN_*` process
    /// environment variables. Never panics on a missing optional key;
    /// only malformed numeric values raise a [`ConfigError`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            workspace_path: optional("GOTN_WORKSPACE").unwrap_or(defaults.workspace_path),
            embed_dim: parse_optional("GOTN_EMBED_DIM", defaults.embed_dim)?,
            remote_vector_endpoint: optional("GOTN_VECTOR_ENDPOINT"),
            remote_vector_token: optional("GOTN_VECTOR_TOKEN"),
            embedder_endpoint: optional("GOTN_EMBEDDER_ENDPOINT"),
            embedder_api_key: optional("GOTN_EMBEDDER_API_KEY"),
            soft_k: parse_optional("GOTN_SOFT_K", defaults.soft_k)?,
            soft_threshold: parse_optional("GOTN_SOFT_THRESHOLD", defaults.soft_threshold)?,
            project_id: optional("GOTN_PROJECT_ID").unwrap_or(defaults.project_id),
            mcp_bind_addr: optional("GOTN_MCP_ADDR").unwrap_or(defaults.mcp_bind_addr),
        })
    }

    /// `true` if both remote vector settings are present, selecting the
    /// remote backend over in-memory (§4.5 selection rule).
    pub fn has_remote_vector_backend(&self) -> bool {
        self.remote_vector_endpoint.is_some() && self.remote_vector_token.is_some()
    }
}
