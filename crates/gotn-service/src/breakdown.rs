//! The `BreakdownProvider` port (§1, §4): the LLM that decomposes a prompt
//! into micro-prompts is an external collaborator. Only its structured
//! output is consumed here.

use async_trait::async_trait;
use gotn_schema::{GotnError, Result};
use serde::{Deserialize, Serialize};

/// Decomposition shape: `tree` nests children under `parent`, `flat`
/// produces siblings with no parent/child links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownMode {
    /// Nodes form a decomposition tree via `parent`/`children`.
    Tree,
    /// Nodes are independent siblings.
    Flat,
}

/// One micro-prompt proposed by the breakdown provider, prior to being
/// assigned an id and persisted as a [`gotn_schema::Node`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedNode {
    /// Free-form classification tag.
    pub kind: String,
    /// One-line human summary.
    pub summary: String,
    /// The full prompt text a downstream executor would run.
    pub prompt_text: String,
    /// Index of this node's parent within the same response, if any
    /// (`mode == Tree` only).
    pub parent_index: Option<usize>,
    /// Tags this node consumes.
    pub requires: Vec<String>,
    /// Tags this node emits.
    pub produces: Vec<String>,
    /// Free-form tags folded into the soft-embedding query text.
    pub tags: Vec<String>,
}

/// The provider's structured response to one `breakdown_prompt` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownResponse {
    /// Proposed nodes, in the order the provider returned them.
    pub nodes: Vec<ProposedNode>,
    /// Index into `nodes` of the root, when `mode == Tree`.
    pub root_index: Option<usize>,
}

/// Decomposes a prompt into micro-prompts. The core only consumes the
/// structured output; the provider's own inference is out of scope.
#[async_trait]
pub trait BreakdownProvider: Send + Sync {
    /// Decompose `prompt` for `project_id` into at most `max_nodes`
    /// proposed nodes, shaped per `mode`.
    async fn breakdown(
        &self,
        project_id: &str,
        prompt: &str,
        mode: BreakdownMode,
        max_nodes: usize,
    ) -> Result<BreakdownResponse>;
}

#[derive(Serialize)]
struct BreakdownRequest<'a> {
    project_id: &'a str,
    prompt: &'a str,
    mode: BreakdownMode,
    max_nodes: usize,
}

/// Calls an externally hosted prompt-decomposition service over HTTP. The
/// service's own reasoning is out of scope; only its JSON shape is
/// consumed.
pub struct HttpBreakdownProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpBreakdownProvider {
    /// Build a client for `endpoint`, authenticating with `api_key`.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from `GOTN_BREAKDOWN_ENDPOINT`/`GOTN_BREAKDOWN_API_KEY`, or
    /// `None` if either is unset.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("GOTN_BREAKDOWN_ENDPOINT").ok()?;
        let api_key = std::env::var("GOTN_BREAKDOWN_API_KEY").ok()?;
        Some(Self::new(endpoint, api_key))
    }
}

#[async_trait]
impl BreakdownProvider for HttpBreakdownProvider {
    async fn breakdown(
        &self,
        project_id: &str,
        prompt: &str,
        mode: BreakdownMode,
        max_nodes: usize,
    ) -> Result<BreakdownResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&BreakdownRequest {
                project_id,
                prompt,
                mode,
                max_nodes,
            })
            .send()
            .await
            .map_err(|error| GotnError::VectorBackendUnavailable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(GotnError::VectorBackendUnavailable(format!(
                "breakdown provider returned {}",
                response.status()
            )));
        }

        response
            .json::<BreakdownResponse>()
            .await
            .map_err(|error| GotnError::VectorBackendUnavailable(error.to_string()))
    }
}

/// A single node spanning the whole prompt, used when no breakdown
/// provider is configured. Lets `gotnd`/`gotn-cli` run without an external
/// LLM at the cost of no actual decomposition.
pub struct SingleNodeBreakdownProvider;

#[async_trait]
impl BreakdownProvider for SingleNodeBreakdownProvider {
    async fn breakdown(
        &self,
        _project_id: &str,
        prompt: &str,
        _mode: BreakdownMode,
        _max_nodes: usize,
    ) -> Result<BreakdownResponse> {
        let summary = prompt.chars().take(80).collect::<String>();
        Ok(BreakdownResponse {
            nodes: vec![ProposedNode {
                kind: "micro_prompt".to_string(),
                summary,
                prompt_text: prompt.to_string(),
                parent_index: None,
                requires: vec![],
                produces: vec![],
                tags: vec![],
            }],
            root_index: Some(0),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_node_provider_wraps_the_whole_prompt() {
        let provider = SingleNodeBreakdownProvider;
        let response = provider
            .breakdown("proj", "build a thing", BreakdownMode::Flat, 10)
            .await
            .unwrap();
        assert_eq!(response.nodes.len(), 1);
        assert_eq!(response.nodes[0].prompt_text, "build a thing");
        assert_eq!(response.root_index, Some(0));
    }

    #[test]
    fn from_env_requires_both_settings() {
        std::env::remove_var("GOTN_BREAKDOWN_ENDPOINT");
        std::env::remove_var("GOTN_BREAKDOWN_API_KEY");
        assert!(HttpBreakdownProvider::from_env().is_none());
    }
}
