//! Text-to-vector embedding (§4.6).
//!
//! `Embedder` maps text to a fixed-dimension vector. The only shipped
//! implementation, [`HttpEmbedder`], retries transient upstream failures
//! (HTTP 429 and 5xx) with exponential backoff and surfaces everything
//! else immediately.

use async_trait::async_trait;
use gotn_schema::{GotnError, Result};
use serde::{Deserialize, Serialize};
use tokio_retry2::strategy::{jitter, ExponentialFactorBackoff};
use tokio_retry2::{Retry, RetryError};

/// Initial retry delay in milliseconds (§4.6).
const INITIAL_DELAY_MS: u64 = 250;
/// Backoff multiplier applied per attempt.
const BACKOFF_FACTOR: f64 = 2.0;
/// Maximum number of retries after the first attempt.
const MAX_RETRIES: usize = 3;

/// Maps text to a vector of fixed dimension `D`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`. Returned vectors must have length exactly `D` with
    /// all finite components; violations raise
    /// [`GotnError::InvalidEmbedding`].
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The fixed dimension `D` this embedder produces.
    fn dim(&self) -> usize;
}

/// HTTP client for a hosted embedding endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

enum AttemptError {
    Retryable(String),
    Permanent(String),
}

impl HttpEmbedder {
    /// Build a client for `endpoint`, authenticating with `api_key` and
    /// requesting embeddings from `model` of dimension `dim`.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, dim: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            dim,
        }
    }

    async fn attempt(&self, text: &str) -> std::result::Result<Vec<f32>, AttemptError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(AttemptError::Retryable(format!(
                "transient embedder error: {status}"
            )));
        }
        if status.is_client_error() {
            return Err(AttemptError::Permanent(format!(
                "embedder rejected request: {status}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Permanent(e.to_string()))?;
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let retry_strategy = ExponentialFactorBackoff::from_millis(INITIAL_DELAY_MS, BACKOFF_FACTOR)
            .map(jitter)
            .take(MAX_RETRIES);

        let embedding = Retry::spawn(retry_strategy, || async {
            self.attempt(text).await.map_err(|err| match err {
                AttemptError::Retryable(msg) => {
                    tracing::debug!(error = %msg, "retrying embedder call");
                    RetryError::transient(msg)
                }
                AttemptError::Permanent(msg) => RetryError::permanent(msg),
            })
        })
        .await
        .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;

        validate_embedding(&embedding, self.dim)?;
        Ok(embedding)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

fn validate_embedding(vec: &[f32], expected_dim: usize) -> Result<()> {
    if vec.len() != expected_dim {
        return Err(GotnError::InvalidEmbedding(format!(
            "expected dimension {expected_dim}, got {}",
            vec.len()
        )));
    }
    if vec.iter().any(|c| !c.is_finite()) {
        return Err(GotnError::InvalidEmbedding(
            "embedding contains a non-finite component".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn validate_embedding_accepts_matching_dimension() {
        assert!(validate_embedding(&[1.0, 2.0, 3.0], 3).is_ok());
    }

    #[test]
    fn validate_embedding_rejects_wrong_dimension() {
        let err = validate_embedding(&[1.0, 2.0], 3).unwrap_err();
        assert_eq!(err.kind(), "InvalidEmbedding");
    }

    #[test]
    fn validate_embedding_rejects_non_finite() {
        let err = validate_embedding(&[1.0, f32::INFINITY], 2).unwrap_err();
        assert_eq!(err.kind(), "InvalidEmbedding");
    }

    #[test]
    fn http_embedder_exposes_configured_dim() {
        let embedder = HttpEmbedder::new("https://embed.internal", "key", "text-embed", 1536);
        assert_eq!(embedder.dim(), 1536);
    }
}
