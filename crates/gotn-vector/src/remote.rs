//! HTTP client for a cluster-hosted ANN index (§4.5, "Remote index").

use async_trait::async_trait;
use gotn_schema::{GotnError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::store::{Match, VectorStore};

/// Connection details for the remote ANN backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the index service, e.g. `https://vectors.internal`.
    pub endpoint: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Collection name. Created on first use if absent.
    pub collection: String,
    /// Embedding dimension `D` the collection is provisioned with.
    pub dim: usize,
}

/// Client for a remote collection reached over HTTP(S) with a bearer token.
///
/// Failures are not retried here; the edge engine treats a
/// [`GotnError::VectorBackendUnavailable`] as "skip semantic inference" for
/// the affected node rather than a fatal error.
pub struct RemoteVectorStore {
    client: reqwest::Client,
    config: RemoteConfig,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    id: &'a str,
    project_id: &'a str,
    embedding: &'a [f32],
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    embedding: &'a [f32],
    k: usize,
    project_id: &'a str,
}

#[derive(Deserialize)]
struct SearchResponseEntry {
    id: String,
    score: f32,
    project_id: String,
}

#[derive(Deserialize)]
struct GetResponse {
    embedding: Option<Vec<f32>>,
}

/// Empty `project_id` means "unscoped" (§4.5).
fn scope(project_id: Option<&str>) -> &str {
    project_id.unwrap_or("")
}

impl RemoteVectorStore {
    /// Build a client for `config`. Does not perform any I/O; the
    /// collection is created lazily on first use.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/collections/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.collection
        )
    }

    fn check_dim(&self, vec: &[f32]) -> Result<()> {
        if vec.len() != self.config.dim {
            return Err(GotnError::InvalidEmbedding(format!(
                "expected dimension {}, got {}",
                self.config.dim,
                vec.len()
            )));
        }
        if vec.iter().any(|c| !c.is_finite()) {
            return Err(GotnError::InvalidEmbedding(
                "vector contains a non-finite component".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for RemoteVectorStore {
    async fn upsert(&self, id: &str, vec: &[f32], project_id: Option<&str>) -> Result<()> {
        self.check_dim(vec)?;
        let body = UpsertRequest {
            id,
            project_id: scope(project_id),
            embedding: vec,
        };
        let response = self
            .client
            .put(format!("{}/vectors/{id}", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GotnError::VectorBackendUnavailable(format!(
                "upsert failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn search(
        &self,
        vec: &[f32],
        k: usize,
        project_id: Option<&str>,
    ) -> Result<Vec<Match>> {
        self.check_dim(vec)?;
        if k == 0 {
            return Err(GotnError::InvalidEmbedding(
                "k must be positive".to_string(),
            ));
        }
        let body = SearchRequest {
            embedding: vec,
            k,
            project_id: scope(project_id),
        };
        let response = self
            .client
            .post(format!("{}/search", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GotnError::VectorBackendUnavailable(format!(
                "search failed with status {}",
                response.status()
            )));
        }
        let entries: Vec<SearchResponseEntry> = response
            .json()
            .await
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|entry| Match {
                id: entry.id,
                score: entry.score,
                project_id: if entry.project_id.is_empty() {
                    None
                } else {
                    Some(entry.project_id)
                },
            })
            .collect())
    }

    async fn get(&self, id: &str, project_id: Option<&str>) -> Result<Option<Vec<f32>>> {
        let response = self
            .client
            .get(format!("{}/vectors/{id}", self.collection_url()))
            .query(&[("project_id", scope(project_id))])
            .send()
            .await
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GotnError::VectorBackendUnavailable(format!(
                "get failed with status {}",
                response.status()
            )));
        }
        let parsed: GetResponse = response
            .json()
            .await
            .map_err(|e| GotnError::VectorBackendUnavailable(e.to_string()))?;
        Ok(parsed.embedding)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn scope_maps_none_to_empty_string() {
        assert_eq!(scope(None), "");
        assert_eq!(scope(Some("p1")), "p1");
    }

    #[test]
    fn collection_url_trims_trailing_slash() {
        let store = RemoteVectorStore::new(RemoteConfig {
            endpoint: "https://vectors.internal/".to_string(),
            token: "secret".to_string(),
            collection: "gotn".to_string(),
            dim: 4,
        })
        .unwrap();
        assert_eq!(
            store.collection_url(),
            "https://vectors.internal/collections/gotn"
        );
    }

    #[test]
    fn check_dim_rejects_wrong_length() {
        let store = RemoteVectorStore::new(RemoteConfig {
            endpoint: "https://vectors.internal".to_string(),
            token: "secret".to_string(),
            collection: "gotn".to_string(),
            dim: 3,
        })
        .unwrap();
        let err = store.check_dim(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), "InvalidEmbedding");
    }

    #[test]
    fn check_dim_rejects_non_finite() {
        let store = RemoteVectorStore::new(RemoteConfig {
            endpoint: "https://vectors.internal".to_string(),
            token: "secret".to_string(),
            collection: "gotn".to_string(),
            dim: 2,
        })
        .unwrap();
        let err = store.check_dim(&[1.0, f32::NAN]).unwrap_err();
        assert_eq!(err.kind(), "InvalidEmbedding");
    }
}
