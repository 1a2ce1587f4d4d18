//! Exact in-memory cosine-similarity vector store (§4.5, "In-memory").

use std::collections::HashMap;

use async_trait::async_trait;
use gotn_schema::{GotnError, Result};
use tokio::sync::Mutex;

use crate::store::{Match, VectorStore};

type Key = (Option<String>, String);

struct Inner {
    dim: Option<usize>,
    vectors: HashMap<Key, Vec<f32>>,
}

/// In-process vector store backed by a `HashMap`. Used when no remote
/// endpoint is configured, and in tests.
pub struct InMemoryVectorStore {
    inner: Mutex<Inner>,
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVectorStore {
    /// An empty store with no dimension committed yet.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                dim: None,
                vectors: HashMap::new(),
            }),
        }
    }
}

fn validate_vec(vec: &[f32]) -> Result<()> {
    if vec.is_empty() {
        return Err(GotnError::InvalidEmbedding("vector is empty".to_string()));
    }
    if vec.iter().any(|component| !component.is_finite()) {
        return Err(GotnError::InvalidEmbedding(
            "vector contains a non-finite component".to_string(),
        ));
    }
    Ok(())
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, id: &str, vec: &[f32], project_id: Option<&str>) -> Result<()> {
        validate_vec(vec)?;
        let mut inner = self.inner.lock().await;
        match inner.dim {
            Some(dim) if dim != vec.len() => {
                return Err(GotnError::InvalidEmbedding(format!(
                    "expected dimension {dim}, got {}",
                    vec.len()
                )));
            }
            Some(_) => {}
            None => inner.dim = Some(vec.len()),
        }
        let key = (project_id.map(str::to_string), id.to_string());
        inner.vectors.insert(key, vec.to_vec());
        Ok(())
    }

    async fn search(
        &self,
        vec: &[f32],
        k: usize,
        project_id: Option<&str>,
    ) -> Result<Vec<Match>> {
        validate_vec(vec)?;
        if k == 0 {
            return Err(GotnError::InvalidEmbedding(
                "k must be positive".to_string(),
            ));
        }
        let inner = self.inner.lock().await;
        if let Some(dim) = inner.dim {
            if dim != vec.len() {
                return Err(GotnError::InvalidEmbedding(format!(
                    "expected dimension {dim}, got {}",
                    vec.len()
                )));
            }
        }
        let mut scored: Vec<Match> = inner
            .vectors
            .iter()
            .filter(|((entry_project, _), _)| match project_id {
                Some(wanted) => entry_project.as_deref() == Some(wanted),
                None => true,
            })
            .map(|((entry_project, id), stored)| Match {
                id: id.clone(),
                score: cosine(vec, stored),
                project_id: entry_project.clone(),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn get(&self, id: &str, project_id: Option<&str>) -> Result<Option<Vec<f32>>> {
        let inner = self.inner.lock().await;
        let key = (project_id.map(str::to_string), id.to_string());
        Ok(inner.vectors.get(&key).cloned())
    }
}
