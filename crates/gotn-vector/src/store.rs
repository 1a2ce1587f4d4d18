//! The `VectorStore` contract (§4.5).

use async_trait::async_trait;
use gotn_schema::Result;

/// One neighbor returned by [`VectorStore::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// The id the vector was upserted under.
    pub id: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
    /// The project the match belongs to, if scoped.
    pub project_id: Option<String>,
}

/// Backend-agnostic nearest-neighbor store, keyed by `(project_id, id)`.
///
/// Implementations are selected once at startup and used as trait objects
/// (`Arc<dyn VectorStore>`); callers never downcast.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite the vector stored under `(project_id, id)`.
    async fn upsert(&self, id: &str, vec: &[f32], project_id: Option<&str>) -> Result<()>;

    /// Return up to `k` nearest neighbors of `vec`, ordered by score
    /// descending. Scoped to `project_id` when given, global otherwise.
    async fn search(
        &self,
        vec: &[f32],
        k: usize,
        project_id: Option<&str>,
    ) -> Result<Vec<Match>>;

    /// Fetch the raw vector stored under `(project_id, id)`, if any.
    async fn get(&self, id: &str, project_id: Option<&str>) -> Result<Option<Vec<f32>>>;
}
