//! Orchestrates hard and soft inference and commits the results (§4.7).

use std::sync::Arc;

use gotn_embedder::Embedder;
use gotn_graph_store::GraphStore;
use gotn_schema::{Edge, GotnError, Node, Result};
use gotn_vector::VectorStore;

use crate::hard::infer_hard_edges;
use crate::soft::{infer_soft_edges, SoftInferenceConfig};

/// Outcome of one inference pass.
#[derive(Debug, Clone, Default)]
pub struct InferenceReport {
    /// New `hard_requires` edges committed.
    pub hard_created: usize,
    /// New `soft_semantic` edges committed.
    pub soft_created: usize,
    /// Edge commits that failed for a reason other than "already exists".
    pub commit_failures: usize,
    /// The `hard_requires` edges actually created this pass (excludes
    /// ones that already existed or failed to commit).
    pub new_hard_edges: Vec<Edge>,
    /// The `soft_semantic` edges actually created this pass.
    pub new_soft_edges: Vec<Edge>,
}

/// Runs hard and soft inference over a node set and commits surviving
/// edges through a [`GraphStore`].
pub struct EdgeEngine {
    graph_store: Arc<GraphStore>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    config: SoftInferenceConfig,
}

impl EdgeEngine {
    /// Build an engine wired to the given collaborators, using the default
    /// `k`/threshold from [`SoftInferenceConfig::default`].
    pub fn new(
        graph_store: Arc<GraphStore>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            graph_store,
            embedder,
            vector_store,
            config: SoftInferenceConfig::default(),
        }
    }

    /// Override the default `k`/threshold.
    pub fn with_config(mut self, config: SoftInferenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Run both passes over `nodes` and commit every surviving edge.
    /// Individual commit failures are logged and counted, not propagated;
    /// the pass itself only fails if reading the graph or computing
    /// candidates fails outright.
    pub async fn run(
        &self,
        nodes: &[Node],
        project_id: Option<&str>,
        now: &str,
    ) -> Result<InferenceReport> {
        let hard_edges = infer_hard_edges(nodes, now);
        let soft_edges = infer_soft_edges(
            nodes,
            &self.embedder,
            &self.vector_store,
            project_id,
            self.config,
            now,
        )
        .await;

        let mut report = InferenceReport::default();
        for edge in hard_edges {
            let committed = self.commit(edge.clone(), now).await;
            match committed {
                Committed::Created => {
                    report.hard_created += 1;
                    report.new_hard_edges.push(edge);
                }
                Committed::AlreadyExists => {}
                Committed::Failed => report.commit_failures += 1,
            }
        }
        for edge in soft_edges {
            let committed = self.commit(edge.clone(), now).await;
            match committed {
                Committed::Created => {
                    report.soft_created += 1;
                    report.new_soft_edges.push(edge);
                }
                Committed::AlreadyExists => {}
                Committed::Failed => report.commit_failures += 1,
            }
        }
        Ok(report)
    }

    async fn commit(&self, edge: Edge, now: &str) -> Committed {
        match self.graph_store.add_edge(edge, now).await {
            Ok(_) => Committed::Created,
            Err(GotnError::Conflict(_)) => Committed::AlreadyExists,
            Err(error) => {
                tracing::warn!(%error, "edge commit failed");
                Committed::Failed
            }
        }
    }
}

enum Committed {
    Created,
    AlreadyExists,
    Failed,
}
