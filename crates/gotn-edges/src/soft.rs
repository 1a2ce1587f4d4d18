//! Soft-semantic inference: embed, KNN, mutual-top-k, threshold (§4.7).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gotn_embedder::Embedder;
use gotn_schema::{Edge, EdgeType, Node, Provenance};
use gotn_vector::VectorStore;

/// Tunables for soft inference. Defaults match §4.7.
#[derive(Debug, Clone, Copy)]
pub struct SoftInferenceConfig {
    /// Neighbors requested per node, before self/threshold filtering.
    pub k: usize,
    /// Minimum cosine score to keep a candidate neighbor.
    pub threshold: f32,
}

impl Default for SoftInferenceConfig {
    fn default() -> Self {
        Self {
            k: 5,
            threshold: 0.78,
        }
    }
}

/// Embed and query neighbors for every node carrying an `embedding_ref`,
/// then keep only mutual top-k pairs above `config.threshold` and emit a
/// symmetric pair of `soft_semantic` edges for each.
pub async fn infer_soft_edges(
    nodes: &[Node],
    embedder: &Arc<dyn Embedder>,
    vector_store: &Arc<dyn VectorStore>,
    project_id: Option<&str>,
    config: SoftInferenceConfig,
    now: &str,
) -> Vec<Edge> {
    let mut neighbors: HashMap<String, Vec<(String, f32)>> = HashMap::new();

    for node in nodes {
        if node.embedding_ref.is_none() {
            continue;
        }
        let text = node.embedding_text();
        let vector = match embedder.embed(&text).await {
            Ok(v) => v,
            Err(error) => {
                tracing::warn!(node = %node.id, %error, "skipping semantic inference for node");
                continue;
            }
        };
        let matches = match vector_store
            .search(&vector, config.k + 1, project_id)
            .await
        {
            Ok(m) => m,
            Err(error) => {
                tracing::warn!(node = %node.id, %error, "vector search failed, skipping node");
                continue;
            }
        };
        let mut kept: Vec<(String, f32)> = matches
            .into_iter()
            .filter(|m| m.id != node.id && m.score >= config.threshold)
            .map(|m| (m.id, m.score))
            .collect();
        kept.truncate(config.k);
        neighbors.insert(node.id.clone(), kept);
    }

    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut edges = Vec::new();

    for (a_id, a_neighbors) in &neighbors {
        for (b_id, score_ab) in a_neighbors {
            let Some(b_neighbors) = neighbors.get(b_id) else {
                continue;
            };
            let Some((_, score_ba)) = b_neighbors.iter().find(|(id, _)| id == a_id) else {
                continue;
            };

            let pair_key = if a_id < b_id {
                (a_id.clone(), b_id.clone())
            } else {
                (b_id.clone(), a_id.clone())
            };
            if !seen_pairs.insert(pair_key) {
                continue;
            }

            let score = score_ab.max(*score_ba);
            let evidence = format!("{a_id} and {b_id} are mutual semantic neighbors");
            let provenance = || Provenance {
                created_by: "edge-engine".to_string(),
                source: "soft_inference".to_string(),
                created_at: Some(now.to_string()),
                updated_at: Some(now.to_string()),
            };

            edges.push(Edge {
                src: a_id.clone(),
                dst: b_id.clone(),
                edge_type: EdgeType::SoftSemantic,
                score: Some(f64::from(score)),
                evidence: Some(evidence.clone()),
                provenance: provenance(),
                version: 1,
            });
            edges.push(Edge {
                src: b_id.clone(),
                dst: a_id.clone(),
                edge_type: EdgeType::SoftSemantic,
                score: Some(f64::from(score)),
                evidence: Some(evidence),
                provenance: provenance(),
                version: 1,
            });
        }
    }

    edges
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gotn_schema::{GotnError, Result};
    use gotn_vector::Match;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32])
        }

        fn dim(&self) -> usize {
            1
        }
    }

    struct ScriptedVectorStore {
        responses: HashMap<String, Vec<Match>>,
    }

    #[async_trait]
    impl VectorStore for ScriptedVectorStore {
        async fn upsert(&self, _id: &str, _vec: &[f32], _project_id: Option<&str>) -> Result<()> {
            Ok(())
        }

        async fn search(
            &self,
            vec: &[f32],
            _k: usize,
            _project_id: Option<&str>,
        ) -> Result<Vec<Match>> {
            let key = format!("{vec:?}");
            Ok(self.responses.get(&key).cloned().unwrap_or_default())
        }

        async fn get(&self, _id: &str, _project_id: Option<&str>) -> Result<Option<Vec<f32>>> {
            Err(GotnError::NotFound("unused in tests".to_string()))
        }
    }

    fn node_with_ref(id: &str) -> Node {
        Node {
            id: id.to_string(),
            kind: "micro_prompt".to_string(),
            summary: id.to_string(),
            prompt_text: "do it".to_string(),
            parent: None,
            children: vec![],
            requires: vec![],
            produces: vec![],
            exec_target: None,
            tags: vec![],
            success_criteria: vec![],
            guards: vec![],
            artifacts: gotn_schema::Artifacts::default(),
            status: gotn_schema::NodeStatus::Ready,
            version: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            embedding_ref: Some(gotn_schema::EmbeddingRef {
                collection: "nodes".to_string(),
                id: id.to_string(),
            }),
            provenance: Provenance {
                created_by: "test".to_string(),
                source: "test".to_string(),
                created_at: None,
                updated_at: None,
            },
        }
    }

    #[tokio::test]
    async fn mutual_neighbors_above_threshold_create_symmetric_edges() {
        let a = node_with_ref("alpha");
        let b = node_with_ref("b");
        let vec_a = vec![a.embedding_text().len() as f32];
        let vec_b = vec![b.embedding_text().len() as f32];

        let mut responses = HashMap::new();
        responses.insert(
            format!("{vec_a:?}"),
            vec![Match {
                id: "b".to_string(),
                score: 0.9,
                project_id: None,
            }],
        );
        responses.insert(
            format!("{vec_b:?}"),
            vec![Match {
                id: "a".to_string(),
                score: 0.85,
                project_id: None,
            }],
        );

        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder);
        let vector_store: Arc<dyn VectorStore> = Arc::new(ScriptedVectorStore { responses });

        let edges = infer_soft_edges(
            &[a, b],
            &embedder,
            &vector_store,
            None,
            SoftInferenceConfig::default(),
            "2026-01-01T00:00:00Z",
        )
        .await;

        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| (e.score.unwrap() - 0.9).abs() < 1e-6));
        assert!(edges.iter().any(|e| e.src == "alpha" && e.dst == "b"));
        assert!(edges.iter().any(|e| e.src == "b" && e.dst == "alpha"));
    }

    #[tokio::test]
    async fn non_mutual_neighbor_is_dropped() {
        let a = node_with_ref("alpha");
        let b = node_with_ref("b");
        let vec_a = vec![a.embedding_text().len() as f32];
        let vec_b = vec![b.embedding_text().len() as f32];

        let mut responses = HashMap::new();
        responses.insert(
            format!("{vec_a:?}"),
            vec![Match {
                id: "b".to_string(),
                score: 0.9,
                project_id: None,
            }],
        );
        responses.insert(format!("{vec_b:?}"), vec![]);

        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder);
        let vector_store: Arc<dyn VectorStore> = Arc::new(ScriptedVectorStore { responses });

        let edges = infer_soft_edges(
            &[a, b],
            &embedder,
            &vector_store,
            None,
            SoftInferenceConfig::default(),
            "2026-01-01T00:00:00Z",
        )
        .await;

        assert!(edges.is_empty());
    }
}
