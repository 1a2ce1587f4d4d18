//! Node selection and soft-weight computation (§4.8 steps 1 and 3).

use std::collections::HashMap;

use gotn_schema::{EdgeType, Graph, Node};

/// Select target nodes: any node whose `requires` or `produces`
/// intersects the given filters, or every node if both filters are empty.
pub fn select_nodes<'a>(graph: &'a Graph, requires: &[String], produces: &[String]) -> Vec<&'a Node> {
    if requires.is_empty() && produces.is_empty() {
        return graph.nodes.iter().collect();
    }
    graph
        .nodes
        .iter()
        .filter(|node| {
            node.requires.iter().any(|tag| requires.contains(tag))
                || node.produces.iter().any(|tag| produces.contains(tag))
        })
        .collect()
}

/// Sum of `score` over incoming `soft_semantic` edges into each node,
/// counting contributions from any node in the graph, not only selected
/// ones.
pub fn soft_weights(graph: &Graph, selected_ids: &[String]) -> HashMap<String, f64> {
    let mut weights: HashMap<String, f64> = selected_ids
        .iter()
        .map(|id| (id.clone(), 0.0))
        .collect();
    for edge in &graph.edges {
        if edge.edge_type != EdgeType::SoftSemantic {
            continue;
        }
        if let Some(weight) = weights.get_mut(&edge.dst) {
            *weight += edge.score.unwrap_or(0.0);
        }
    }
    weights
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, Edge, EdgeType, NodeStatus, Provenance};

    fn node(id: &str, requires: &[&str], produces: &[&str]) -> Node {
        Node {
            id: id.to_string(),
            kind: "micro_prompt".to_string(),
            summary: id.to_string(),
            prompt_text: "do it".to_string(),
            parent: None,
            children: vec![],
            requires: requires.iter().map(ToString::to_string).collect(),
            produces: produces.iter().map(ToString::to_string).collect(),
            exec_target: None,
            tags: vec![],
            success_criteria: vec![],
            guards: vec![],
            artifacts: Artifacts::default(),
            status: NodeStatus::Ready,
            version: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            embedding_ref: None,
            provenance: Provenance {
                created_by: "test".to_string(),
                source: "test".to_string(),
                created_at: None,
                updated_at: None,
            },
        }
    }

    #[test]
    fn empty_filters_select_everything() {
        let graph = Graph {
            nodes: vec![node("a", &[], &[]), node("b", &[], &[])],
            edges: vec![],
            version: 1,
            updated: "2026-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(select_nodes(&graph, &[], &[]).len(), 2);
    }

    #[test]
    fn filter_selects_matching_requires_or_produces() {
        let graph = Graph {
            nodes: vec![
                node("a", &["db"], &[]),
                node("b", &[], &["other"]),
                node("c", &[], &[]),
            ],
            edges: vec![],
            version: 1,
            updated: "2026-01-01T00:00:00Z".to_string(),
        };
        let selected = select_nodes(&graph, &["db".to_string()], &[]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "a");
    }

    #[test]
    fn soft_weights_sum_incoming_scores() {
        let graph = Graph {
            nodes: vec![node("a", &[], &[]), node("b", &[], &[])],
            edges: vec![
                Edge {
                    src: "x".to_string(),
                    dst: "a".to_string(),
                    edge_type: EdgeType::SoftSemantic,
                    score: Some(0.8),
                    evidence: None,
                    provenance: Provenance {
                        created_by: "test".to_string(),
                        source: "test".to_string(),
                        created_at: None,
                        updated_at: None,
                    },
                    version: 1,
                },
                Edge {
                    src: "y".to_string(),
                    dst: "a".to_string(),
                    edge_type: EdgeType::SoftSemantic,
                    score: Some(0.5),
                    evidence: None,
                    provenance: Provenance {
                        created_by: "test".to_string(),
                        source: "test".to_string(),
                        created_at: None,
                        updated_at: None,
                    },
                    version: 1,
                },
            ],
            version: 1,
            updated: "2026-01-01T00:00:00Z".to_string(),
        };
        let weights = soft_weights(&graph, &["a".to_string(), "b".to_string()]);
        assert!((weights["a"] - 1.3).abs() < 1e-9);
        assert!((weights["b"] - 0.0).abs() < 1e-9);
    }
}
