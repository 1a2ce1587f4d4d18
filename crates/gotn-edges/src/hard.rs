//! Hard-dependency inference: tag matching over `requires`/`produces` (§4.7).

use std::collections::HashMap;

use gotn_schema::{Edge, EdgeType, Node, Provenance};

/// Build `hard_requires` edges for every `(consumer, tag, producer)` triple
/// where `consumer.requires` contains `tag` and `producer.produces` contains
/// it, deduplicated on `(src, dst, type)`.
pub fn infer_hard_edges(nodes: &[Node], now: &str) -> Vec<Edge> {
    let mut producers: HashMap<&str, Vec<&Node>> = HashMap::new();
    for node in nodes {
        for tag in &node.produces {
            producers.entry(tag.as_str()).or_default().push(node);
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut edges = Vec::new();
    for consumer in nodes {
        for tag in &consumer.requires {
            let Some(candidates) = producers.get(tag.as_str()) else {
                continue;
            };
            for producer in candidates {
                if producer.id == consumer.id {
                    continue;
                }
                let key = (consumer.id.clone(), producer.id.clone());
                if !seen.insert(key) {
                    continue;
                }
                edges.push(Edge {
                    src: consumer.id.clone(),
                    dst: producer.id.clone(),
                    edge_type: EdgeType::HardRequires,
                    score: None,
                    evidence: Some(format!(
                        "{} requires '{tag}' which {} produces",
                        consumer.id, producer.id
                    )),
                    provenance: Provenance {
                        created_by: "edge-engine".to_string(),
                        source: "hard_inference".to_string(),
                        created_at: Some(now.to_string()),
                        updated_at: Some(now.to_string()),
                    },
                    version: 1,
                });
            }
        }
    }
    edges
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::NodeStatus;

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
            artifacts: gotn_schema::Artifacts::default(),
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
    fn matching_tag_creates_edge() {
        let a = node("a", &["db"], &[]);
        let b = node("b", &[], &["db"]);
        let edges = infer_hard_edges(&[a, b], "2026-01-01T00:00:00Z");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].src, "a");
        assert_eq!(edges[0].dst, "b");
        assert_eq!(edges[0].edge_type, EdgeType::HardRequires);
    }

    #[test]
    fn self_loop_is_excluded() {
        let a = node("a", &["db"], &["db"]);
        let edges = infer_hard_edges(&[a], "2026-01-01T00:00:00Z");
        assert!(edges.is_empty());
    }

    #[test]
    fn duplicate_producers_are_deduplicated_per_pair() {
        let a = node("a", &["db", "db"], &[]);
        let b = node("b", &[], &["db"]);
        let edges = infer_hard_edges(&[a, b], "2026-01-01T00:00:00Z");
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn no_matching_producer_yields_no_edges() {
        let a = node("a", &["db"], &[]);
        let edges = infer_hard_edges(&[a], "2026-01-01T00:00:00Z");
        assert!(edges.is_empty());
    }
}
