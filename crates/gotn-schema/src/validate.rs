//! Total validators for the canonical shapes (§4.1).
//!
//! Each validator walks every field and collects every violation instead of
//! bailing on the first; callers get back one [`crate::ValidationError`]
//! naming everything wrong at once. This is used at every trust boundary:
//! ingress from external tools, per-entry during journal replay, and before
//! every commit.

use crate::edge::{Edge, EdgeType};
use crate::error::{Violation, ValidationError};
use crate::node::Node;

/// Validate a [`Node`] in isolation (no cross-node checks — those belong to
/// the graph store, which alone knows the full node set).
pub fn validate_node(node: &Node) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if node.id.trim().is_empty() {
        violations.push(Violation::new("id", "must not be empty"));
    }
    if node.kind.trim().is_empty() {
        violations.push(Violation::new("kind", "must not be empty"));
    }
    if node.summary.trim().is_empty() {
        violations.push(Violation::new("summary", "must not be empty"));
    }
    if node.prompt_text.trim().is_empty() {
        violations.push(Violation::new("prompt_text", "must not be empty"));
    }
    if let Some(parent) = &node.parent {
        if parent.trim().is_empty() {
            violations.push(Violation::new("parent", "must not be empty when present"));
        }
        if parent == &node.id {
            violations.push(Violation::new("parent", "must not equal the node's own id"));
        }
    }
    for (i, child) in node.children.iter().enumerate() {
        if child.trim().is_empty() {
            violations.push(Violation::new(
                format!("children[{i}]"),
                "must not be empty",
            ));
        }
    }
    for (i, tag) in node.requires.iter().enumerate() {
        if tag.trim().is_empty() {
            violations.push(Violation::new(format!("requires[{i}]"), "must not be empty"));
        }
    }
    for (i, tag) in node.produces.iter().enumerate() {
        if tag.trim().is_empty() {
            violations.push(Violation::new(format!("produces[{i}]"), "must not be empty"));
        }
    }
    for (i, path) in node.artifacts.files.iter().enumerate() {
        if path.trim().is_empty() {
            violations.push(Violation::new(
                format!("artifacts.files[{i}]"),
                "must not be empty",
            ));
        }
    }
    if node.created_at.trim().is_empty() {
        violations.push(Violation::new("created_at", "must not be empty"));
    }
    if node.updated_at.trim().is_empty() {
        violations.push(Violation::new("updated_at", "must not be empty"));
    }
    if node.version == 0 {
        violations.push(Violation::new("version", "must be at least 1"));
    }
    if node.provenance.created_by.trim().is_empty() {
        violations.push(Violation::new(
            "provenance.created_by",
            "must not be empty",
        ));
    }
    if node.provenance.source.trim().is_empty() {
        violations.push(Violation::new("provenance.source", "must not be empty"));
    }
    if let Some(embedding_ref) = &node.embedding_ref {
        if embedding_ref.collection.trim().is_empty() {
            violations.push(Violation::new(
                "embedding_ref.collection",
                "must not be empty",
            ));
        }
        if embedding_ref.id.trim().is_empty() {
            violations.push(Violation::new("embedding_ref.id", "must not be empty"));
        }
    }

    ValidationError::from_violations(violations).map_or(Ok(()), Err)
}

/// Validate an [`Edge`] in isolation (endpoint *existence* is a graph-level
/// concern, checked by the graph store; this only validates the edge's own
/// shape).
pub fn validate_edge(edge: &Edge) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if edge.src.trim().is_empty() {
        violations.push(Violation::new("src", "must not be empty"));
    }
    if edge.dst.trim().is_empty() {
        violations.push(Violation::new("dst", "must not be empty"));
    }
    if !edge.src.is_empty() && edge.src == edge.dst {
        violations.push(Violation::new("dst", "must differ from src"));
    }
    if edge.edge_type.requires_score() {
        match edge.score {
            None => violations.push(Violation::new(
                "score",
                format!("is required for edge type {:?}", edge.edge_type),
            )),
            Some(score) if !(0.0..=1.0).contains(&score) => {
                violations.push(Violation::new("score", "must lie in [0, 1]"));
            }
            Some(_) => {}
        }
    } else if let Some(score) = edge.score {
        if !(0.0..=1.0).contains(&score) {
            violations.push(Violation::new("score", "must lie in [0, 1] when present"));
        }
    }
    if edge.version == 0 {
        violations.push(Violation::new("version", "must be at least 1"));
    }
    if edge.provenance.created_by.trim().is_empty() {
        violations.push(Violation::new(
            "provenance.created_by",
            "must not be empty",
        ));
    }
    if edge.provenance.source.trim().is_empty() {
        violations.push(Violation::new("provenance.source", "must not be empty"));
    }

    ValidationError::from_violations(violations).map_or(Ok(()), Err)
}

/// `true` if `edge_type` is one the planner treats as a hard execution
/// dependency (convenience re-export of the one-liner callers otherwise
/// repeat).
pub fn is_hard_dependency(edge_type: EdgeType) -> bool {
    matches!(edge_type, EdgeType::HardRequires)
}
