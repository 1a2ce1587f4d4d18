//! The [`Edge`] shape: a directed, typed relationship between two nodes.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::node::Provenance;

/// The four edge relationships the core understands (§3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Execution dependency: `dst` must be satisfied before `src`.
    HardRequires,
    /// Mutual semantic similarity above threshold; created in opposing pairs.
    SoftSemantic,
    /// Advisory ordering hint; never enforced by the planner.
    SoftOrder,
    /// Parent-to-child decomposition edge.
    DerivedFrom,
}

impl EdgeType {
    /// `true` for edge types that carry a mandatory `score` (§3).
    pub fn requires_score(self) -> bool {
        matches!(self, EdgeType::SoftSemantic | EdgeType::SoftOrder)
    }
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// Source node id.
    pub src: NodeId,
    /// Destination node id.
    pub dst: NodeId,
    /// Relationship type.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Similarity/confidence score in `[0, 1]`. Required for soft edge types.
    #[serde(default)]
    pub score: Option<f64>,
    /// Free-form explanation of why this edge was created.
    #[serde(default)]
    pub evidence: Option<String>,
    /// Creation/update provenance.
    pub provenance: Provenance,
    /// Monotonically advancing version, bumped on every persisted write.
    #[serde(default = "default_version")]
    pub version: u64,
}

fn default_version() -> u64 {
    1
}

impl Edge {
    /// The `(src, dst, type)` triple that identifies this edge (§3).
    pub fn identity(&self) -> (NodeId, NodeId, EdgeType) {
        (self.src.clone(), self.dst.clone(), self.edge_type)
    }
}
