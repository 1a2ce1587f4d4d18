//! The [`Graph`] shape: the full persisted node/edge set for one workspace.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

/// `{ nodes, edges, version, updated }` (§3). The unit of persistence for
/// `graph.json`; also the in-memory result of journal replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Graph {
    /// All nodes, keyed implicitly by [`crate::Node::id`].
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// All edges.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Strictly increasing with every persisted write.
    #[serde(default)]
    pub version: u64,
    /// Wall-clock time of the last commit, RFC 3339.
    #[serde(default)]
    pub updated: String,
}

impl Graph {
    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by id, mutably.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// `true` if a node with this id exists.
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Edges whose `src` equals `id`.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.src == id)
    }

    /// Edges whose `dst` equals `id`.
    pub fn edges_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.dst == id)
    }

    /// Find an edge by its `(src, dst, type)` identity.
    pub fn find_edge(
        &self,
        src: &str,
        dst: &str,
        edge_type: crate::edge::EdgeType,
    ) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.src == src && e.dst == dst && e.edge_type == edge_type)
    }

    /// `true` if every edge endpoint resolves to a node currently in the graph
    /// (invariant 2, checked at the end of recovery and before every write).
    pub fn has_no_dangling_edges(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.has_node(&e.src) && self.has_node(&e.dst))
    }

    /// Count of edges whose endpoints both resolve to nodes in the graph.
    /// Used by the `recover` operation's integrity report.
    pub fn resolvable_edge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| self.has_node(&e.src) && self.has_node(&e.dst))
            .count()
    }
}
