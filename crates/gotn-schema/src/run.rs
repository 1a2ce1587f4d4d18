//! The [`Run`] shape: one planned-and-executed traversal of the graph.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::node::Provenance;

/// Lifecycle state of a [`Run`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Plan composed, no node executed yet.
    Planned,
    /// At least one node has been executed.
    Running,
    /// All planned nodes reached a terminal status.
    Completed,
    /// Execution stopped due to an unrecoverable error.
    Failed,
    /// Execution was cancelled by the caller.
    Cancelled,
}

/// `{ id, goal, nodes, ordering_reason, status, created_at, provenance }` (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    /// Internal run identifier (also the `run-<id>` directory suffix).
    pub id: String,
    /// Free-text goal supplied to `compose_plan`, if any.
    #[serde(default)]
    pub goal: Option<String>,
    /// Ordered node ids as composed by the planner.
    pub nodes: Vec<NodeId>,
    /// Human-readable explanation of the ordering (§4.8 step 5).
    pub ordering_reason: String,
    /// Lifecycle state.
    pub status: RunStatus,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Creation provenance.
    pub provenance: Provenance,
}
