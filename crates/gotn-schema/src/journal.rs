//! The [`JournalEntry`] shape and its event-specific payloads.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::ids::NodeId;
use crate::node::Node;

/// The event-specific payload of a [`JournalEntry`].
///
/// `workspace_initialized`, `start_run`, and `finish_run` carry no graph
/// mutation; replay skips them when rebuilding the node/edge set (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum JournalEvent {
    /// The workspace's `.gotn/` directory was created.
    WorkspaceInitialized {
        /// Absolute workspace path.
        workspace_path: String,
    },
    /// A node was created.
    AddNode {
        /// The node as committed to the snapshot.
        node: Node,
    },
    /// A node was updated in place (last-write-wins by id on replay).
    UpdateNode {
        /// The node's new state.
        node: Node,
    },
    /// An edge was created.
    AddEdge {
        /// The edge as committed to the snapshot.
        edge: Edge,
    },
    /// An edge was updated in place (last-write-wins by `(src, dst, type)` on replay).
    UpdateEdge {
        /// The edge's new state.
        edge: Edge,
    },
    /// A plan was composed and a run directory created.
    StartRun {
        /// The new run's id.
        run_id: String,
        /// The ordered node ids in the plan.
        nodes: Vec<NodeId>,
    },
    /// A run reached a terminal status.
    FinishRun {
        /// The run's id.
        run_id: String,
        /// The terminal status, as its snake_case name.
        status: String,
    },
}

/// `{ id, timestamp, event, data }` (§3), one per line of `journal.ndjson`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    /// Unique id for this entry (a fresh UUID; see [`crate::new_internal_id`]).
    pub id: String,
    /// Wall-clock time this entry was appended, RFC 3339.
    pub timestamp: String,
    /// The event and its payload.
    #[serde(flatten)]
    pub event: JournalEvent,
}

impl JournalEntry {
    /// Build a new entry stamped with `timestamp` and a fresh id.
    pub fn new(timestamp: impl Into<String>, event: JournalEvent) -> Self {
        Self {
            id: crate::ids::new_internal_id(),
            timestamp: timestamp.into(),
            event,
        }
    }
}
