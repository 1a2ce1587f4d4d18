//! The [`Node`] shape: a single micro-prompt and its lifecycle state.

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not yet attempted.
    Ready,
    /// Currently being executed (reserved for future use by execution backends).
    Running,
    /// Executed successfully; patch stub written.
    Completed,
    /// Guard evaluation returned `fail`.
    Failed,
    /// Guard evaluation short-circuited on pre-existing artifacts.
    Skipped,
    /// Reserved for future upstream-dependency gating; not set by this core.
    Blocked,
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Ready
    }
}

/// Expected output artifacts for a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifacts {
    /// Paths (relative to the workspace root) whose presence short-circuits execution.
    #[serde(default)]
    pub files: Vec<String>,
    /// Free-form named outputs (e.g. a symbol or endpoint this node produces).
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Free-form dependency descriptors (e.g. a package name), informational only.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Links a node to the vector it was embedded as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingRef {
    /// Logical collection name in the vector store.
    pub collection: String,
    /// Id of the embedded vector within that collection (equal to the node id
    /// in this core's usage, but kept distinct for forward compatibility).
    pub id: String,
}

/// Who/what created or last touched an entity, and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provenance {
    /// Free-form actor identifier (e.g. `"breakdown"`, `"user"`, a tool name).
    pub created_by: String,
    /// Free-form source descriptor (e.g. the originating prompt id).
    pub source: String,
    /// Creation timestamp, RFC 3339. Defaulted to wall-clock on ingest if absent.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last-update timestamp, RFC 3339.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A single micro-prompt: an atomic, executable task derived from decomposition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Unique id within the graph.
    pub id: NodeId,
    /// Free-form classification tag, e.g. `"micro_prompt"`, `"code_symbol"`.
    pub kind: String,
    /// One-line human summary, used as KNN query text and in traces.
    pub summary: String,
    /// The full prompt text a downstream executor would run.
    pub prompt_text: String,

    /// Parent node id in the decomposition tree, if any.
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Child node ids in the decomposition tree.
    #[serde(default)]
    pub children: Vec<NodeId>,

    /// Content tags this node consumes (matched against other nodes' `produces`).
    #[serde(default)]
    pub requires: Vec<String>,
    /// Content tags this node emits.
    #[serde(default)]
    pub produces: Vec<String>,

    /// Optional execution selector (a path, symbol, or other target descriptor).
    #[serde(default)]
    pub exec_target: Option<String>,
    /// Free-form tags, folded into the soft-embedding query text.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Human-readable acceptance criteria.
    #[serde(default)]
    pub success_criteria: Vec<String>,
    /// Guard expressions evaluated before execution (see `gotn-guards`).
    #[serde(default)]
    pub guards: Vec<String>,
    /// Expected output artifacts.
    #[serde(default)]
    pub artifacts: Artifacts,

    /// Current lifecycle state.
    #[serde(default)]
    pub status: NodeStatus,
    /// Monotonically advancing version, bumped on every persisted write.
    #[serde(default = "default_version")]
    pub version: u64,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Last-update timestamp, RFC 3339.
    pub updated_at: String,

    /// Link to the vector store entry for this node's embedding, if one exists.
    #[serde(default)]
    pub embedding_ref: Option<EmbeddingRef>,

    /// Creation/update provenance.
    pub provenance: Provenance,
}

fn default_version() -> u64 {
    1
}

impl Node {
    /// The text embedded for semantic edge inference: summary plus tags,
    /// space-joined (§4.7).
    pub fn embedding_text(&self) -> String {
        if self.tags.is_empty() {
            self.summary.clone()
        } else {
            format!("{} {}", self.summary, self.tags.join(" "))
        }
    }
}
