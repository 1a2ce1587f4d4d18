//! The [`Meta`] shape: small workspace-identity document at `meta.json`.

use serde::{Deserialize, Serialize};

/// `{ version, created, updated, workspace_path }` (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    /// Schema version of the `.gotn/` layout itself (not the graph version).
    pub version: u64,
    /// Workspace creation timestamp, RFC 3339.
    pub created: String,
    /// Timestamp of the most recent `meta.json` write, RFC 3339.
    pub updated: String,
    /// Absolute path to the workspace root this `.gotn/` directory belongs to.
    pub workspace_path: String,
}

/// The `.gotn/` layout schema version this crate writes and understands.
pub const META_SCHEMA_VERSION: u64 = 1;

impl Meta {
    /// Build a fresh `Meta` for a newly initialized workspace.
    pub fn new(workspace_path: impl Into<String>, now: impl Into<String>) -> Self {
        let now = now.into();
        Self {
            version: META_SCHEMA_VERSION,
            created: now.clone(),
            updated: now,
            workspace_path: workspace_path.into(),
        }
    }
}
