//! Step records appended to a run's `steps.jsonl` (§4.10 step 3).

use serde::{Deserialize, Serialize};

use gotn_schema::Result;

use crate::directory::RunDirectory;

/// One entry in `steps.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRecord {
    /// Wall-clock time the step was recorded, RFC 3339.
    pub timestamp: String,
    /// The node this step is about.
    pub node_id: String,
    /// The guard verdict as a string: `proceed`, `skip`, or `fail`.
    pub action: String,
    /// Human-readable explanation, copied from the guard verdict.
    pub reason: String,
}

/// Append `step` as one NDJSON line to `run`'s `steps.jsonl`.
pub async fn append_step(run: &RunDirectory, step: &StepRecord) -> Result<()> {
    let mut line = serde_json::to_vec(step)?;
    line.push(b'\n');
    gotn_atomicfile::append_and_sync_async(run.steps_path(), line)
        .await
        .map_err(gotn_schema::GotnError::Io)
}
