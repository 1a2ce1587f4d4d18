//! Append-only NDJSON journal with replay-based crash recovery.
//!
//! `gotn-journal` owns exactly two operations: append a line, durably, and
//! fold every line written so far back into a [`gotn_schema::Graph`]. It has
//! no opinion about what a valid `.gotn/` layout looks like; `gotn-graph-store`
//! composes this crate with `gotn-atomicfile`'s locks and snapshot writer to
//! get that.

pub mod replay;

pub use replay::{replay_lines, CorruptEntry, ReplayOutcome, ReplayedRun};

use std::path::{Path, PathBuf};

use gotn_schema::{GotnError, JournalEntry, Result};

/// A single workspace's `journal.ndjson`.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Point a `Journal` at `path`. Does not touch the filesystem; the file
    /// is created lazily on first [`Journal::append`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The journal file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `entry` as one compact-JSON line and append it, fsyncing
    /// before returning so the write is durable the instant the caller is
    /// acknowledged.
    pub async fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        gotn_atomicfile::append_and_sync_async(self.path.clone(), line)
            .await
            .map_err(GotnError::Io)
    }

    /// Read the whole journal file and fold it into a [`ReplayOutcome`]. If
    /// the file does not exist yet, returns an empty outcome rather than an
    /// error — a brand-new workspace has no journal until the first write.
    pub fn replay(&self) -> Result<ReplayOutcome> {
        let outcome = match std::fs::read_to_string(&self.path) {
            Ok(contents) => replay_lines(contents.lines()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ReplayOutcome::default(),
            Err(e) => return Err(GotnError::Io(e)),
        };
        if !outcome.corrupt_entries.is_empty() {
            tracing::warn!(
                count = outcome.corrupt_entries.len(),
                "skipped corrupt journal entries during replay"
            );
        }
        if !outcome.dropped_edges.is_empty() {
            tracing::warn!(
                count = outcome.dropped_edges.len(),
                "dropped edges with unresolved endpoints during replay"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::JournalEvent;

    #[tokio::test]
    async fn append_then_replay_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let journal = Journal::new(dir.path().join("journal.ndjson"));
        let entry = JournalEntry::new(
            "2026-01-01T00:00:00Z",
            JournalEvent::WorkspaceInitialized {
                workspace_path: dir.path().display().to_string(),
            },
        );
        journal.append(&entry).await.expect("append");
        let outcome = journal.replay().expect("replay");
        assert!(outcome.workspace_initialized);
    }

    #[test]
    fn replay_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let journal = Journal::new(dir.path().join("does-not-exist.ndjson"));
        let outcome = journal.replay().expect("replay");
        assert!(outcome.graph.nodes.is_empty());
        assert!(outcome.corrupt_entries.is_empty());
    }
}
