//! Run directory layout and materialization (§4.8 step 6, §6).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gotn_graph_store::WorkspaceLayout;

/// Paths within one `run-<timestamp>` directory.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    root: PathBuf,
}

impl RunDirectory {
    /// Create (if absent) the run directory and its `patches/` subdirectory
    /// for `run_id` under `layout`.
    pub fn create(layout: &WorkspaceLayout, run_id: &str) -> io::Result<Self> {
        let root = layout.run_dir(run_id);
        fs::create_dir_all(&root)?;
        fs::create_dir_all(root.join("patches"))?;
        Ok(Self { root })
    }

    /// Wrap an already-existing run directory without creating anything.
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    /// The run directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `plan.json`.
    pub fn plan_path(&self) -> PathBuf {
        self.root.join("plan.json")
    }

    /// `steps.jsonl`.
    pub fn steps_path(&self) -> PathBuf {
        self.root.join("steps.jsonl")
    }

    /// `patches/<node_id>.patch`.
    pub fn patch_path(&self, node_id: &str) -> PathBuf {
        self.root.join("patches").join(format!("{node_id}.patch"))
    }
}

/// Find the most recently created run directory under `layout`'s runs
/// area, by lexicographic order of `run-<timestamp>` names (timestamps are
/// RFC 3339, so lexicographic order matches chronological order).
pub fn latest_run_dir(layout: &WorkspaceLayout) -> Option<RunDirectory> {
    let entries = fs::read_dir(layout.runs_dir()).ok()?;
    let mut names: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    names.sort();
    names.pop().map(RunDirectory::at)
}
