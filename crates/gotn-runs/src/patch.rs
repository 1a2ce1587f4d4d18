//! Patch stubs: placeholders for downstream execution (§4.10 step 4).

use std::path::PathBuf;

use gotn_schema::{GotnError, Node, Result};

use crate::directory::RunDirectory;

/// Write `patches/<node.id>.patch` containing the node's summary, prompt
/// text, and `now`. The core does not execute code; this is a marker that
/// a downstream executor would act on.
pub fn write_patch_stub(run: &RunDirectory, node: &Node, now: &str) -> Result<PathBuf> {
    let path = run.patch_path(&node.id);
    let contents = format!(
        "node: {}\nsummary: {}\ntimestamp: {now}\n\n{}\n",
        node.id, node.summary, node.prompt_text
    );
    gotn_atomicfile::atomic_write(&path, contents.as_bytes()).map_err(GotnError::Io)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, NodeStatus, Provenance};

    #[test]
    fn write_patch_stub_contains_summary_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("patches")).unwrap();
        let run = RunDirectory::at(dir.path().to_path_buf());

        let node = Node {
            id: "n1".to_string(),
            kind: "micro_prompt".to_string(),
            summary: "write the thing".to_string(),
            prompt_text: "do the thing".to_string(),
            parent: None,
            children: vec![],
            requires: vec![],
            produces: vec![],
            exec_target: None,
            tags: vec![],
            success_criteria: vec![],
            guards: vec![],
            artifacts: Artifacts::default(),
            status: NodeStatus::Ready,
            version: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            embedding_ref: None,
            provenance: Provenance {
                created_by: "test".to_string(),
                source: "test".to_string(),
                created_at: None,
                updated_at: None,
            },
        };

        let path = write_patch_stub(&run, &node, "2026-01-01T00:00:00Z").unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("write the thing"));
        assert!(contents.contains("do the thing"));
    }
}
