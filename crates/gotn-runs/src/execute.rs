//! `execute_node`: guard evaluation, step recording, patch writing, and
//! status transition for a single node (§4.10).

use std::path::Path;

use gotn_graph_store::GraphStore;
use gotn_guards::{evaluate_node, GuardResult};
use gotn_schema::{GotnError, NodeStatus, Result};

use crate::directory::{latest_run_dir, RunDirectory};
use crate::patch::write_patch_stub;
use crate::steps::{append_step, StepRecord};

/// Outcome of executing one node.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// The node's id.
    pub node_id: String,
    /// The guard verdict that drove this execution.
    pub result: GuardResult,
    /// Human-readable explanation.
    pub reason: String,
    /// Path to the patch stub, if one was written (`result == Proceed`).
    pub patch_path: Option<std::path::PathBuf>,
}

fn action_label(result: GuardResult) -> &'static str {
    match result {
        GuardResult::Proceed => "proceed",
        GuardResult::Skip => "skip",
        GuardResult::Fail => "fail",
    }
}

/// Load `node_id`, evaluate guards, record a step, and on `proceed` write a
/// patch stub — then persist the resulting status transition.
pub async fn execute_node(
    graph_store: &GraphStore,
    workspace_root: &Path,
    node_id: &str,
    now: &str,
) -> Result<ExecutionOutcome> {
    let graph = graph_store.read_graph().await?;
    let mut node = graph
        .node(node_id)
        .cloned()
        .ok_or_else(|| GotnError::NotFound(format!("node {node_id} not found")))?;

    let verdict = evaluate_node(&node, workspace_root);

    let run = match latest_run_dir(graph_store.layout()) {
        Some(run) => run,
        None => RunDirectory::create(graph_store.layout(), "default")
            .map_err(GotnError::Io)?,
    };

    append_step(
        &run,
        &StepRecord {
            timestamp: now.to_string(),
            node_id: node_id.to_string(),
            action: action_label(verdict.result).to_string(),
            reason: verdict.reason.clone(),
        },
    )
    .await?;

    let patch_path = match verdict.result {
        GuardResult::Proceed => {
            let path = write_patch_stub(&run, &node, now)?;
            node.status = NodeStatus::Completed;
            Some(path)
        }
        GuardResult::Skip => {
            node.status = NodeStatus::Skipped;
            None
        }
        GuardResult::Fail => {
            node.status = NodeStatus::Failed;
            None
        }
    };

    node.updated_at = now.to_string();
    node.version += 1;
    graph_store.update_node(node, now).await?;

    Ok(ExecutionOutcome {
        node_id: node_id.to_string(),
        result: verdict.result,
        reason: verdict.reason,
        patch_path,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, NodeStatus as Status, Provenance};

    fn provenance() -> Provenance {
        Provenance {
            created_by: "test".to_string(),
            source: "test".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn node(id: &str, guards: &[&str]) -> gotn_schema::Node {
        gotn_schema::Node {
            id: id.to_string(),
            kind: "micro_prompt".to_string(),
            summary: "do thing".to_string(),
            prompt_text: "do it".to_string(),
            parent: None,
            children: vec![],
            requires: vec![],
            produces: vec![],
            exec_target: None,
            tags: vec![],
            success_criteria: vec![],
            guards: guards.iter().map(ToString::to_string).collect(),
            artifacts: Artifacts::default(),
            status: Status::Ready,
            version: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            embedding_ref: None,
            provenance: provenance(),
        }
    }

    #[tokio::test]
    async fn proceeding_node_writes_patch_and_completes() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.unwrap();
        store
            .add_node(node("n1", &[]), "2026-01-01T00:00:00Z")
            .await
            .unwrap();

        let outcome = execute_node(&store, dir.path(), "n1", "2026-01-01T00:01:00Z")
            .await
            .unwrap();

        assert_eq!(outcome.result, GuardResult::Proceed);
        assert!(outcome.patch_path.is_some());

        let graph = store.read_graph().await.unwrap();
        assert_eq!(graph.node("n1").unwrap().status, Status::Completed);
    }

    #[tokio::test]
    async fn failing_guard_marks_node_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.unwrap();
        store
            .add_node(node("n1", &["missing"]), "2026-01-01T00:00:00Z")
            .await
            .unwrap();

        let outcome = execute_node(&store, dir.path(), "n1", "2026-01-01T00:01:00Z")
            .await
            .unwrap();

        assert_eq!(outcome.result, GuardResult::Fail);
        let graph = store.read_graph().await.unwrap();
        assert_eq!(graph.node("n1").unwrap().status, Status::Failed);
    }

    #[tokio::test]
    async fn missing_node_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.unwrap();

        let err = execute_node(&store, dir.path(), "nope", "2026-01-01T00:01:00Z")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }
}
