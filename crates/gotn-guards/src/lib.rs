//! Guard evaluation: decides whether a node should proceed, skip, or fail
//! before execution (§4.9). No side effects.

pub mod taxonomy;

use std::path::Path;

use gotn_schema::Node;
use taxonomy::{evaluate_guard, GuardCheck};

/// The three outcomes a guard evaluation can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardResult {
    /// Execution should proceed.
    Proceed,
    /// Execution is unnecessary; outputs already exist.
    Skip,
    /// A guard's precondition failed; execution should not proceed.
    Fail,
}

/// The full verdict for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardVerdict {
    /// The node this verdict is for.
    pub node_id: String,
    /// The decision.
    pub result: GuardResult,
    /// Human-readable explanation.
    pub reason: String,
}

/// Evaluate `node` against `workspace_root`.
///
/// Order: the artifact short-circuit is checked first (the idempotency
/// knob — re-running a plan does no work for already-satisfied steps),
/// then each guard in declaration order. The first failing guard wins.
pub fn evaluate_node(node: &Node, workspace_root: &Path) -> GuardVerdict {
    if !node.artifacts.files.is_empty() {
        let all_present = node
            .artifacts
            .files
            .iter()
            .all(|path| workspace_root.join(path).exists());
        if all_present {
            return GuardVerdict {
                node_id: node.id.clone(),
                result: GuardResult::Skip,
                reason: format!(
                    "artifacts already present: {}",
                    node.artifacts.files.join(", ")
                ),
            };
        }
    }

    for guard in &node.guards {
        if let GuardCheck::Fail = evaluate_guard(guard, workspace_root) {
            return GuardVerdict {
                node_id: node.id.clone(),
                result: GuardResult::Fail,
                reason: format!("Guard failed: {guard}"),
            };
        }
    }

    GuardVerdict {
        node_id: node.id.clone(),
        result: GuardResult::Proceed,
        reason: "all guards passed".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, NodeStatus, Provenance};

    fn node(guards: &[&str], artifact_files: &[&str]) -> Node {
        Node {
            id: "n1".to_string(),
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
            artifacts: Artifacts {
                files: artifact_files.iter().map(ToString::to_string).collect(),
                outputs: vec![],
                dependencies: vec![],
            },
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
        }
    }

    #[test]
    fn no_guards_no_artifacts_proceeds() {
        let dir = tempfile::tempdir().unwrap();
        let verdict = evaluate_node(&node(&[], &[]), dir.path());
        assert_eq!(verdict.result, GuardResult::Proceed);
    }

    #[test]
    fn failing_guard_fails() {
        let dir = tempfile::tempdir().unwrap();
        let verdict = evaluate_node(&node(&["missing"], &[]), dir.path());
        assert_eq!(verdict.result, GuardResult::Fail);
        assert_eq!(verdict.reason, "Guard failed: missing");
    }

    #[test]
    fn present_artifacts_skip_before_guards_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.txt"), b"x").unwrap();
        let verdict = evaluate_node(&node(&["missing"], &["out.txt"]), dir.path());
        assert_eq!(verdict.result, GuardResult::Skip);
    }

    #[test]
    fn absent_artifacts_fall_through_to_guards() {
        let dir = tempfile::tempdir().unwrap();
        let verdict = evaluate_node(&node(&["missing"], &["out.txt"]), dir.path());
        assert_eq!(verdict.result, GuardResult::Fail);
    }
}
