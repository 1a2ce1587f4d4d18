//! `compose_plan`: selection, layering, and run-directory materialization
//! (§4.8).

use serde::{Deserialize, Serialize};

use gotn_graph_store::GraphStore;
use gotn_runs::RunDirectory;
use gotn_schema::{GotnError, Result};

use crate::layering::layer;
use crate::selection::{select_nodes, soft_weights};

/// The criteria a plan was composed from, echoed into `plan.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanCriteria {
    /// Free-text goal, recorded but not used for selection.
    pub goal: Option<String>,
    /// `requires` tag filter.
    pub requires: Vec<String>,
    /// `produces` tag filter.
    pub produces: Vec<String>,
}

/// The persisted contents of `plan.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    /// When this plan was composed, RFC 3339.
    pub created_at: String,
    /// Flattened layer order.
    pub ordered_ids: Vec<String>,
    /// Layers in dependency order; each inner list shares a layer.
    pub layers: Vec<Vec<String>>,
    /// Human-readable description of the composition.
    pub reason: String,
    /// The selection criteria this plan was composed from.
    pub criteria: PlanCriteria,
}

/// Result of composing a plan: the record plus where it was materialized.
#[derive(Debug, Clone)]
pub struct ComposedPlan {
    /// The plan itself.
    pub record: PlanRecord,
    /// The run directory `plan.json` and `steps.jsonl` were written into.
    pub run_dir: std::path::PathBuf,
}

fn sanitize_run_id(now: &str) -> String {
    now.replace([':', '.'], "-")
}

/// Compose a plan over `graph_store`'s current graph and materialize a
/// run directory for it.
pub async fn compose_plan(
    graph_store: &GraphStore,
    goal: Option<String>,
    requires: Vec<String>,
    produces: Vec<String>,
    now: &str,
) -> Result<ComposedPlan> {
    let graph = graph_store.read_graph().await?;
    let selected = select_nodes(&graph, &requires, &produces);
    if selected.is_empty() {
        return Err(GotnError::NoSelection);
    }
    let selected_ids: Vec<String> = selected.iter().map(|n| n.id.clone()).collect();

    let weights = soft_weights(&graph, &selected_ids);
    let layers = layer(&graph, &selected_ids, &weights)?;
    let ordered_ids: Vec<String> = layers.iter().flatten().cloned().collect();

    let hard_edge_count = graph
        .edges
        .iter()
        .filter(|e| e.edge_type == gotn_schema::EdgeType::HardRequires)
        .filter(|e| selected_ids.contains(&e.src) && selected_ids.contains(&e.dst))
        .count();

    let reason = format!(
        "selected {} node(s) into {} layer(s) across {hard_edge_count} hard_requires edge(s); \
         ties within a layer broken by soft-weight descending, then id ascending",
        ordered_ids.len(),
        layers.len(),
    );

    let record = PlanRecord {
        created_at: now.to_string(),
        ordered_ids,
        layers,
        reason,
        criteria: PlanCriteria {
            goal,
            requires,
            produces,
        },
    };

    let run_id = sanitize_run_id(now);
    let run = RunDirectory::create(graph_store.layout(), &run_id).map_err(GotnError::Io)?;
    let plan_bytes = serde_json::to_vec_pretty(&record)?;
    gotn_atomicfile::atomic_write(&run.plan_path(), &plan_bytes).map_err(GotnError::Io)?;
    gotn_atomicfile::atomic_write(&run.steps_path(), b"").map_err(GotnError::Io)?;

    Ok(ComposedPlan {
        record,
        run_dir: run.root().to_path_buf(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, Node, NodeStatus, Provenance};

    fn provenance() -> Provenance {
        Provenance {
            created_by: "test".to_string(),
            source: "test".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            kind: "micro_prompt".to_string(),
            summary: id.to_string(),
            prompt_text: "do it".to_string(),
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
            provenance: provenance(),
        }
    }

    #[tokio::test]
    async fn compose_plan_materializes_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.unwrap();
        store
            .add_node(node("a"), "2026-01-01T00:00:00Z")
            .await
            .unwrap();

        let plan = compose_plan(&store, None, vec![], vec![], "2026-01-01T00:01:00Z")
            .await
            .unwrap();

        assert_eq!(plan.record.ordered_ids, vec!["a".to_string()]);
        assert!(plan.run_dir.join("plan.json").is_file());
        assert!(plan.run_dir.join("steps.jsonl").is_file());
    }

    #[tokio::test]
    async fn empty_selection_is_no_selection_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.unwrap();

        let err = compose_plan(&store, None, vec![], vec![], "2026-01-01T00:01:00Z")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NoSelection");
    }
}
