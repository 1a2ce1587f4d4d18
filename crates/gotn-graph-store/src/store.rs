//! [`GraphStore`]: the single-writer-per-workspace façade over the graph
//! snapshot and journal (§4.2–§4.4).

use gotn_atomicfile::KeyedLocks;
use gotn_journal::Journal;
use gotn_schema::{validate_edge, validate_node, Edge, GotnError, Graph, JournalEntry, JournalEvent, Meta, Node, Result};

use crate::paths::WorkspaceLayout;

/// Edge-resolvability summary returned by [`GraphStore::recover_from_journal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Integrity {
    /// Total edges in the recovered snapshot.
    pub total_edges: usize,
    /// Edges among those whose endpoints both resolve to a node.
    pub resolvable_edges: usize,
}

/// Outcome of a recovery pass (§6, the `recover` operation).
#[derive(Debug, Clone)]
pub struct RecoverReport {
    /// The recovered graph, already persisted as the new snapshot.
    pub graph: Graph,
    /// Node count in the recovered graph.
    pub nodes_recovered: usize,
    /// Edge count in the recovered graph (after dropping unresolved edges).
    pub edges_recovered: usize,
    /// Count of journal lines skipped as malformed or invalid.
    pub skipped_entries: usize,
    /// Edge-resolvability integrity report.
    pub integrity: Integrity,
}

/// The workspace-scoped graph store: owns the snapshot file, the journal,
/// and the per-key lock table that serializes writers.
pub struct GraphStore {
    layout: WorkspaceLayout,
    journal: Journal,
    locks: KeyedLocks,
}

impl GraphStore {
    /// Open a store over `workspace_path`. Performs no I/O; call
    /// [`GraphStore::init_workspace`] or [`GraphStore::is_initialized`] to
    /// interact with the filesystem.
    pub fn new(workspace_path: impl AsRef<std::path::Path>) -> Self {
        let layout = WorkspaceLayout::new(workspace_path);
        let journal = Journal::new(layout.journal_path());
        Self {
            layout,
            journal,
            locks: KeyedLocks::new(),
        }
    }

    /// The resolved `.gotn/` layout for this store.
    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    fn graph_lock_key(&self) -> String {
        format!("graph:{}", self.layout.gotn_dir().display())
    }

    /// `true` if `.gotn/meta.json` exists.
    pub fn is_initialized(&self) -> bool {
        self.layout.meta_path().is_file()
    }

    /// Create the `.gotn/` directory structure, an empty graph snapshot, and
    /// `meta.json`. Idempotent: calling this on an already-initialized
    /// workspace just returns the existing graph.
    pub async fn init_workspace(&self, now: &str) -> Result<Graph> {
        let _guard = self.locks.lock(&self.graph_lock_key()).await;

        if self.is_initialized() {
            return self.read_graph_unlocked();
        }

        std::fs::create_dir_all(self.layout.gotn_dir()).map_err(GotnError::Io)?;
        std::fs::create_dir_all(self.layout.runs_dir()).map_err(GotnError::Io)?;
        std::fs::create_dir_all(self.layout.cache_dir()).map_err(GotnError::Io)?;
        std::fs::create_dir_all(self.layout.locks_dir()).map_err(GotnError::Io)?;

        let meta = Meta::new(
            self.layout
                .gotn_dir()
                .parent()
                .unwrap_or(self.layout.gotn_dir())
                .display()
                .to_string(),
            now,
        );
        write_json(&self.layout.meta_path(), &meta)?;

        let empty_graph = Graph {
            nodes: vec![],
            edges: vec![],
            version: 0,
            updated: now.to_string(),
        };
        write_json(&self.layout.graph_path(), &empty_graph)?;

        let entry = JournalEntry::new(
            now,
            JournalEvent::WorkspaceInitialized {
                workspace_path: meta.workspace_path.clone(),
            },
        );
        self.journal.append(&entry).await?;

        Ok(empty_graph)
    }

    /// Read the current graph snapshot. If the snapshot is missing or fails
    /// to parse, falls back to replaying the journal and persisting the
    /// result (§7: `CorruptSnapshot` triggers recovery).
    pub async fn read_graph(&self) -> Result<Graph> {
        let _guard = self.locks.lock(&self.graph_lock_key()).await;
        self.read_graph_unlocked()
    }

    fn read_graph_unlocked(&self) -> Result<Graph> {
        match std::fs::read(self.layout.graph_path()) {
            Ok(bytes) => match serde_json::from_slice::<Graph>(&bytes) {
                Ok(graph) => Ok(graph),
                Err(e) => {
                    tracing::warn!(error = %e, "graph snapshot corrupt, recovering from journal");
                    self.recover_unlocked("1970-01-01T00:00:00Z").map(|r| r.graph)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GotnError::NotFound("workspace not initialized".to_string()))
            }
            Err(e) => Err(GotnError::Io(e)),
        }
    }

    /// Persist `graph` as the new snapshot: bumps `version`, stamps
    /// `updated`, and writes atomically. Does not append a journal entry —
    /// callers that mutate the graph append the matching event themselves
    /// after this returns, inside the same lock guard.
    fn write_snapshot(&self, mut graph: Graph, now: &str, version: u64) -> Result<Graph> {
        graph.version = version;
        graph.updated = now.to_string();
        write_json(&self.layout.graph_path(), &graph)?;
        Ok(graph)
    }

    /// Insert a new node. Rejects a duplicate id (`Conflict`).
    pub async fn add_node(&self, node: Node, now: &str) -> Result<Node> {
        validate_node(&node)?;
        let _guard = self.locks.lock(&self.graph_lock_key()).await;

        let mut graph = self.read_graph_unlocked()?;
        if graph.has_node(&node.id) {
            return Err(GotnError::Conflict(format!(
                "node {} already exists",
                node.id
            )));
        }
        graph.nodes.push(node.clone());
        let next_version = graph.version + 1;
        self.write_snapshot(graph, now, next_version)?;

        let entry = JournalEntry::new(now, JournalEvent::AddNode { node: node.clone() });
        self.journal.append(&entry).await?;
        Ok(node)
    }

    /// Replace an existing node's fields in place. The node's `id` is the
    /// lookup key, so this can never change which node is being updated
    /// (rejecting id changes structurally rather than by explicit check).
    pub async fn update_node(&self, node: Node, now: &str) -> Result<Node> {
        validate_node(&node)?;
        let _guard = self.locks.lock(&self.graph_lock_key()).await;

        let mut graph = self.read_graph_unlocked()?;
        let existing = graph
            .node_mut(&node.id)
            .ok_or_else(|| GotnError::NotFound(format!("node {} not found", node.id)))?;
        *existing = node.clone();
        let next_version = graph.version + 1;
        self.write_snapshot(graph, now, next_version)?;

        let entry = JournalEntry::new(now, JournalEvent::UpdateNode { node: node.clone() });
        self.journal.append(&entry).await?;
        Ok(node)
    }

    /// Insert a new edge. Rejects a duplicate `(src, dst, type)` (`Conflict`)
    /// and an edge whose endpoints don't both resolve to existing nodes
    /// (`NotFound`), preserving invariant 2.
    pub async fn add_edge(&self, edge: Edge, now: &str) -> Result<Edge> {
        validate_edge(&edge)?;
        let _guard = self.locks.lock(&self.graph_lock_key()).await;

        let mut graph = self.read_graph_unlocked()?;
        if !graph.has_node(&edge.src) || !graph.has_node(&edge.dst) {
            return Err(GotnError::NotFound(
                "edge endpoint does not resolve to an existing node".to_string(),
            ));
        }
        let (src, dst, edge_type) = edge.identity();
        if graph.find_edge(&src, &dst, edge_type).is_some() {
            return Err(GotnError::Conflict(format!(
                "edge {src}->{dst} ({edge_type:?}) already exists"
            )));
        }
        graph.edges.push(edge.clone());
        let next_version = graph.version + 1;
        self.write_snapshot(graph, now, next_version)?;

        let entry = JournalEntry::new(now, JournalEvent::AddEdge { edge: edge.clone() });
        self.journal.append(&entry).await?;
        Ok(edge)
    }

    /// Replace an existing edge's mutable fields (`score`, `evidence`,
    /// `provenance`, `version`). The edge's `(src, dst, type)` identity is
    /// the lookup key, so endpoint changes are rejected structurally:
    /// supplying a new identity simply fails to find a match (`NotFound`).
    pub async fn update_edge(&self, edge: Edge, now: &str) -> Result<Edge> {
        validate_edge(&edge)?;
        let _guard = self.locks.lock(&self.graph_lock_key()).await;

        let mut graph = self.read_graph_unlocked()?;
        let (src, dst, edge_type) = edge.identity();
        let existing = graph
            .edges
            .iter_mut()
            .find(|e| e.src == src && e.dst == dst && e.edge_type == edge_type)
            .ok_or_else(|| GotnError::NotFound(format!("edge {src}->{dst} ({edge_type:?}) not found")))?;
        *existing = edge.clone();
        let next_version = graph.version + 1;
        self.write_snapshot(graph, now, next_version)?;

        let entry = JournalEntry::new(now, JournalEvent::UpdateEdge { edge: edge.clone() });
        self.journal.append(&entry).await?;
        Ok(edge)
    }

    /// Replay the journal from scratch and persist the result as the new
    /// snapshot (§6, the `recover` operation).
    pub async fn recover_from_journal(&self, now: &str) -> Result<RecoverReport> {
        let _guard = self.locks.lock(&self.graph_lock_key()).await;
        self.recover_unlocked(now)
    }

    fn recover_unlocked(&self, now: &str) -> Result<RecoverReport> {
        let outcome = self.journal.replay()?;
        let version = std::cmp::max(1, outcome.entries_applied as u64);
        let mut graph = outcome.graph;
        graph.version = version;
        graph.updated = now.to_string();
        write_json(&self.layout.graph_path(), &graph)?;

        let integrity = Integrity {
            total_edges: graph.edges.len() + outcome.dropped_edges.len(),
            resolvable_edges: graph.edges.len(),
        };
        Ok(RecoverReport {
            nodes_recovered: graph.nodes.len(),
            edges_recovered: graph.edges.len(),
            skipped_entries: outcome.corrupt_entries.len(),
            integrity,
            graph,
        })
    }

    /// Record that a plan was composed and a run directory created. Does
    /// not touch the graph snapshot; this is journal-only bookkeeping.
    pub async fn start_run(&self, run_id: &str, node_ids: Vec<String>, now: &str) -> Result<()> {
        let entry = JournalEntry::new(
            now,
            JournalEvent::StartRun {
                run_id: run_id.to_string(),
                nodes: node_ids,
            },
        );
        self.journal.append(&entry).await
    }

    /// Record that a run reached a terminal status.
    pub async fn finish_run(&self, run_id: &str, status: &str, now: &str) -> Result<()> {
        let entry = JournalEntry::new(
            now,
            JournalEvent::FinishRun {
                run_id: run_id.to_string(),
                status: status.to_string(),
            },
        );
        self.journal.append(&entry).await
    }
}

fn write_json<T: serde::Serialize>(path: &std::path::Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    gotn_atomicfile::atomic_write(path, &bytes).map_err(GotnError::Io)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, EdgeType, NodeStatus, Provenance};

    fn provenance() -> Provenance {
        Provenance {
            created_by: "test".into(),
            source: "test".into(),
            created_at: None,
            updated_at: None,
        }
    }

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            kind: "micro_prompt".into(),
            summary: "do a thing".into(),
            prompt_text: "please do a thing".into(),
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
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
            embedding_ref: None,
            provenance: provenance(),
        }
    }

    #[tokio::test]
    async fn init_workspace_creates_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        assert!(!store.is_initialized());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        assert!(store.is_initialized());
        assert!(store.layout().runs_dir().is_dir());
    }

    #[tokio::test]
    async fn init_workspace_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init 1");
        let second = store.init_workspace("2026-01-01T00:00:01Z").await.expect("init 2");
        assert_eq!(second.version, 0);
    }

    #[tokio::test]
    async fn add_node_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        store.add_node(node("n1"), "2026-01-01T00:00:01Z").await.expect("add");
        let graph = store.read_graph().await.expect("read");
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.version, 1);
    }

    #[tokio::test]
    async fn add_duplicate_node_is_conflict() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        store.add_node(node("n1"), "2026-01-01T00:00:01Z").await.expect("add");
        let err = store
            .add_node(node("n1"), "2026-01-01T00:00:02Z")
            .await
            .expect_err("should conflict");
        assert_eq!(err.kind(), "Conflict");
    }

    #[tokio::test]
    async fn add_edge_rejects_missing_endpoint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        store.add_node(node("n1"), "2026-01-01T00:00:01Z").await.expect("add n1");
        let edge = Edge {
            src: "n1".into(),
            dst: "missing".into(),
            edge_type: EdgeType::HardRequires,
            score: None,
            evidence: None,
            provenance: provenance(),
            version: 1,
        };
        let err = store
            .add_edge(edge, "2026-01-01T00:00:02Z")
            .await
            .expect_err("should fail");
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn add_edge_then_update_edge_preserves_identity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        store.add_node(node("n1"), "2026-01-01T00:00:01Z").await.expect("add n1");
        store.add_node(node("n2"), "2026-01-01T00:00:02Z").await.expect("add n2");
        let edge = Edge {
            src: "n1".into(),
            dst: "n2".into(),
            edge_type: EdgeType::SoftSemantic,
            score: Some(0.9),
            evidence: Some("similar".into()),
            provenance: provenance(),
            version: 1,
        };
        store.add_edge(edge.clone(), "2026-01-01T00:00:03Z").await.expect("add edge");

        let mut updated = edge;
        updated.score = Some(0.95);
        let result = store
            .update_edge(updated, "2026-01-01T00:00:04Z")
            .await
            .expect("update");
        assert_eq!(result.score, Some(0.95));
    }

    #[tokio::test]
    async fn recover_from_journal_rebuilds_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        store.add_node(node("n1"), "2026-01-01T00:00:01Z").await.expect("add");

        std::fs::write(store.layout().graph_path(), b"not valid json").expect("corrupt snapshot");

        let report = store
            .recover_from_journal("2026-01-01T00:00:02Z")
            .await
            .expect("recover");
        assert_eq!(report.nodes_recovered, 1);
        assert_eq!(report.skipped_entries, 0);
    }

    #[tokio::test]
    async fn read_graph_self_heals_on_corrupt_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        store.add_node(node("n1"), "2026-01-01T00:00:01Z").await.expect("add");
        std::fs::write(store.layout().graph_path(), b"not valid json").expect("corrupt snapshot");

        let graph = store.read_graph().await.expect("read should self-heal");
        assert_eq!(graph.nodes.len(), 1);
    }

    #[tokio::test]
    async fn start_and_finish_run_are_journaled_without_touching_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::new(dir.path());
        store.init_workspace("2026-01-01T00:00:00Z").await.expect("init");
        let before = store.read_graph().await.expect("read");

        store
            .start_run("run-1", vec!["n1".to_string()], "2026-01-01T00:01:00Z")
            .await
            .expect("start_run");
        store
            .finish_run("run-1", "completed", "2026-01-01T00:02:00Z")
            .await
            .expect("finish_run");

        let after = store.read_graph().await.expect("read");
        assert_eq!(before.version, after.version);

        let outcome = store.journal.replay().expect("replay");
        assert_eq!(outcome.runs.len(), 1);
        assert_eq!(outcome.runs[0].status, "completed");
    }
}
