//! Journal replay: rebuild a [`Graph`] from scratch by folding every entry
//! in order, last-write-wins, skipping and counting anything that fails to
//! parse or fails schema validation (§4.3 / §8).

use gotn_schema::{validate_edge, validate_node, Edge, EdgeType, Graph, JournalEntry, JournalEvent};

/// One run's lifecycle as reconstructed from `start_run`/`finish_run` entries.
/// The full [`gotn_schema::Run`] document (goal, ordering reason) lives in
/// the run directory itself; this is only what the journal can tell us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedRun {
    /// The run's id.
    pub id: String,
    /// Node ids in planned order.
    pub nodes: Vec<String>,
    /// Latest known status: `"planned"` until a `finish_run` entry updates it.
    pub status: String,
}

/// A journal line that could not be used to rebuild the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptEntry {
    /// Zero-based line number within the journal file.
    pub offset: usize,
    /// Why the line was rejected.
    pub reason: String,
}

/// The result of folding every journal entry into a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayOutcome {
    /// The rebuilt node/edge set.
    pub graph: Graph,
    /// Runs seen via `start_run`/`finish_run` entries.
    pub runs: Vec<ReplayedRun>,
    /// Lines skipped because they were malformed or failed validation.
    pub corrupt_entries: Vec<CorruptEntry>,
    /// Edges dropped at the end of replay because an endpoint never resolved
    /// (invariant 2) — distinct from `corrupt_entries` because the edge
    /// entry itself parsed and validated fine in isolation.
    pub dropped_edges: Vec<Edge>,
    /// `true` if a `workspace_initialized` entry was seen.
    pub workspace_initialized: bool,
    /// Count of entries successfully parsed and applied (every variant,
    /// including the non-mutating control events). Used to derive the
    /// recovered snapshot's `version` (§4.3: `max(1, entries_replayed)`).
    pub entries_applied: usize,
}

/// Fold raw NDJSON lines (as produced by reading the journal file) into a
/// [`ReplayOutcome`]. Blank lines are skipped silently; every other line is
/// either a valid entry or a [`CorruptEntry`].
pub fn replay_lines<'a>(lines: impl Iterator<Item = &'a str>) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();

    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_and_validate(line) {
            Ok(entry) => {
                apply_entry(&mut outcome, entry);
                outcome.entries_applied += 1;
            }
            Err(reason) => outcome.corrupt_entries.push(CorruptEntry { offset, reason }),
        }
    }

    finalize(&mut outcome);
    outcome
}

fn parse_and_validate(line: &str) -> Result<JournalEntry, String> {
    let entry: JournalEntry =
        serde_json::from_str(line).map_err(|e| format!("malformed json: {e}"))?;
    match &entry.event {
        JournalEvent::AddNode { node } | JournalEvent::UpdateNode { node } => {
            validate_node(node).map_err(|e| format!("node failed validation: {e}"))?;
        }
        JournalEvent::AddEdge { edge } | JournalEvent::UpdateEdge { edge } => {
            validate_edge(edge).map_err(|e| format!("edge failed validation: {e}"))?;
        }
        JournalEvent::WorkspaceInitialized { .. }
        | JournalEvent::StartRun { .. }
        | JournalEvent::FinishRun { .. } => {}
    }
    Ok(entry)
}

fn apply_entry(outcome: &mut ReplayOutcome, entry: JournalEntry) {
    match entry.event {
        JournalEvent::WorkspaceInitialized { .. } => {
            outcome.workspace_initialized = true;
        }
        JournalEvent::AddNode { node } | JournalEvent::UpdateNode { node } => {
            upsert_node(&mut outcome.graph, node);
        }
        JournalEvent::AddEdge { edge } | JournalEvent::UpdateEdge { edge } => {
            upsert_edge(&mut outcome.graph, edge);
        }
        JournalEvent::StartRun { run_id, nodes } => {
            outcome.runs.retain(|r| r.id != run_id);
            outcome.runs.push(ReplayedRun {
                id: run_id,
                nodes,
                status: "planned".to_string(),
            });
        }
        JournalEvent::FinishRun { run_id, status } => {
            if let Some(run) = outcome.runs.iter_mut().find(|r| r.id == run_id) {
                run.status = status;
            }
        }
    }
}

fn upsert_node(graph: &mut Graph, node: gotn_schema::Node) {
    if let Some(existing) = graph.node_mut(&node.id) {
        *existing = node;
    } else {
        graph.nodes.push(node);
    }
}

fn upsert_edge(graph: &mut Graph, edge: Edge) {
    let (src, dst, edge_type) = edge.identity();
    if let Some(existing) = graph
        .edges
        .iter_mut()
        .find(|e| e.src == src && e.dst == dst && e.edge_type == edge_type)
    {
        *existing = edge;
    } else {
        graph.edges.push(edge);
    }
}

fn finalize(outcome: &mut ReplayOutcome) {
    let graph = &mut outcome.graph;
    let (resolvable, dangling): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut graph.edges)
        .into_iter()
        .partition(|e| graph.has_node(&e.src) && graph.has_node(&e.dst));
    graph.edges = resolvable;
    outcome.dropped_edges = dangling;
}

/// `true` for edge types that establish an execution dependency, used by
/// callers deciding whether a dropped edge affects plan correctness.
pub fn is_execution_edge(edge_type: EdgeType) -> bool {
    matches!(edge_type, EdgeType::HardRequires)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use gotn_schema::{Artifacts, NodeStatus, Provenance};

    fn base_node(id: &str) -> gotn_schema::Node {
        gotn_schema::Node {
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
            provenance: Provenance {
                created_by: "test".into(),
                source: "test".into(),
                created_at: None,
                updated_at: None,
            },
        }
    }

    fn node_line(id: &str) -> String {
        let entry = JournalEntry::new(
            "2026-01-01T00:00:00Z",
            JournalEvent::AddNode { node: base_node(id) },
        );
        serde_json::to_string(&entry).expect("serialize")
    }

    #[test]
    fn replays_single_node() {
        let line = node_line("n1");
        let outcome = replay_lines(std::iter::once(line.as_str()));
        assert_eq!(outcome.graph.nodes.len(), 1);
        assert!(outcome.corrupt_entries.is_empty());
    }

    #[test]
    fn last_write_wins_for_updated_node() {
        let mut node1 = base_node("n1");
        node1.summary = "first summary".into();
        let entry1 = JournalEntry::new("2026-01-01T00:00:00Z", JournalEvent::AddNode { node: node1.clone() });
        let mut node2 = node1;
        node2.summary = "second summary".into();
        let entry2 = JournalEntry::new("2026-01-01T00:00:01Z", JournalEvent::UpdateNode { node: node2 });

        let lines = vec![
            serde_json::to_string(&entry1).expect("ser"),
            serde_json::to_string(&entry2).expect("ser"),
        ];
        let outcome = replay_lines(lines.iter().map(std::string::String::as_str));
        assert_eq!(outcome.graph.nodes.len(), 1);
        assert_eq!(outcome.graph.node("n1").expect("node").summary, "second summary");
    }

    #[test]
    fn malformed_line_is_skipped_and_counted() {
        let lines = vec!["not json at all".to_string(), node_line("n1")];
        let outcome = replay_lines(lines.iter().map(std::string::String::as_str));
        assert_eq!(outcome.graph.nodes.len(), 1);
        assert_eq!(outcome.corrupt_entries.len(), 1);
        assert_eq!(outcome.corrupt_entries[0].offset, 0);
    }

    #[test]
    fn dangling_edge_is_dropped_at_finalize() {
        let edge = Edge {
            src: "missing-src".into(),
            dst: "missing-dst".into(),
            edge_type: EdgeType::HardRequires,
            score: None,
            evidence: None,
            provenance: Provenance {
                created_by: "test".into(),
                source: "test".into(),
                created_at: None,
                updated_at: None,
            },
            version: 1,
        };
        let entry = JournalEntry::new("2026-01-01T00:00:00Z", JournalEvent::AddEdge { edge });
        let line = serde_json::to_string(&entry).expect("ser");
        let outcome = replay_lines(std::iter::once(line.as_str()));
        assert!(outcome.graph.edges.is_empty());
        assert_eq!(outcome.dropped_edges.len(), 1);
    }

    #[test]
    fn start_and_finish_run_tracked() {
        let start = JournalEntry::new(
            "2026-01-01T00:00:00Z",
            JournalEvent::StartRun {
                run_id: "run-1".into(),
                nodes: vec!["n1".into()],
            },
        );
        let finish = JournalEntry::new(
            "2026-01-01T00:00:01Z",
            JournalEvent::FinishRun {
                run_id: "run-1".into(),
                status: "completed".into(),
            },
        );
        let lines = vec![
            serde_json::to_string(&start).expect("ser"),
            serde_json::to_string(&finish).expect("ser"),
        ];
        let outcome = replay_lines(lines.iter().map(std::string::String::as_str));
        assert_eq!(outcome.runs.len(), 1);
        assert_eq!(outcome.runs[0].status, "completed");
    }
}
