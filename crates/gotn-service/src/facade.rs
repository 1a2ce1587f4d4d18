//! `ServiceFacade`: the ten named operations, each a JSON-object-in,
//! JSON-object-out tool call (§4.10, §6).

use std::collections::HashMap;
use std::sync::Arc;

use gotn_edges::{EdgeEngine, SoftInferenceConfig};
use gotn_embedder::Embedder;
use gotn_graph_store::GraphStore;
use gotn_guards::GuardResult;
use gotn_planner::compose_plan as run_compose_plan;
use gotn_schema::{
    new_internal_id, Artifacts, EdgeType, EmbeddingRef, GotnError, Graph, Node, NodeStatus,
    Provenance, Result,
};
use gotn_vector::{InMemoryVectorStore, RemoteConfig, RemoteVectorStore, VectorStore};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::breakdown::{BreakdownMode, BreakdownProvider};
use crate::config::Config;
use crate::envelope::envelope;
use crate::metrics::Metrics;

struct NoopEmbedder;

#[async_trait::async_trait]
impl Embedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(GotnError::VectorBackendUnavailable(
            "no embedder configured".to_string(),
        ))
    }

    fn dim(&self) -> usize {
        0
    }
}

/// Caller-supplied fields for `store_node`; the facade fills in id
/// defaults, timestamps, version, and provenance.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeInput {
    /// Caller-supplied id. Generated if absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Classification tag.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// One-line summary.
    pub summary: String,
    /// Full prompt text.
    pub prompt_text: String,
    /// Parent node id in the decomposition tree, if any.
    #[serde(default)]
    pub parent: Option<String>,
    /// Tags this node consumes.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Tags this node emits.
    #[serde(default)]
    pub produces: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Acceptance criteria.
    #[serde(default)]
    pub success_criteria: Vec<String>,
    /// Guard expressions.
    #[serde(default)]
    pub guards: Vec<String>,
    /// Expected output artifacts.
    #[serde(default)]
    pub artifacts: Artifacts,
}

fn default_kind() -> String {
    "micro_prompt".to_string()
}

/// The running service façade: owns configuration, metrics, the vector
/// and embedding clients, and a per-workspace cache of graph stores.
pub struct ServiceFacade {
    config: Config,
    metrics: Arc<Metrics>,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    breakdown_provider: Arc<dyn BreakdownProvider>,
    stores: Mutex<HashMap<String, Arc<GraphStore>>>,
}

impl ServiceFacade {
    /// Build a façade from `config`, wiring the vector backend selected by
    /// [`Config::has_remote_vector_backend`] and the given breakdown
    /// provider. Performs no I/O.
    pub fn new(config: Config, breakdown_provider: Arc<dyn BreakdownProvider>) -> Result<Self> {
        let vector_store: Arc<dyn VectorStore> = if config.has_remote_vector_backend() {
            let endpoint = config
                .remote_vector_endpoint
                .clone()
                .unwrap_or_default();
            let token = config.remote_vector_token.clone().unwrap_or_default();
            Arc::new(RemoteVectorStore::new(RemoteConfig {
                endpoint,
                token,
                collection: "gotn".to_string(),
                dim: config.embed_dim,
            })?)
        } else {
            Arc::new(InMemoryVectorStore::new())
        };

        let embedder: Arc<dyn Embedder> = match (&config.embedder_endpoint, &config.embedder_api_key)
        {
            (Some(endpoint), Some(api_key)) => Arc::new(gotn_embedder::HttpEmbedder::new(
                endpoint.clone(),
                api_key.clone(),
                "default".to_string(),
                config.embed_dim,
            )),
            _ => Arc::new(NoopEmbedder),
        };

        Ok(Self {
            config,
            metrics: Arc::new(Metrics::new()),
            vector_store,
            embedder,
            breakdown_provider,
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// Metrics, shared by reference for an external reporting sink.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    async fn store_for(&self, workspace_path: Option<&str>) -> Arc<GraphStore> {
        let path = workspace_path
            .map(str::to_string)
            .unwrap_or_else(|| self.config.workspace_path.clone());
        let mut stores = self.stores.lock().await;
        stores
            .entry(path.clone())
            .or_insert_with(|| Arc::new(GraphStore::new(&path)))
            .clone()
    }

    fn edge_engine(&self, graph_store: Arc<GraphStore>) -> EdgeEngine {
        EdgeEngine::new(graph_store, Arc::clone(&self.embedder), Arc::clone(&self.vector_store))
            .with_config(SoftInferenceConfig {
                k: self.config.soft_k,
                threshold: self.config.soft_threshold,
            })
    }

    /// Read the current graph for `workspace_path` (or the configured
    /// default). The external graph-read HTTP endpoint is built on top of
    /// this.
    pub async fn read_graph(&self, workspace_path: Option<&str>) -> Result<Graph> {
        let store = self.store_for(workspace_path).await;
        store.read_graph().await
    }

    /// `init_workspace`.
    pub async fn init_workspace(&self, workspace_path: Option<&str>, now: &str) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = store.init_workspace(now).await.map(|graph| {
            serde_json::json!({
                "nodes": graph.nodes.len(),
                "edges": graph.edges.len(),
                "structure_created": true,
            })
        });
        envelope("init_workspace", now, result)
    }

    /// `store_node`.
    pub async fn store_node(
        &self,
        input: NodeInput,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = self.store_node_inner(&store, input, now).await;
        envelope("store_node", now, result)
    }

    async fn store_node_inner(
        &self,
        store: &GraphStore,
        input: NodeInput,
        now: &str,
    ) -> Result<serde_json::Value> {
        let id = input.id.unwrap_or_else(new_internal_id);
        let node = Node {
            id: id.clone(),
            kind: input.kind,
            summary: input.summary,
            prompt_text: input.prompt_text,
            parent: input.parent,
            children: vec![],
            requires: input.requires,
            produces: input.produces,
            exec_target: None,
            tags: input.tags,
            success_criteria: input.success_criteria,
            guards: input.guards,
            artifacts: input.artifacts,
            status: NodeStatus::Ready,
            version: 1,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            embedding_ref: None,
            provenance: Provenance {
                created_by: "service".to_string(),
                source: "store_node".to_string(),
                created_at: Some(now.to_string()),
                updated_at: Some(now.to_string()),
            },
        };
        let stored = store.add_node(node, now).await?;
        self.metrics.record_nodes_stored(1);

        let embedding_created = self.try_embed_and_upsert(store, &stored, now).await;

        Ok(serde_json::json!({
            "node_id": stored.id,
            "embedding_created": embedding_created,
        }))
    }

    async fn try_embed_and_upsert(&self, store: &GraphStore, node: &Node, now: &str) -> bool {
        let text = node.embedding_text();
        let vector = match self.embedder.embed(&text).await {
            Ok(v) => v,
            Err(error) => {
                tracing::warn!(node = %node.id, %error, "embedding skipped for node");
                return false;
            }
        };
        if let Err(error) = self
            .vector_store
            .upsert(&node.id, &vector, Some(&self.config.project_id))
            .await
        {
            tracing::warn!(node = %node.id, %error, "vector upsert failed");
            return false;
        }

        let mut updated = node.clone();
        updated.embedding_ref = Some(EmbeddingRef {
            collection: self.config.project_id.clone(),
            id: node.id.clone(),
        });
        updated.updated_at = now.to_string();
        updated.version += 1;
        match store.update_node(updated, now).await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(node = %node.id, %error, "failed to persist embedding_ref");
                false
            }
        }
    }

    /// `infer_edges`.
    pub async fn infer_edges(
        &self,
        node_ids: Option<Vec<String>>,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = self.infer_edges_inner(store, node_ids, now).await;
        envelope("infer_edges", now, result)
    }

    async fn infer_edges_inner(
        &self,
        store: Arc<GraphStore>,
        node_ids: Option<Vec<String>>,
        now: &str,
    ) -> Result<serde_json::Value> {
        let graph = store.read_graph().await?;
        let nodes: Vec<Node> = match node_ids {
            Some(ids) => graph
                .nodes
                .iter()
                .filter(|n| ids.contains(&n.id))
                .cloned()
                .collect(),
            None => graph.nodes.clone(),
        };

        let engine = self.edge_engine(store);
        let report = engine.run(&nodes, Some(&self.config.project_id), now).await?;
        self.metrics
            .record_edges_inferred(report.hard_created as u64, report.soft_created as u64);

        let summaries: Vec<String> = report
            .new_hard_edges
            .iter()
            .chain(report.new_soft_edges.iter())
            .map(|e| {
                format!(
                    "{} -> {} ({:?}{})",
                    e.src,
                    e.dst,
                    e.edge_type,
                    e.score.map(|s| format!(", score={s:.2}")).unwrap_or_default()
                )
            })
            .collect();

        Ok(serde_json::json!({
            "hard_count": report.hard_created,
            "soft_count": report.soft_created,
            "commit_failures": report.commit_failures,
            "summaries": summaries,
        }))
    }

    /// `breakdown_prompt`.
    #[allow(clippy::too_many_arguments)]
    pub async fn breakdown_prompt(
        &self,
        project_id: &str,
        prompt: &str,
        mode: BreakdownMode,
        max_nodes: usize,
        compose: bool,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = self
            .breakdown_prompt_inner(store, project_id, prompt, mode, max_nodes, compose, now)
            .await;
        envelope("breakdown_prompt", now, result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn breakdown_prompt_inner(
        &self,
        store: Arc<GraphStore>,
        project_id: &str,
        prompt: &str,
        mode: BreakdownMode,
        max_nodes: usize,
        compose: bool,
        now: &str,
    ) -> Result<serde_json::Value> {
        let mut response = self
            .breakdown_provider
            .breakdown(project_id, prompt, mode, max_nodes)
            .await?;
        response.nodes.truncate(max_nodes);

        let created_ids: Vec<String> = response.nodes.iter().map(|_| new_internal_id()).collect();

        let mut created_edge_count = 0usize;
        for (index, proposed) in response.nodes.iter().enumerate() {
            let parent_id = match (mode, proposed.parent_index) {
                (BreakdownMode::Tree, Some(parent_index)) => {
                    created_ids.get(parent_index).cloned()
                }
                _ => None,
            };
            let node = Node {
                id: created_ids[index].clone(),
                kind: proposed.kind.clone(),
                summary: proposed.summary.clone(),
                prompt_text: proposed.prompt_text.clone(),
                parent: parent_id.clone(),
                children: vec![],
                requires: proposed.requires.clone(),
                produces: proposed.produces.clone(),
                exec_target: None,
                tags: proposed.tags.clone(),
                success_criteria: vec![],
                guards: vec![],
                artifacts: Artifacts::default(),
                status: NodeStatus::Ready,
                version: 1,
                created_at: now.to_string(),
                updated_at: now.to_string(),
                embedding_ref: None,
                provenance: Provenance {
                    created_by: "breakdown".to_string(),
                    source: prompt.to_string(),
                    created_at: Some(now.to_string()),
                    updated_at: Some(now.to_string()),
                },
            };
            store.add_node(node, now).await?;
            self.metrics.record_nodes_stored(1);
        }

        for (index, proposed) in response.nodes.iter().enumerate() {
            if let (BreakdownMode::Tree, Some(parent_index)) = (mode, proposed.parent_index) {
                if let Some(parent_id) = created_ids.get(parent_index).cloned() {
                    let child_id = created_ids[index].clone();
                    let edge = gotn_schema::Edge {
                        src: child_id,
                        dst: parent_id,
                        edge_type: EdgeType::DerivedFrom,
                        score: None,
                        evidence: Some("derived from prompt breakdown".to_string()),
                        provenance: Provenance {
                            created_by: "breakdown".to_string(),
                            source: "breakdown_prompt".to_string(),
                            created_at: Some(now.to_string()),
                            updated_at: Some(now.to_string()),
                        },
                        version: 1,
                    };
                    if store.add_edge(edge, now).await.is_ok() {
                        created_edge_count += 1;
                    }
                }
            }
        }

        let root_id = response
            .root_index
            .and_then(|index| created_ids.get(index).cloned());

        let plan = if compose {
            let composed = run_compose_plan(&store, Some(prompt.to_string()), vec![], vec![], now)
                .await?;
            self.metrics.record_plan_composed();
            Some(composed.record)
        } else {
            None
        };

        Ok(serde_json::json!({
            "created_node_ids": created_ids,
            "created_edge_count": created_edge_count,
            "root_id": root_id,
            "plan": plan,
        }))
    }

    /// `compose_plan`.
    pub async fn compose_plan(
        &self,
        goal: Option<String>,
        requires: Vec<String>,
        produces: Vec<String>,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = self
            .compose_plan_inner(store, goal, requires, produces, now)
            .await;
        envelope("compose_plan", now, result)
    }

    async fn compose_plan_inner(
        &self,
        store: Arc<GraphStore>,
        goal: Option<String>,
        requires: Vec<String>,
        produces: Vec<String>,
        now: &str,
    ) -> Result<serde_json::Value> {
        let composed = run_compose_plan(&store, goal, requires, produces, now).await?;
        self.metrics.record_plan_composed();

        let run_id = composed
            .run_dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run-"))
            .unwrap_or("unknown")
            .to_string();
        store
            .start_run(&run_id, composed.record.ordered_ids.clone(), now)
            .await?;

        Ok(serde_json::json!({
            "ordered_node_ids": composed.record.ordered_ids,
            "layers": composed.record.layers,
            "run_folder": composed.run_dir.display().to_string(),
            "reason": composed.record.reason,
        }))
    }

    /// `execute_node`.
    pub async fn execute_node(
        &self,
        node_id: &str,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let workspace_root = store.layout().gotn_dir().parent().map_or_else(
            || std::path::PathBuf::from("."),
            std::path::Path::to_path_buf,
        );
        let result = gotn_runs::execute_node(&store, &workspace_root, node_id, now).await;
        if let Ok(outcome) = &result {
            match outcome.result {
                GuardResult::Fail => self.metrics.record_guard_failure(),
                GuardResult::Skip => self.metrics.record_skip(),
                GuardResult::Proceed => {}
            }
        }
        let result = result.map(|outcome| {
            serde_json::json!({
                "action": match outcome.result {
                    GuardResult::Proceed => "proceed",
                    GuardResult::Skip => "skip",
                    GuardResult::Fail => "fail",
                },
                "reason": outcome.reason,
                "patch_path": outcome.patch_path.map(|p| p.display().to_string()),
            })
        });
        envelope("execute_node", now, result)
    }

    /// `trace_node`.
    pub async fn trace_node(
        &self,
        node_id: &str,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = self.trace_node_inner(&store, node_id).await;
        envelope("trace_node", now, result)
    }

    async fn trace_node_inner(&self, store: &GraphStore, node_id: &str) -> Result<serde_json::Value> {
        let graph = store.read_graph().await?;
        let node = graph
            .node(node_id)
            .ok_or_else(|| GotnError::NotFound(format!("node {node_id} not found")))?;

        let incoming: Vec<_> = graph.edges_to(node_id).map(edge_summary).collect();
        let outgoing: Vec<_> = graph.edges_from(node_id).map(edge_summary).collect();
        let mut proof_set = incoming.clone();
        proof_set.extend(outgoing.clone());

        Ok(serde_json::json!({
            "parents": node.parent.clone().into_iter().collect::<Vec<_>>(),
            "children": node.children,
            "requires": node.requires,
            "produces": node.produces,
            "incoming": incoming,
            "outgoing": outgoing,
            "proof_set": proof_set,
        }))
    }

    /// `search_nodes`.
    pub async fn search_nodes(
        &self,
        query: &str,
        limit: Option<usize>,
        workspace_path: Option<&str>,
        now: &str,
    ) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = self.search_nodes_inner(&store, query, limit).await;
        envelope("search_nodes", now, result)
    }

    async fn search_nodes_inner(
        &self,
        store: &GraphStore,
        query: &str,
        limit: Option<usize>,
    ) -> Result<serde_json::Value> {
        let vector = self.embedder.embed(query).await?;
        let matches = self
            .vector_store
            .search(&vector, limit.unwrap_or(10), Some(&self.config.project_id))
            .await?;
        let graph = store.read_graph().await?;

        let results: Vec<serde_json::Value> = matches
            .into_iter()
            .map(|m| {
                let summary = graph.node(&m.id).map(|n| n.summary.clone());
                serde_json::json!({
                    "id": m.id,
                    "summary": summary,
                    "score": m.score,
                })
            })
            .collect();

        Ok(serde_json::json!({ "results": results }))
    }

    /// `debug`.
    pub async fn debug(&self, now: &str) -> serde_json::Value {
        let snapshot = self.metrics.snapshot();
        envelope::<serde_json::Value>(
            "debug",
            now,
            Ok(serde_json::json!({ "metrics": snapshot })),
        )
    }

    /// `recover`.
    pub async fn recover(&self, workspace_path: Option<&str>, now: &str) -> serde_json::Value {
        let store = self.store_for(workspace_path).await;
        let result = store.recover_from_journal(now).await;
        if result.is_ok() {
            self.metrics.record_recovery();
        }
        let result = result.map(|report| {
            serde_json::json!({
                "nodes_recovered": report.nodes_recovered,
                "edges_recovered": report.edges_recovered,
                "skipped_entries": report.skipped_entries,
                "integrity": {
                    "total_edges": report.integrity.total_edges,
                    "resolvable_edges": report.integrity.resolvable_edges,
                },
            })
        });
        envelope("recover", now, result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct EdgeSummary {
    src: String,
    dst: String,
    edge_type: EdgeType,
    score: Option<f64>,
    evidence: Option<String>,
}

fn edge_summary(edge: &gotn_schema::Edge) -> EdgeSummary {
    EdgeSummary {
        src: edge.src.clone(),
        dst: edge.dst.clone(),
        edge_type: edge.edge_type,
        score: edge.score,
        evidence: edge.evidence.clone(),
    }
}

