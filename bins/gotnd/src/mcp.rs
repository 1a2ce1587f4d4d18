//! MCP Streamable-HTTP wiring: ten tool structs, one per service façade
//! operation, matched by name and translated into façade calls.

use std::sync::Arc;

use async_trait::async_trait;
use gotn_service::{BreakdownMode, ServiceFacade};
use rust_mcp_sdk::id_generator::{FastIdGenerator, UuidGenerator};
use rust_mcp_sdk::macros::{mcp_tool, JsonSchema};
use rust_mcp_sdk::mcp_http::{GenericBody, McpAppState, McpHttpHandler};
use rust_mcp_sdk::mcp_server::error::TransportServerError;
use rust_mcp_sdk::mcp_server::{ServerHandler, ToMcpServerHandler};
use rust_mcp_sdk::schema::{
    CallToolError, CallToolRequestParams, CallToolResult, Implementation, InitializeResult,
    ListToolsResult, PaginatedRequestParams, RpcError, ServerCapabilities, ServerCapabilitiesTools,
    LATEST_PROTOCOL_VERSION,
};
use rust_mcp_sdk::session_store::InMemorySessionStore;
use rust_mcp_sdk::{tool_box, TransportOptions};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio::net::TcpListener;
use tracing::info;

const MCP_ENDPOINT: &str = "/mcp";

fn now() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[mcp_tool(
    name = "init_workspace",
    description = "Create the .gotn/ directory structure for a workspace. Idempotent."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct InitWorkspaceTool {
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(
    name = "store_node",
    description = "Persist one micro-prompt node, embedding and upserting it into the vector store."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct StoreNodeTool {
    pub node: JsonValue,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(
    name = "infer_edges",
    description = "Run hard and soft edge inference over a node set, or the whole graph if none is given."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct InferEdgesTool {
    #[serde(default)]
    pub node_ids: Option<Vec<String>>,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(
    name = "breakdown_prompt",
    description = "Decompose a prompt into micro-prompt nodes via the configured breakdown provider."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct BreakdownPromptTool {
    pub project_id: String,
    pub prompt: String,
    #[serde(default = "default_mode")]
    pub mode: BreakdownMode,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default)]
    pub compose: bool,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

fn default_mode() -> BreakdownMode {
    BreakdownMode::Tree
}

fn default_max_nodes() -> usize {
    32
}

#[mcp_tool(
    name = "compose_plan",
    description = "Select, layer, and materialize a run directory for the nodes matching requires/produces tags."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ComposePlanTool {
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(
    name = "execute_node",
    description = "Evaluate guards for one node and write a patch stub or mark it skipped/failed."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ExecuteNodeTool {
    pub node_id: String,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(
    name = "trace_node",
    description = "Return one node's parents, children, requires/produces tags, and incident edges."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct TraceNodeTool {
    pub node_id: String,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(
    name = "search_nodes",
    description = "Embed a query and return the nearest nodes by cosine similarity."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchNodesTool {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

#[mcp_tool(name = "debug", description = "Return the process-scoped metrics snapshot.")]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DebugTool {}

#[mcp_tool(
    name = "recover",
    description = "Replay the journal from scratch and report recovered node/edge counts and integrity."
)]
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RecoverTool {
    #[serde(default)]
    pub workspace_path: Option<String>,
}

tool_box!(
    GotnTools,
    [
        InitWorkspaceTool,
        StoreNodeTool,
        InferEdgesTool,
        BreakdownPromptTool,
        ComposePlanTool,
        ExecuteNodeTool,
        TraceNodeTool,
        SearchNodesTool,
        DebugTool,
        RecoverTool
    ]
);

#[derive(Clone)]
struct GotnMcpHandler {
    facade: Arc<ServiceFacade>,
}

impl GotnMcpHandler {
    fn new(facade: Arc<ServiceFacade>) -> Self {
        Self { facade }
    }

    async fn dispatch_tool(
        &self,
        tool_name: &str,
        args: &JsonMap<String, JsonValue>,
    ) -> Result<JsonValue, String> {
        let now = now();
        let payload = JsonValue::Object(args.clone());
        match tool_name {
            "init_workspace" => {
                let tool: InitWorkspaceTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .init_workspace(tool.workspace_path.as_deref(), &now)
                    .await)
            }
            "store_node" => {
                let tool: StoreNodeTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                let node = serde_json::from_value(tool.node).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .store_node(node, tool.workspace_path.as_deref(), &now)
                    .await)
            }
            "infer_edges" => {
                let tool: InferEdgesTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .infer_edges(tool.node_ids, tool.workspace_path.as_deref(), &now)
                    .await)
            }
            "breakdown_prompt" => {
                let tool: BreakdownPromptTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .breakdown_prompt(
                        &tool.project_id,
                        &tool.prompt,
                        tool.mode,
                        tool.max_nodes,
                        tool.compose,
                        tool.workspace_path.as_deref(),
                        &now,
                    )
                    .await)
            }
            "compose_plan" => {
                let tool: ComposePlanTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .compose_plan(
                        tool.goal,
                        tool.requires,
                        tool.produces,
                        tool.workspace_path.as_deref(),
                        &now,
                    )
                    .await)
            }
            "execute_node" => {
                let tool: ExecuteNodeTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .execute_node(&tool.node_id, tool.workspace_path.as_deref(), &now)
                    .await)
            }
            "trace_node" => {
                let tool: TraceNodeTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .trace_node(&tool.node_id, tool.workspace_path.as_deref(), &now)
                    .await)
            }
            "search_nodes" => {
                let tool: SearchNodesTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .search_nodes(&tool.query, tool.limit, tool.workspace_path.as_deref(), &now)
                    .await)
            }
            "debug" => Ok(self.facade.debug(&now).await),
            "recover" => {
                let tool: RecoverTool =
                    serde_json::from_value(payload).map_err(|e| e.to_string())?;
                Ok(self
                    .facade
                    .recover(tool.workspace_path.as_deref(), &now)
                    .await)
            }
            other => Err(format!("unknown tool: {other}")),
        }
    }
}

#[async_trait]
impl ServerHandler for GotnMcpHandler {
    async fn handle_list_tools_request(
        &self,
        _params: Option<PaginatedRequestParams>,
        _runtime: Arc<dyn rust_mcp_sdk::McpServer>,
    ) -> Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: GotnTools::tools(),
            meta: None,
            next_cursor: None,
        })
    }

    async fn handle_call_tool_request(
        &self,
        params: CallToolRequestParams,
        _runtime: Arc<dyn rust_mcp_sdk::McpServer>,
    ) -> Result<CallToolResult, CallToolError> {
        let tool_name = params.name.clone();
        let args = params.arguments.unwrap_or_default();
        let response = match self.dispatch_tool(tool_name.as_str(), &args).await {
            Ok(value) => value.to_string(),
            Err(error) => format!("Error: {error}"),
        };
        Ok(CallToolResult::text_content(vec![response.into()]))
    }
}

fn server_details() -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: "gotnd".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: Some(
                "Durable graph substrate for prompt decomposition: store nodes, infer edges, \
                 compose plans, execute under guards."
                    .into(),
            ),
            title: Some("gotn MCP".into()),
            icons: vec![],
            website_url: Some("https://github.com/flyingrobots/gotn".into()),
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        protocol_version: LATEST_PROTOCOL_VERSION.into(),
        instructions: Some(
            "Call init_workspace once per workspace, then store_node/infer_edges/compose_plan/\
             execute_node to drive a run."
                .into(),
        ),
        meta: None,
    }
}

/// Serve the MCP Streamable-HTTP endpoint on `listener` until the process
/// is terminated.
pub async fn run_mcp_server(
    listener: TcpListener,
    facade: Arc<ServiceFacade>,
) -> Result<(), String> {
    let local_addr = listener
        .local_addr()
        .map_err(|error| format!("resolve mcp listener addr: {error}"))?;
    let handler = GotnMcpHandler::new(facade);
    let app_state = Arc::new(McpAppState {
        session_store: Arc::new(InMemorySessionStore::new()),
        id_generator: Arc::new(UuidGenerator {}),
        stream_id_gen: Arc::new(FastIdGenerator::new(Some("s_"))),
        server_details: Arc::new(server_details()),
        handler: handler.to_mcp_server_handler(),
        ping_interval: std::time::Duration::from_secs(12),
        transport_options: Arc::new(TransportOptions::default()),
        enable_json_response: false,
        event_store: None,
        task_store: None,
        client_task_store: None,
    });

    let http_handler = Arc::new(McpHttpHandler::new(vec![]));

    let app = Router::new()
        .route(
            MCP_ENDPOINT,
            get(handle_streamable_http_get)
                .post(handle_streamable_http_post)
                .delete(handle_streamable_http_delete),
        )
        .with_state(app_state)
        .layer(Extension(http_handler));

    info!(endpoint = %MCP_ENDPOINT, addr = %local_addr, "gotnd MCP Streamable HTTP ready");

    axum::serve(listener, app)
        .await
        .map_err(|error| format!("MCP server failed: {error}"))
}

async fn handle_streamable_http_get(
    headers: HeaderMap,
    uri: Uri,
    State(state): State<Arc<McpAppState>>,
    Extension(http_handler): Extension<Arc<McpHttpHandler>>,
) -> Result<Response, TransportServerError> {
    let request = McpHttpHandler::create_request(Method::GET, uri, headers, None);
    let generic_response = http_handler.handle_streamable_http(request, state).await?;
    Ok(convert_response(generic_response))
}

async fn handle_streamable_http_post(
    headers: HeaderMap,
    uri: Uri,
    State(state): State<Arc<McpAppState>>,
    Extension(http_handler): Extension<Arc<McpHttpHandler>>,
    payload: String,
) -> Result<Response, TransportServerError> {
    let request =
        McpHttpHandler::create_request(Method::POST, uri, headers, Some(payload.as_str()));
    let generic_response = http_handler.handle_streamable_http(request, state).await?;
    Ok(convert_response(generic_response))
}

async fn handle_streamable_http_delete(
    headers: HeaderMap,
    uri: Uri,
    State(state): State<Arc<McpAppState>>,
    Extension(http_handler): Extension<Arc<McpHttpHandler>>,
) -> Result<Response, TransportServerError> {
    let request = McpHttpHandler::create_request(Method::DELETE, uri, headers, None);
    let generic_response = http_handler.handle_streamable_http(request, state).await?;
    Ok(convert_response(generic_response))
}

fn convert_response(response: axum::http::Response<GenericBody>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, axum::body::Body::new(body))
}
