//! gotn-cli: command-line entry point onto the service facade's ten
//! operations, for scripting and local debugging.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gotn_service::{
    BreakdownMode, Config, HttpBreakdownProvider, ServiceFacade, SingleNodeBreakdownProvider,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Command-line interface for the gotn graph substrate.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Root for `.gotn/`, overriding `GOTN_WORKSPACE`.
    #[clap(long, global = true)]
    workspace: Option<String>,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the `.gotn/` directory structure for a workspace.
    Init,
    /// Persist one micro-prompt node from a JSON file or `-` for stdin.
    Store {
        /// Path to a `NodeInput` JSON document, or `-` for stdin.
        input: String,
    },
    /// Run hard and soft edge inference over the whole graph.
    InferEdges,
    /// Decompose a prompt into micro-prompt nodes.
    Breakdown {
        /// Project scope for the decomposition.
        #[clap(long, default_value = "default")]
        project_id: String,
        /// The prompt to decompose.
        prompt: String,
        /// Decomposition shape.
        #[clap(long, value_enum, default_value = "tree")]
        mode: BreakdownModeArg,
        /// Maximum proposed nodes.
        #[clap(long, default_value_t = 32)]
        max_nodes: usize,
        /// Also compose a plan over the newly created nodes.
        #[clap(long)]
        compose: bool,
    },
    /// Select, layer, and materialize a run directory.
    Plan {
        /// Free-form goal description.
        #[clap(long)]
        goal: Option<String>,
        /// Tags required by the selected nodes.
        #[clap(long)]
        requires: Vec<String>,
        /// Tags produced by the selected nodes.
        #[clap(long)]
        produces: Vec<String>,
    },
    /// Evaluate guards for one node and write a patch stub.
    Execute {
        /// Target node id.
        node_id: String,
    },
    /// Print one node's parents, children, and incident edges.
    Trace {
        /// Target node id.
        node_id: String,
    },
    /// Embed a query and return the nearest nodes.
    Search {
        /// The search query text.
        query: String,
        /// Maximum matches to return.
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the process-scoped metrics snapshot.
    Debug,
    /// Replay the journal from scratch and report recovered counts.
    Recover,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BreakdownModeArg {
    Tree,
    Flat,
}

impl From<BreakdownModeArg> for BreakdownMode {
    fn from(value: BreakdownModeArg) -> Self {
        match value {
            BreakdownModeArg::Tree => Self::Tree,
            BreakdownModeArg::Flat => Self::Flat,
        }
    }
}

fn now() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

fn read_node_input(source: &str) -> Result<serde_json::Value> {
    let raw = if source == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading node input from stdin")?
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("reading node input from {source}"))?
    };
    serde_json::from_str(&raw).context("parsing node input as JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args = Args::parse();

    let mut config = Config::from_env().context("loading configuration from environment")?;
    if let Some(workspace) = args.workspace {
        config.workspace_path = workspace;
    }
    let workspace_path = Some(config.workspace_path.clone());

    let breakdown_provider = HttpBreakdownProvider::from_env().map_or_else(
        || Arc::new(SingleNodeBreakdownProvider) as Arc<dyn gotn_service::BreakdownProvider>,
        |provider| Arc::new(provider) as Arc<dyn gotn_service::BreakdownProvider>,
    );
    let facade = ServiceFacade::new(config, breakdown_provider)
        .context("constructing service facade")?;
    let timestamp = now();

    let output = match args.cmd {
        Command::Init => facade.init_workspace(workspace_path.as_deref(), &timestamp).await,
        Command::Store { input } => {
            let raw = read_node_input(&input)?;
            let node = serde_json::from_value(raw).context("parsing node input shape")?;
            facade.store_node(node, workspace_path.as_deref(), &timestamp).await
        }
        Command::InferEdges => {
            facade.infer_edges(None, workspace_path.as_deref(), &timestamp).await
        }
        Command::Breakdown {
            project_id,
            prompt,
            mode,
            max_nodes,
            compose,
        } => {
            facade
                .breakdown_prompt(
                    &project_id,
                    &prompt,
                    mode.into(),
                    max_nodes,
                    compose,
                    workspace_path.as_deref(),
                    &timestamp,
                )
                .await
        }
        Command::Plan {
            goal,
            requires,
            produces,
        } => {
            facade
                .compose_plan(goal, requires, produces, workspace_path.as_deref(), &timestamp)
                .await
        }
        Command::Execute { node_id } => {
            facade.execute_node(&node_id, workspace_path.as_deref(), &timestamp).await
        }
        Command::Trace { node_id } => {
            facade.trace_node(&node_id, workspace_path.as_deref(), &timestamp).await
        }
        Command::Search { query, limit } => {
            facade
                .search_nodes(&query, Some(limit), workspace_path.as_deref(), &timestamp)
                .await
        }
        Command::Debug => facade.debug(&timestamp).await,
        Command::Recover => facade.recover(workspace_path.as_deref(), &timestamp).await,
    };

    print_json(&output);
    Ok(())
}
