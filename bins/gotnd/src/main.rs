//! gotnd: the MCP Streamable-HTTP daemon wiring the service facade's ten
//! tools to an external agent.

mod mcp;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gotn_service::{Config, HttpBreakdownProvider, ServiceFacade, SingleNodeBreakdownProvider};
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// MCP Streamable-HTTP server for the gotn graph substrate.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Root for `.gotn/`, overriding `GOTN_WORKSPACE`.
    #[clap(long)]
    workspace: Option<String>,

    /// Listen address, overriding `GOTN_MCP_ADDR`.
    #[clap(long)]
    bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let args = Args::parse();

    let mut config = Config::from_env().context("loading configuration from environment")?;
    if let Some(workspace) = args.workspace {
        config.workspace_path = workspace;
    }
    if let Some(bind_addr) = args.bind_addr {
        config.mcp_bind_addr = bind_addr;
    }

    info!(workspace = %config.workspace_path, addr = %config.mcp_bind_addr, "starting gotnd");

    let breakdown_provider = HttpBreakdownProvider::from_env().map_or_else(
        || {
            warn!(
                "GOTN_BREAKDOWN_ENDPOINT/GOTN_BREAKDOWN_API_KEY not set, \
                 falling back to single-node breakdown"
            );
            Arc::new(SingleNodeBreakdownProvider) as Arc<dyn gotn_service::BreakdownProvider>
        },
        |provider| Arc::new(provider) as Arc<dyn gotn_service::BreakdownProvider>,
    );

    let facade = Arc::new(
        ServiceFacade::new(config.clone(), breakdown_provider)
            .context("constructing service facade")?,
    );

    let listener = TcpListener::bind(&config.mcp_bind_addr)
        .await
        .with_context(|| format!("binding {}", config.mcp_bind_addr))?;

    mcp::run_mcp_server(listener, facade)
        .await
        .map_err(|error| anyhow::anyhow!(error))
}
