//! specflowd - JSON HTTP service for spec change application and discovery.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use specflow_core::{
    ApplierConfig, DiscoveryConfig, DiscoveryService, SnapshotInventory, SpecApplier, METRICS,
};
use specflow_github::GitHubClient;
use tracing::{info, warn, Level};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "specflowd")]
#[command(version = specflow_core::VERSION)]
#[command(about = "HTTP service for infrastructure spec change review")]
struct Args {
    /// Address to bind the server to
    #[arg(long, env = "SPECFLOWD_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "SPECFLOWD_PORT", default_value = "8080")]
    port: u16,

    /// Directory holding exported inventory JSON for discovery
    #[arg(long, env = "SPECFLOW_SNAPSHOT_DIR", default_value = "inventory")]
    snapshot_dir: PathBuf,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    specflow_core::init_tracing(args.json, level);

    let client = GitHubClient::from_env().context("Failed to configure GitHub client")?;
    info!(api_url = %client.config().api_url, "github client ready");

    let applier_config = ApplierConfig::from_env();
    info!(
        base_branch = %applier_config.base_branch,
        labels = ?applier_config.labels,
        allowed_repos = ?applier_config.allowed_repos,
        "applier configured"
    );
    if applier_config.allowed_repos.is_empty() {
        warn!("SPECFLOW_ALLOWED_REPOS is unset, every repository the token can write is reachable");
    }

    info!(snapshot_dir = %args.snapshot_dir.display(), "discovery backed by inventory snapshot");
    let state = AppState::new(
        SpecApplier::new(client, applier_config),
        DiscoveryService::new(
            SnapshotInventory::new(args.snapshot_dir),
            DiscoveryConfig::from_env(),
        ),
    );

    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, version = specflow_core::VERSION, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    METRICS.flush();
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
