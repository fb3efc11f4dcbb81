// bridge-exporter/src/main.rs

//! Bridge exporter binary.
//!
//! Polls a Celestia bridge node for its local and network head heights and
//! serves them as Prometheus gauges on `/metrics`:
//!
//! - the admin token is fetched once from the node CLI,
//! - a background task polls `header.LocalHead` / `header.NetworkHead`,
//! - the metrics server runs in the foreground until the process is killed.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use bridge::{
    CommandTokenProvider, HttpRpcClient, MetricsRegistry, MetricsServer, Poller, token_or_empty,
};
use cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "bridge_exporter=info,bridge=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = cli.into_config()?;

    // ---------------------------
    // Metrics registry + listener
    // ---------------------------

    let metrics = Arc::new(MetricsRegistry::new().context("failed to initialise metrics registry")?);

    let server = MetricsServer::bind(cfg.metrics.listen_addr).await?;

    // ---------------------------
    // RPC client + poller
    // ---------------------------

    let client = HttpRpcClient::new(&cfg.rpc).context("failed to create RPC client")?;
    let provider = CommandTokenProvider::from_config(&cfg.auth);

    let poller_metrics = metrics.clone();
    let poller_cfg = cfg.poller.clone();
    tokio::spawn(async move {
        let token = token_or_empty(&provider).await;
        Poller::new(client, token, poller_metrics, &poller_cfg)
            .run()
            .await;
    });

    // ---------------------------
    // Serve /metrics
    // ---------------------------

    tracing::info!(
        endpoint = %cfg.rpc.endpoint,
        network = %cfg.auth.p2p_network,
        "Celestia Bridge Exporter started on http://{}/metrics",
        server.local_addr()
    );

    server.serve(metrics).await?;

    Ok(())
}
