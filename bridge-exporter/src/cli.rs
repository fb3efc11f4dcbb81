//! Command-line flags.
//!
//! Flag names keep the dotted style of the node's own CLI
//! (`--listen.port`, `--p2p.network`, ...).

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use bridge::{AuthConfig, ExporterConfig, MetricsConfig, PollerConfig, RpcClientConfig};

/// Prometheus exporter for Celestia bridge node head heights.
#[derive(Debug, Parser)]
#[command(name = "bridge-exporter", version, about)]
pub struct Cli {
    /// Port to listen on
    #[arg(long = "listen.port", default_value = "8380")]
    pub listen_port: String,

    /// Address to bind the metrics listener to
    #[arg(long = "listen.address", default_value = "0.0.0.0")]
    pub listen_address: String,

    /// Bridge node JSON-RPC endpoint to connect to
    #[arg(long, default_value = "http://localhost:26658")]
    pub endpoint: String,

    /// Network to request the admin token for
    #[arg(long = "p2p.network", default_value = "blockspacerace")]
    pub p2p_network: String,

    /// Node CLI used to mint the admin token
    #[arg(long = "auth.binary", default_value = "celestia")]
    pub auth_binary: String,

    /// Seconds to wait between poll cycles
    #[arg(
        long = "poll.interval",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    /// Per-request RPC timeout in seconds (no timeout when unset)
    #[arg(long = "rpc.timeout", value_parser = clap::value_parser!(u64).range(1..))]
    pub rpc_timeout_secs: Option<u64>,
}

impl Cli {
    /// Validates the flags and turns them into the library configuration.
    pub fn into_config(self) -> Result<ExporterConfig> {
        let port: u16 = self
            .listen_port
            .trim()
            .parse()
            .with_context(|| format!("invalid --listen.port {:?}", self.listen_port))?;
        let ip: IpAddr = self
            .listen_address
            .trim()
            .parse()
            .with_context(|| format!("invalid --listen.address {:?}", self.listen_address))?;

        Ok(ExporterConfig {
            metrics: MetricsConfig {
                listen_addr: SocketAddr::new(ip, port),
            },
            rpc: RpcClientConfig {
                endpoint: self.endpoint,
                timeout: self.rpc_timeout_secs.map(Duration::from_secs),
            },
            auth: AuthConfig {
                binary: self.auth_binary,
                p2p_network: self.p2p_network,
            },
            poller: PollerConfig {
                interval: Duration::from_secs(self.poll_interval_secs),
            },
        })
    }
}
