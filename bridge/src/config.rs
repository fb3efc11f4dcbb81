//! Top-level configuration for the exporter.
//!
//! This module aggregates configuration for:
//!
//! - the Prometheus exporter (listen address),
//! - the bridge node JSON-RPC client (endpoint + optional timeout),
//! - the admin token command (binary + p2p network),
//! - the poll loop (interval).
//!
//! Defaults match the flag defaults of the `bridge-exporter` binary, which
//! builds an [`ExporterConfig`] from its command line.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8380)),
        }
    }
}

/// Configuration for the bridge node JSON-RPC client.
#[derive(Clone, Debug)]
pub struct RpcClientConfig {
    /// JSON-RPC endpoint of the bridge node, e.g. `"http://localhost:26658"`.
    pub endpoint: String,
    /// Optional per-request timeout. `None` means requests may block
    /// indefinitely on an unresponsive node.
    pub timeout: Option<Duration>,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:26658".to_string(),
            timeout: None,
        }
    }
}

/// Configuration for fetching the admin auth token.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Node CLI binary, resolved through `PATH` unless absolute.
    pub binary: String,
    /// Value passed to `--p2p.network`.
    pub p2p_network: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            binary: "celestia".to_string(),
            p2p_network: "blockspacerace".to_string(),
        }
    }
}

/// Configuration for the poll loop.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Pause between the end of one poll cycle and the start of the next.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Top-level configuration for the exporter process.
#[derive(Clone, Debug, Default)]
pub struct ExporterConfig {
    pub metrics: MetricsConfig,
    pub rpc: RpcClientConfig,
    pub auth: AuthConfig,
    pub poller: PollerConfig,
}
