//! Bridge exporter library crate.
//!
//! This crate provides the pieces a height exporter for a Celestia bridge
//! node is assembled from:
//!
//! - a one-shot admin token provider backed by the node CLI (`auth`),
//! - a JSON-RPC client for the `header.*Head` methods (`rpc_client`),
//! - a Prometheus registry with the two height gauges plus an HTTP
//!   exporter for `/metrics` (`metrics`),
//! - the fixed-interval poll loop tying them together (`poller`),
//! - and the top-level exporter configuration (`config`).
//!
//! The `bridge-exporter` binary wires these together from CLI flags.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod rpc_client;

// Re-export top-level configuration types.
pub use config::{AuthConfig, ExporterConfig, MetricsConfig, PollerConfig, RpcClientConfig};

pub use error::ExporterError;

// Re-export the token provider interface and its CLI-backed implementation.
pub use auth::{AuthError, AuthToken, CommandTokenProvider, TokenProvider, token_or_empty};

// Re-export the height source interface and the HTTP client.
pub use rpc_client::{HeadMethod, HeightSource, HttpRpcClient, RpcError};

// Re-export metrics registry and exporter.
pub use metrics::{BridgeMetrics, MetricsRegistry, MetricsServer};

pub use poller::{PollReport, Poller};
