//! Metrics and instrumentation for the exporter.
//!
//! This module defines the Prometheus gauges republished by the exporter
//! and a small HTTP server that serves `/metrics` in Prometheus text format.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge::metrics::{MetricsRegistry, MetricsServer};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let server = MetricsServer::bind("0.0.0.0:8380".parse()?).await?;
//!
//! // Elsewhere, e.g. in the poller:
//! registry.bridge.local_height.set(12345);
//!
//! server.serve(registry.clone()).await?;
//! ```

pub mod prometheus;

pub use prometheus::{BridgeMetrics, MetricsRegistry, MetricsServer};
