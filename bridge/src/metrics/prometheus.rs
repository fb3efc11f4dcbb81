//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and the bridge height gauges, and a [`MetricsServer`] that
//! serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{Encoder, IntGauge, Opts, Registry, TextEncoder};

use crate::error::ExporterError;
use crate::rpc_client::HeadMethod;

/// Namespace prepended to every metric name in the registry.
const NAMESPACE: &str = "bridge";

/// Height gauges for the monitored bridge node.
///
/// Gauges are atomic, so they can be set from the poller while the HTTP
/// exporter reads them without any extra locking. The pair as a whole is
/// not updated transactionally.
#[derive(Clone)]
pub struct BridgeMetrics {
    /// Height of the latest header the node has verified locally.
    pub local_height: IntGauge,
    /// Height of the network head as observed by the node.
    pub network_height: IntGauge,
}

impl BridgeMetrics {
    /// Registers the height gauges into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let local_height = IntGauge::with_opts(Opts::new(
            "local_height",
            "Local height of the Celestia node",
        ))?;
        registry.register(Box::new(local_height.clone()))?;

        let network_height = IntGauge::with_opts(Opts::new(
            "network_height",
            "Network height of the Celestia node",
        ))?;
        registry.register(Box::new(network_height.clone()))?;

        Ok(Self {
            local_height,
            network_height,
        })
    }

    /// Returns the gauge fed by the given RPC method.
    pub fn gauge_for(&self, method: HeadMethod) -> &IntGauge {
        match method {
            HeadMethod::LocalHead => &self.local_height,
            HeadMethod::NetworkHead => &self.network_height,
        }
    }
}

/// Wrapper around a Prometheus registry and the bridge gauges.
///
/// This is the handle shared between the poller and the HTTP exporter,
/// usually wrapped in an [`Arc`].
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub bridge: BridgeMetrics,
}

impl MetricsRegistry {
    /// Creates a fresh registry under the `bridge` namespace and registers
    /// the height gauges. Both start at 0.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;
        let bridge = BridgeMetrics::register(&registry)?;
        Ok(Self { registry, bridge })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// HTTP server that exposes Prometheus metrics.
///
/// Binding and serving are separate steps so that callers can treat a bind
/// failure as fatal before anything else starts, and so tests can bind port
/// 0 and read back the assigned address.
pub struct MetricsServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl MetricsServer {
    /// Binds the metrics listener on `addr`.
    pub async fn bind(addr: SocketAddr) -> Result<Self, ExporterError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ExporterError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ExporterError::Bind { addr, source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves `GET /metrics` forever. All other paths return 404.
    ///
    /// Every scrape renders the registry afresh; nothing is cached between
    /// requests. Only a failure of the listener itself ends the loop.
    pub async fn serve(self, metrics: Arc<MetricsRegistry>) -> Result<(), ExporterError> {
        loop {
            let (stream, peer) = self.listener.accept().await.map_err(ExporterError::Serve)?;
            let io = TokioIo::new(stream);
            let metrics = metrics.clone();

            tokio::spawn(async move {
                let svc = service_fn(move |req| {
                    let metrics = metrics.clone();
                    handle_request(req, metrics)
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                    tracing::warn!(%peer, error = %err, "metrics connection error");
                }
            });
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut resp = Response::new(Full::new(Bytes::from(metrics.gather_text())));
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            resp
        }
        _ => {
            let mut resp = Response::new(Full::new(Bytes::from_static(b"not found")));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            resp
        }
    };
    Ok(response)
}
