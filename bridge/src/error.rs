use std::net::SocketAddr;

use thiserror::Error;

/// Errors from the metrics HTTP server. Both are fatal to the process.
///
/// Everything else (token fetch, RPC failures) is logged and swallowed by
/// the component that hit it.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// The metrics listener could not be bound.
    #[error("failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// Accepting connections on the bound listener failed.
    #[error("metrics server error: {0}")]
    Serve(#[source] std::io::Error),
}
