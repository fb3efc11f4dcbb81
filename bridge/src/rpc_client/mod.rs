//! Clients for the bridge node's JSON-RPC API.
//!
//! The poller only needs one thing from the node: the height of a given
//! head. [`HeightSource`] captures that, and [`HttpRpcClient`] implements it
//! over JSON-RPC 2.0 on HTTP.

pub mod http;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthToken;

pub use http::HttpRpcClient;

/// The header RPC methods the exporter polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeadMethod {
    /// `header.LocalHead`: latest header verified by this node.
    LocalHead,
    /// `header.NetworkHead`: latest header the node has seen on the network.
    NetworkHead,
}

impl HeadMethod {
    /// Both methods, in the order they are polled each cycle.
    pub const ALL: [HeadMethod; 2] = [HeadMethod::LocalHead, HeadMethod::NetworkHead];

    /// JSON-RPC method name.
    pub fn as_str(self) -> &'static str {
        match self {
            HeadMethod::LocalHead => "header.LocalHead",
            HeadMethod::NetworkHead => "header.NetworkHead",
        }
    }
}

impl fmt::Display for HeadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while fetching a head height.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// The request could not be sent or no response arrived.
    #[error("error executing request: {0}")]
    Request(#[source] reqwest::Error),
    /// The node answered with something other than 200 OK.
    #[error("non-OK HTTP status: {0}")]
    Status(reqwest::StatusCode),
    /// The response body could not be read.
    #[error("error reading response body: {0}")]
    Body(#[source] reqwest::Error),
    /// The body is not JSON or does not have the `result.header.height`
    /// string the exporter expects.
    #[error("error decoding response: {0}")]
    Decode(#[source] serde_json::Error),
    /// The node returned a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Remote { code: i64, message: String },
    /// Neither `result` nor `error` is present in the response.
    #[error("response has no result")]
    MissingResult,
    /// `height` is a string but not a decimal integer.
    #[error("error converting height {value:?} to int: {source}")]
    InvalidHeight {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    /// The height does not fit the gauge's value range.
    #[error("height {0} is out of range for a gauge")]
    HeightOutOfRange(u64),
}

/// Source of head heights for the poller.
///
/// Implementations must be shareable across tasks; the poller holds one for
/// the whole process lifetime and calls it sequentially.
#[async_trait]
pub trait HeightSource: Send + Sync {
    async fn head_height(&self, method: HeadMethod, token: &AuthToken) -> Result<u64, RpcError>;
}
