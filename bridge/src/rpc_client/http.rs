//! JSON-RPC over HTTP height client.
//!
//! Each call is a single POST of the form:
//!
//! ```json
//! {"jsonrpc": "2.0", "id": 1, "method": "header.LocalHead", "params": []}
//! ```
//!
//! with `Authorization: Bearer <token>`, and the node is expected to answer:
//!
//! ```json
//! {"jsonrpc": "2.0", "id": 1, "result": {"header": {"height": "12345", ...}, ...}}
//! ```
//!
//! Only `result.header.height` is read; everything else in the extended
//! header is ignored.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{HeadMethod, HeightSource, RpcError};
use crate::auth::AuthToken;
use crate::config::RpcClientConfig;

/// Request id sent with every call. The exporter never has more than one
/// request in flight per connection, so ids are not correlated.
const REQUEST_ID: u64 = 1;

/// HTTP-based JSON-RPC client for the bridge node.
///
/// Cheap to share: the underlying `reqwest::Client` pools connections and
/// is internally reference counted.
#[derive(Clone)]
pub struct HttpRpcClient {
    endpoint: String,
    client: Client,
}

impl HttpRpcClient {
    /// Constructs a client for `cfg.endpoint`.
    ///
    /// If `cfg.timeout` is `None` no request timeout is set at all.
    pub fn new(cfg: &RpcClientConfig) -> Result<Self, RpcError> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RpcError::Client)?;

        Ok(Self {
            endpoint: cfg.endpoint.clone(),
            client,
        })
    }
}

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<serde_json::Value>,
}

impl<'a> RpcRequest<'a> {
    fn new(method: &'a str) -> Self {
        Self {
            jsonrpc: "2.0",
            id: REQUEST_ID,
            method,
            params: Vec::new(),
        }
    }
}

/// JSON-RPC response envelope, narrowed to the fields we read.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<HeadResult>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct HeadResult {
    header: RawHeader,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    height: String,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Extracts `result.header.height` from a raw response body.
fn parse_height(body: &[u8]) -> Result<u64, RpcError> {
    let resp: RpcResponse = serde_json::from_slice(body).map_err(RpcError::Decode)?;

    if let Some(err) = resp.error {
        return Err(RpcError::Remote {
            code: err.code,
            message: err.message,
        });
    }

    let height = resp.result.ok_or(RpcError::MissingResult)?.header.height;
    height
        .parse::<u64>()
        .map_err(|source| RpcError::InvalidHeight {
            value: height.clone(),
            source,
        })
}

#[async_trait]
impl HeightSource for HttpRpcClient {
    async fn head_height(&self, method: HeadMethod, token: &AuthToken) -> Result<u64, RpcError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.as_str())
            .json(&RpcRequest::new(method.as_str()))
            .send()
            .await
            .map_err(RpcError::Request)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(RpcError::Status(status));
        }

        let body = resp.bytes().await.map_err(RpcError::Body)?;
        parse_height(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::{Request, Response, body::Incoming, server::conn::http1, service::service_fn};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    use super::*;

    /// What the stub node saw for one request.
    #[derive(Debug, Clone)]
    struct Seen {
        authorization: Option<String>,
        content_type: Option<String>,
        body: serde_json::Value,
    }

    /// Starts a one-route stub node that answers every POST with `status`
    /// and `body`, recording each request it receives.
    async fn spawn_stub_node(
        status: u16,
        body: &'static str,
    ) -> (SocketAddr, Arc<Mutex<Vec<Seen>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let log = log.clone();
                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let log = log.clone();
                        async move {
                            let header = |name: hyper::header::HeaderName| {
                                req.headers()
                                    .get(name)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_owned)
                            };
                            let authorization = header(hyper::header::AUTHORIZATION);
                            let content_type = header(hyper::header::CONTENT_TYPE);
                            let raw = req.into_body().collect().await.unwrap().to_bytes();
                            log.lock().unwrap().push(Seen {
                                authorization,
                                content_type,
                                body: serde_json::from_slice(&raw).unwrap(),
                            });

                            let mut resp = Response::new(Full::new(Bytes::from_static(
                                body.as_bytes(),
                            )));
                            *resp.status_mut() = hyper::StatusCode::from_u16(status).unwrap();
                            Ok::<_, Infallible>(resp)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        (addr, seen)
    }

    fn client_for(addr: SocketAddr, timeout: Option<Duration>) -> HttpRpcClient {
        HttpRpcClient::new(&RpcClientConfig {
            endpoint: format!("http://{addr}"),
            timeout,
        })
        .expect("build client")
    }

    #[test]
    fn request_envelope_has_fixed_shape() {
        let json = serde_json::to_value(RpcRequest::new("header.NetworkHead")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "header.NetworkHead",
                "params": []
            })
        );
    }

    #[test]
    fn parses_height_from_extended_header() {
        let body = br#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "header": {"chain_id": "blockspacerace-0", "height": "12345", "time": "2023-04-01T00:00:00Z"},
                "commit": {},
                "dah": {"row_roots": []}
            }
        }"#;
        assert_eq!(parse_height(body).unwrap(), 12345);
    }

    #[test]
    fn malformed_responses_are_rejected() {
        assert!(matches!(parse_height(b"not json"), Err(RpcError::Decode(_))));
        assert!(matches!(
            parse_height(br#"{"jsonrpc":"2.0","id":1}"#),
            Err(RpcError::MissingResult)
        ));
        assert!(matches!(
            parse_height(br#"{"result":{}}"#),
            Err(RpcError::Decode(_))
        ));
        assert!(matches!(
            parse_height(br#"{"result":{"header":{"height":12345}}}"#),
            Err(RpcError::Decode(_))
        ));
        assert!(matches!(
            parse_height(br#"{"result":{"header":{"height":"12a"}}}"#),
            Err(RpcError::InvalidHeight { .. })
        ));
        assert!(matches!(
            parse_height(br#"{"result":{"header":{"height":"-1"}}}"#),
            Err(RpcError::InvalidHeight { .. })
        ));
    }

    #[test]
    fn rpc_error_object_is_reported() {
        let body = br#"{"jsonrpc":"2.0","id":1,"error":{"code":1,"message":"missing permission"}}"#;
        match parse_height(body) {
            Err(RpcError::Remote { code, message }) => {
                assert_eq!(code, 1);
                assert_eq!(message, "missing permission");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn posts_json_rpc_with_bearer_token() {
        let (addr, seen) =
            spawn_stub_node(200, r#"{"jsonrpc":"2.0","id":1,"result":{"header":{"height":"42"}}}"#)
                .await;
        let client = client_for(addr, None);

        let height = client
            .head_height(HeadMethod::LocalHead, &AuthToken::new("secret"))
            .await
            .unwrap();
        assert_eq!(height, 42);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
        assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(seen[0].body["method"], "header.LocalHead");
        assert_eq!(seen[0].body["id"], 1);
        assert_eq!(seen[0].body["params"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn empty_token_still_sends_request() {
        let (addr, seen) =
            spawn_stub_node(200, r#"{"result":{"header":{"height":"7"}}}"#).await;
        let client = client_for(addr, None);

        let height = client
            .head_height(HeadMethod::NetworkHead, &AuthToken::default())
            .await
            .unwrap();
        assert_eq!(height, 7);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].body["method"], "header.NetworkHead");
        let auth = seen[0].authorization.as_deref().unwrap_or_default();
        assert!(auth.starts_with("Bearer"));
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let (addr, _) = spawn_stub_node(401, r#"{"error":"unauthorized"}"#).await;
        let client = client_for(addr, None);

        let err = client
            .head_height(HeadMethod::LocalHead, &AuthToken::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Status(s) if s == StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, None);
        let err = client
            .head_height(HeadMethod::LocalHead, &AuthToken::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Request(_)));
    }

    #[tokio::test]
    async fn timeout_applies_when_configured() {
        // Accepts connections but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let client = client_for(addr, Some(Duration::from_millis(200)));
        let err = client
            .head_height(HeadMethod::LocalHead, &AuthToken::default())
            .await
            .unwrap_err();
        match err {
            RpcError::Request(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_cycle_publishes_node_height() {
        let (addr, seen) =
            spawn_stub_node(200, r#"{"jsonrpc":"2.0","id":1,"result":{"header":{"height":"12345"}}}"#)
                .await;
        let metrics = Arc::new(crate::MetricsRegistry::new().unwrap());
        let poller = crate::Poller::new(
            client_for(addr, None),
            AuthToken::new("tok"),
            metrics.clone(),
            &crate::PollerConfig::default(),
        );

        assert!(poller.poll_once().await.is_complete());
        assert_eq!(metrics.bridge.local_height.get(), 12345);
        assert_eq!(metrics.bridge.network_height.get(), 12345);

        let methods: Vec<_> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.body["method"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(methods, ["header.LocalHead", "header.NetworkHead"]);
    }

    #[tokio::test]
    async fn malformed_node_response_leaves_gauges_untouched() {
        let (addr, _) = spawn_stub_node(200, r#"{"result":{"header":{"height":12345}}}"#).await;
        let metrics = Arc::new(crate::MetricsRegistry::new().unwrap());
        metrics.bridge.local_height.set(100);
        metrics.bridge.network_height.set(101);
        let poller = crate::Poller::new(
            client_for(addr, None),
            AuthToken::new("tok"),
            metrics.clone(),
            &crate::PollerConfig::default(),
        );

        let report = poller.poll_once().await;

        assert!(report.local.is_err() && report.network.is_err());
        assert_eq!(metrics.bridge.local_height.get(), 100);
        assert_eq!(metrics.bridge.network_height.get(), 101);
    }
}
