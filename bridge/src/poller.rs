//! Fixed-interval height poller.
//!
//! Each cycle asks the [`HeightSource`] for the local head height and then
//! the network head height, one after the other, and writes each successful
//! result into its gauge. A failed call is logged and leaves its gauge at
//! the previous value. After the cycle the poller sleeps for the configured
//! interval, so the effective period is the cycle's work time plus the
//! interval.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthToken;
use crate::config::PollerConfig;
use crate::metrics::MetricsRegistry;
use crate::rpc_client::{HeadMethod, HeightSource, RpcError};

/// Outcome of one poll cycle.
#[derive(Debug)]
pub struct PollReport {
    pub local: Result<u64, RpcError>,
    pub network: Result<u64, RpcError>,
}

impl PollReport {
    pub fn get(&self, method: HeadMethod) -> &Result<u64, RpcError> {
        match method {
            HeadMethod::LocalHead => &self.local,
            HeadMethod::NetworkHead => &self.network,
        }
    }

    /// `true` if both gauges were updated this cycle.
    pub fn is_complete(&self) -> bool {
        self.local.is_ok() && self.network.is_ok()
    }
}

/// Polls head heights and republishes them as gauges.
pub struct Poller<S> {
    source: S,
    token: AuthToken,
    metrics: Arc<MetricsRegistry>,
    interval: Duration,
}

impl<S: HeightSource> Poller<S> {
    pub fn new(
        source: S,
        token: AuthToken,
        metrics: Arc<MetricsRegistry>,
        cfg: &PollerConfig,
    ) -> Self {
        Self {
            source,
            token,
            metrics,
            interval: cfg.interval,
        }
    }

    /// Runs one cycle: both heights, sequentially.
    pub async fn poll_once(&self) -> PollReport {
        let local = self.update(HeadMethod::LocalHead).await;
        let network = self.update(HeadMethod::NetworkHead).await;

        let report = PollReport { local, network };
        if report.is_complete() {
            tracing::debug!(
                local_height = report.local.as_ref().ok(),
                network_height = report.network.as_ref().ok(),
                "updated heights"
            );
        }
        report
    }

    async fn update(&self, method: HeadMethod) -> Result<u64, RpcError> {
        let result = self
            .source
            .head_height(method, &self.token)
            .await
            .and_then(|height| {
                i64::try_from(height)
                    .map(|value| (height, value))
                    .map_err(|_| RpcError::HeightOutOfRange(height))
            });

        match result {
            Ok((height, value)) => {
                self.metrics.bridge.gauge_for(method).set(value);
                Ok(height)
            }
            Err(e) => {
                tracing::warn!(%method, error = %e, "error getting height");
                Err(e)
            }
        }
    }

    /// Polls forever. Never returns; the task is simply dropped with the
    /// process.
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            token_present = !self.token.is_empty(),
            "height poller running"
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}
