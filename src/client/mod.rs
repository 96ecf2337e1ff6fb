//! Metrics collection from Sui hosts.
//!
//! The rest of the crate only sees the [`MetricsFetcher`] trait: one call,
//! one complete snapshot or one error. [`SuiClient`] is the production
//! implementation, speaking JSON-RPC and scraping the Prometheus endpoint.

mod prometheus;
mod rpc;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use suimon_types::MetricsSnapshot;
use tracing::debug;

use crate::error::FetchError;
use crate::host::HostInfo;
use crate::orchestrator::GroupKind;

pub use prometheus::PrometheusMetrics;

/// Default bound on a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Source of metrics snapshots for a host.
///
/// A call either returns a complete snapshot from one fetch or an error;
/// there is no partial result.
#[async_trait]
pub trait MetricsFetcher: Send + Sync {
    async fn fetch(&self, host: &HostInfo) -> Result<MetricsSnapshot, FetchError>;
}

/// HTTP client for Sui full nodes, validators and public RPC endpoints.
///
/// What gets queried depends on the host's group: RPC hosts answer JSON-RPC
/// only (system state included), peers expose only Prometheus metrics, and
/// the operator's node is asked for both.
#[derive(Debug, Clone)]
pub struct SuiClient {
    client: Client,
}

impl SuiClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_rpc(&self, host: &HostInfo) -> Result<MetricsSnapshot, FetchError> {
        let url = host.rpc_url.as_deref().ok_or(FetchError::NoEndpoint("RPC"))?;
        let rpc = rpc::RpcClient::new(&self.client, url);

        let (transactions, checkpoint, state) = tokio::try_join!(
            rpc.total_transaction_blocks(),
            rpc.latest_checkpoint(),
            rpc.system_state(),
        )?;

        Ok(MetricsSnapshot {
            total_transaction_blocks: Some(transactions),
            latest_checkpoint: Some(checkpoint),
            current_epoch: Some(state.epoch),
            system_state: Some(state),
            ..Default::default()
        })
    }

    async fn fetch_metrics(&self, host: &HostInfo) -> Result<PrometheusMetrics, FetchError> {
        let url = host.metrics_url().ok_or(FetchError::NoEndpoint("metrics"))?;
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "Metrics endpoint returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        Ok(PrometheusMetrics::parse(&body))
    }
}

#[async_trait]
impl MetricsFetcher for SuiClient {
    async fn fetch(&self, host: &HostInfo) -> Result<MetricsSnapshot, FetchError> {
        debug!(host = %host, group = %host.group, "Fetching metrics");

        match host.group {
            GroupKind::Rpc => self.fetch_rpc(host).await,
            GroupKind::Peers => {
                let metrics = self.fetch_metrics(host).await?;
                let mut snapshot = MetricsSnapshot::default();
                metrics.apply(&mut snapshot)?;
                Ok(snapshot)
            }
            GroupKind::Node => {
                let (mut snapshot, metrics) =
                    tokio::try_join!(self.fetch_rpc(host), self.fetch_metrics(host))?;
                metrics.apply(&mut snapshot)?;
                Ok(snapshot)
            }
        }
    }
}
