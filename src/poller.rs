//! Per-host polling.
//!
//! A [`HostPoller`] owns the write side of one [`Host`]: it fetches a
//! complete snapshot and swaps it in, or leaves the previous one untouched
//! when the fetch fails.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::client::{MetricsFetcher, DEFAULT_REQUEST_TIMEOUT};
use crate::error::FetchError;
use crate::host::{Host, HostInfo};

/// Refreshes a single host from a [`MetricsFetcher`].
#[derive(Clone)]
pub struct HostPoller {
    host: Arc<Host>,
    fetcher: Arc<dyn MetricsFetcher>,
    timeout: Duration,
}

impl HostPoller {
    pub fn new(info: HostInfo, fetcher: Arc<dyn MetricsFetcher>) -> Self {
        Self {
            host: Arc::new(Host::new(info)),
            fetcher,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound the whole fetch, all requests included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &Arc<Host> {
        &self.host
    }

    /// Fetch a new snapshot and publish it.
    ///
    /// On failure the host keeps its previous snapshot, `updated` flag included.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let info = self.host.info();
        let mut next = tokio::time::timeout(self.timeout, self.fetcher.fetch(info))
            .await
            .map_err(|_| FetchError::Timeout)??;

        let previous = self.host.snapshot();
        next.updated = true;
        next.generation = previous.generation + 1;
        next.fetched_at_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        next.derive_rates(&previous);

        debug!(host = %info, generation = next.generation, "Snapshot updated");
        self.host.replace(next);
        Ok(())
    }
}

impl std::fmt::Debug for HostPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostPoller")
            .field("host", self.host.info())
            .field("timeout", &self.timeout)
            .finish()
    }
}
