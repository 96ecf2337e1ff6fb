//! Monitored hosts and their current snapshot.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use parking_lot::RwLock;
use reqwest::Url;
use suimon_types::MetricsSnapshot;

use crate::orchestrator::GroupKind;

/// Default Prometheus port of a Sui node.
pub const DEFAULT_METRICS_PORT: u16 = 9184;

/// Geo metadata shown next to a host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub country: Option<String>,
}

/// Static identity of a host, built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub group: GroupKind,
    /// Host name or IP, without scheme or port.
    pub address: String,
    pub rpc_port: Option<u16>,
    pub metrics_port: Option<u16>,
    /// Full JSON-RPC endpoint, if the host serves one.
    pub rpc_url: Option<String>,
    pub location: Location,
}

impl HostInfo {
    /// A public JSON-RPC endpoint such as `https://fullnode.testnet.sui.io:443`.
    pub fn rpc_endpoint(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid RPC URL: {}", url))?;
        let address = parsed
            .host_str()
            .ok_or_else(|| anyhow!("RPC URL has no host: {}", url))?
            .to_string();

        Ok(Self {
            group: GroupKind::Rpc,
            address,
            rpc_port: parsed.port_or_known_default(),
            metrics_port: None,
            rpc_url: Some(url.trim_end_matches('/').to_string()),
            location: Location::default(),
        })
    }

    /// The operator's own node, reachable on both its RPC and metrics ports.
    pub fn node(address: &str, rpc_port: u16, metrics_port: u16) -> Self {
        Self {
            group: GroupKind::Node,
            address: address.to_string(),
            rpc_port: Some(rpc_port),
            metrics_port: Some(metrics_port),
            rpc_url: Some(format!("http://{}:{}", address, rpc_port)),
            location: Location::default(),
        }
    }

    /// A peer given as `host:port` (the p2p port). Only its metrics endpoint is scraped.
    pub fn peer(address: &str, metrics_port: u16) -> Result<Self> {
        let host = match address.rsplit_once(':') {
            Some((host, port)) => {
                port.parse::<u16>()
                    .with_context(|| format!("Invalid peer port in {}", address))?;
                host
            }
            None => address,
        };
        if host.is_empty() {
            return Err(anyhow!("Peer address has no host: {}", address));
        }

        Ok(Self {
            group: GroupKind::Peers,
            address: host.to_string(),
            rpc_port: None,
            metrics_port: Some(metrics_port),
            rpc_url: None,
            location: Location::default(),
        })
    }

    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.location.country = country;
        self
    }

    /// Prometheus text endpoint, if the host exposes one.
    pub fn metrics_url(&self) -> Option<String> {
        self.metrics_port
            .map(|port| format!("http://{}:{}/metrics", self.address, port))
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.rpc_url, self.metrics_port) {
            (Some(url), _) => f.write_str(url),
            (None, Some(port)) => write!(f, "{}:{}", self.address, port),
            (None, None) => f.write_str(&self.address),
        }
    }
}

/// One monitored host and its latest snapshot.
///
/// The snapshot is swapped as a whole behind a lock, so a reader sees
/// either the previous or the next record, never a mix of both.
#[derive(Debug)]
pub struct Host {
    info: HostInfo,
    snapshot: RwLock<Arc<MetricsSnapshot>>,
}

impl Host {
    pub fn new(info: HostInfo) -> Self {
        Self {
            info,
            snapshot: RwLock::new(Arc::new(MetricsSnapshot::default())),
        }
    }

    pub fn info(&self) -> &HostInfo {
        &self.info
    }

    /// The current snapshot. Cheap: clones the `Arc`, not the record.
    pub fn snapshot(&self) -> Arc<MetricsSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn is_updated(&self) -> bool {
        self.snapshot.read().updated
    }

    /// Replace the snapshot with a complete new record.
    ///
    /// Only the host's poller calls this.
    pub(crate) fn replace(&self, snapshot: MetricsSnapshot) {
        let next = Arc::new(snapshot);
        *self.snapshot.write() = next;
    }
}

/// Sync-percentage thresholds for [`HostStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this percentage a host is yellow.
    pub sync_warning: u64,
    /// Below this percentage a host is red.
    pub sync_critical: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sync_warning: 99,
            sync_critical: 90,
        }
    }
}

/// Health of a host derived from its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostStatus {
    /// Never fetched.
    Grey,
    Green,
    Yellow,
    Red,
}

impl HostStatus {
    /// Derive the status from the weakest sync percentage of the snapshot.
    pub fn of(snapshot: &MetricsSnapshot, thresholds: &Thresholds) -> Self {
        if !snapshot.updated {
            return HostStatus::Grey;
        }

        let weakest = [
            snapshot.checkpoint_sync_percentage(),
            snapshot.tx_sync_percentage(),
        ]
        .into_iter()
        .flatten()
        .min();

        match weakest {
            Some(pct) if pct < thresholds.sync_critical => HostStatus::Red,
            Some(pct) if pct < thresholds.sync_warning => HostStatus::Yellow,
            _ => HostStatus::Green,
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HostStatus::Grey => "N/A",
            HostStatus::Green => "OK",
            HostStatus::Yellow => "WARN",
            HostStatus::Red => "CRIT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn synced(known: u64, synced: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            updated: true,
            highest_known_checkpoint: Some(known),
            highest_synced_checkpoint: Some(synced),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_thresholds() {
        let thresholds = Thresholds::default();
        let status = |snapshot: &MetricsSnapshot| HostStatus::of(snapshot, &thresholds);
        assert_eq!(status(&MetricsSnapshot::default()), HostStatus::Grey);
        assert_eq!(status(&synced(100, 100)), HostStatus::Green);
        assert_eq!(status(&synced(100, 95)), HostStatus::Yellow);
        assert_eq!(status(&synced(100, 50)), HostStatus::Red);
    }

    #[test]
    fn test_status_without_percentages_is_green() {
        let snapshot = MetricsSnapshot {
            updated: true,
            ..Default::default()
        };
        let thresholds = Thresholds::default();
        assert_eq!(HostStatus::of(&snapshot, &thresholds), HostStatus::Green);
    }

    #[test]
    fn test_rpc_endpoint_parsing() {
        let info = HostInfo::rpc_endpoint("https://fullnode.testnet.sui.io:443/").unwrap();
        assert_eq!(info.address, "fullnode.testnet.sui.io");
        assert_eq!(info.rpc_port, Some(443));
        assert_eq!(
            info.rpc_url.as_deref(),
            Some("https://fullnode.testnet.sui.io:443")
        );
        assert!(info.metrics_url().is_none());

        let info = HostInfo::rpc_endpoint("https://rpc.example.com").unwrap();
        assert_eq!(info.rpc_port, Some(443));

        assert!(HostInfo::rpc_endpoint("not a url").is_err());
    }

    #[test]
    fn test_peer_parsing() {
        let port = DEFAULT_METRICS_PORT;
        let info = HostInfo::peer("10.0.0.7:8084", port).unwrap();
        assert_eq!(info.address, "10.0.0.7");
        assert_eq!(
            info.metrics_url().as_deref(),
            Some("http://10.0.0.7:9184/metrics")
        );
        assert!(info.rpc_url.is_none());

        assert!(HostInfo::peer("10.0.0.7:abc", port).is_err());
        assert!(HostInfo::peer(":8084", port).is_err());
    }

    #[test]
    fn test_node_urls() {
        let info = HostInfo::node("127.0.0.1", 9000, 9184);
        assert_eq!(info.rpc_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(
            info.metrics_url().as_deref(),
            Some("http://127.0.0.1:9184/metrics")
        );
    }

    /// Readers racing a writer must always see a record from a single fetch.
    #[test]
    fn test_snapshot_replacement_is_atomic() {
        let host = Arc::new(Host::new(HostInfo::node("127.0.0.1", 9000, 9184)));
        let done = Arc::new(AtomicBool::new(false));

        // Every field of generation g carries the value g.
        let record = |g: u64| MetricsSnapshot {
            updated: true,
            generation: g,
            latest_checkpoint: Some(g),
            highest_known_checkpoint: Some(g),
            total_transaction_blocks: Some(g),
            version: Some(g.to_string()),
            ..Default::default()
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let host = Arc::clone(&host);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut reads = 0u64;
                    loop {
                        let finished = done.load(Ordering::Acquire);
                        let s = host.snapshot();
                        if s.updated {
                            let g = s.generation;
                            assert_eq!(s.latest_checkpoint, Some(g));
                            assert_eq!(s.highest_known_checkpoint, Some(g));
                            assert_eq!(s.total_transaction_blocks, Some(g));
                            assert_eq!(s.version.as_deref(), Some(g.to_string().as_str()));
                        } else {
                            assert_eq!(*s, MetricsSnapshot::default());
                        }
                        reads += 1;
                        if finished {
                            break;
                        }
                    }
                    reads
                })
            })
            .collect();

        for g in 1..=2_000 {
            host.replace(record(g));
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
        assert_eq!(host.snapshot().generation, 2_000);
    }
}
