//! Prometheus text exposition parsing for Sui node metrics.

use std::collections::HashMap;

use suimon_types::MetricsSnapshot;

use crate::error::FetchError;

const UPTIME: &str = "uptime";
const TOTAL_TRANSACTION_CERTIFICATES: &str = "total_transaction_certificates";
const TOTAL_TRANSACTION_EFFECTS: &str = "total_transaction_effects";
const SKIPPED_CONSENSUS_TRANSACTIONS: &str = "skipped_consensus_txns";
const CERTIFICATES_CREATED: &str = "num_certificates_created";
const NON_CONSENSUS_LATENCY_SUM: &str = "fullnode_handle_certificate_non_consensus_latency_sum";
const TOTAL_SIGNATURE_ERRORS: &str = "total_signature_errors";
const HIGHEST_KNOWN_CHECKPOINT: &str = "highest_known_checkpoint";
const HIGHEST_SYNCED_CHECKPOINT: &str = "highest_synced_checkpoint";
const LAST_EXECUTED_CHECKPOINT: &str = "last_executed_checkpoint";
const CURRENT_ROUND: &str = "current_round";
const HIGHEST_PROCESSED_ROUND: &str = "highest_processed_round";
const LAST_COMMITTED_ROUND: &str = "last_committed_round";
const NETWORK_PEERS: &str = "sui_network_peers";
const PRIMARY_NETWORK_PEERS: &str = "primary_network_peers";
const WORKER_NETWORK_PEERS: &str = "worker_network_peers";
const CURRENT_EPOCH: &str = "current_epoch";

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq)]
struct Series {
    labels: Vec<(String, String)>,
    value: f64,
}

/// Parsed samples of one `/metrics` response.
///
/// Series sharing a metric name are summed; labels are kept from the first.
#[derive(Debug, Clone, Default)]
pub struct PrometheusMetrics {
    series: HashMap<String, Series>,
}

impl PrometheusMetrics {
    pub fn parse(body: &str) -> Self {
        let mut series: HashMap<String, Series> = HashMap::new();

        for line in body.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, labels, value)) = parse_sample(line) else {
                continue;
            };
            series
                .entry(name)
                .and_modify(|s| s.value += value)
                .or_insert(Series { labels, value });
        }

        Self { series }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.series.get(name).map(|s| s.value)
    }

    /// Value as a non-negative integer counter.
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.value(name)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    }

    pub fn label(&self, name: &str, label: &str) -> Option<&str> {
        self.series
            .get(name)?
            .labels
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, v)| v.as_str())
    }

    /// Copy the known metrics into a snapshot.
    ///
    /// Fails when the response does not look like a Sui node at all.
    pub fn apply(&self, snapshot: &mut MetricsSnapshot) -> Result<(), FetchError> {
        let uptime = self
            .value(UPTIME)
            .ok_or_else(|| FetchError::MissingMetric(UPTIME.to_string()))?;
        snapshot.uptime = Some(format!("{:.2}", uptime / SECONDS_PER_DAY));

        if let Some(full) = self.label(UPTIME, "version") {
            let (version, commit) = split_version(full);
            snapshot.version = Some(version.to_string());
            snapshot.commit = commit.map(str::to_string);
        }

        snapshot.total_transaction_certificates = self.counter(TOTAL_TRANSACTION_CERTIFICATES);
        snapshot.total_transaction_effects = self.counter(TOTAL_TRANSACTION_EFFECTS);
        snapshot.skipped_consensus_transactions = self.counter(SKIPPED_CONSENSUS_TRANSACTIONS);
        snapshot.certificates_created = self.counter(CERTIFICATES_CREATED);
        snapshot.non_consensus_latency_sum = self.counter(NON_CONSENSUS_LATENCY_SUM);
        snapshot.total_signature_errors = self.counter(TOTAL_SIGNATURE_ERRORS);
        snapshot.highest_known_checkpoint = self.counter(HIGHEST_KNOWN_CHECKPOINT);
        snapshot.highest_synced_checkpoint = self.counter(HIGHEST_SYNCED_CHECKPOINT);
        snapshot.last_executed_checkpoint = self.counter(LAST_EXECUTED_CHECKPOINT);
        snapshot.current_round = self.counter(CURRENT_ROUND);
        snapshot.highest_processed_round = self.counter(HIGHEST_PROCESSED_ROUND);
        snapshot.last_committed_round = self.counter(LAST_COMMITTED_ROUND);
        snapshot.network_peers = self.counter(NETWORK_PEERS);
        snapshot.primary_network_peers = self.counter(PRIMARY_NETWORK_PEERS);
        snapshot.worker_network_peers = self.counter(WORKER_NETWORK_PEERS);

        if let Some(epoch) = self.counter(CURRENT_EPOCH) {
            snapshot.current_epoch = Some(epoch);
        }

        Ok(())
    }
}

/// `1.20.0-abc123` splits into version `1.20.0` and commit `abc123`.
fn split_version(full: &str) -> (&str, Option<&str>) {
    match full.split_once('-') {
        Some((version, commit)) if !commit.is_empty() => (version, Some(commit)),
        _ => (full.trim_end_matches('-'), None),
    }
}

/// Parse `name{a="b",c="d"} 42 [timestamp]`.
fn parse_sample(line: &str) -> Option<(String, Vec<(String, String)>, f64)> {
    let name_end = line.find(|c: char| c == '{' || c.is_whitespace())?;
    let name = &line[..name_end];
    let mut rest = &line[name_end..];

    let labels = if rest.starts_with('{') {
        let close = rest.rfind('}')?;
        let labels = parse_labels(&rest[1..close]);
        rest = &rest[close + 1..];
        labels
    } else {
        Vec::new()
    };

    let value = rest.split_whitespace().next()?;
    let value = match value {
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        other => other.parse().ok()?,
    };

    Some((name.to_string(), labels, value))
}

fn parse_labels(raw: &str) -> Vec<(String, String)> {
    let mut labels = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        let key: String = chars
            .by_ref()
            .skip_while(|c| *c == ',' || c.is_whitespace())
            .take_while(|c| *c != '=')
            .collect();
        if key.is_empty() || chars.next() != Some('"') {
            break;
        }

        let mut value = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        value.push(if escaped == 'n' { '\n' } else { escaped });
                    }
                }
                '"' => break,
                c => value.push(c),
            }
        }

        labels.push((key.trim().to_string(), value));
    }

    labels
}
