//! Per-host metrics snapshot.

use crate::SystemState;

/// The complete result of one successful fetch for one host.
///
/// Snapshots are never patched in place: a poller builds a fresh value from a
/// single fetch and swaps it in as a whole. The [`Default`] value is the
/// "never fetched" state (`updated == false`, every metric absent).
///
/// Counters a host does not expose (a peer has no JSON-RPC endpoint, a full
/// node has no consensus rounds) stay `None`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    /// True once the owning host has completed at least one fetch.
    pub updated: bool,

    /// Number of successful fetches that led to this record.
    pub generation: u64,

    /// Unix timestamp in milliseconds when the fetch completed.
    pub fetched_at_ms: u64,

    // Transactions
    pub total_transaction_blocks: Option<u64>,
    pub total_transaction_certificates: Option<u64>,
    pub total_transaction_effects: Option<u64>,
    pub skipped_consensus_transactions: Option<u64>,
    pub certificates_created: Option<u64>,
    pub non_consensus_latency_sum: Option<u64>,
    pub total_signature_errors: Option<u64>,
    pub transactions_per_second: Option<f64>,
    pub certificates_per_second: Option<f64>,

    // Checkpoints
    pub latest_checkpoint: Option<u64>,
    pub highest_known_checkpoint: Option<u64>,
    pub highest_synced_checkpoint: Option<u64>,
    pub last_executed_checkpoint: Option<u64>,
    pub checkpoints_per_second: Option<f64>,

    // Consensus rounds (validators only)
    pub current_round: Option<u64>,
    pub highest_processed_round: Option<u64>,
    pub last_committed_round: Option<u64>,
    pub rounds_per_second: Option<f64>,

    // Peers
    pub network_peers: Option<u64>,
    pub primary_network_peers: Option<u64>,
    pub worker_network_peers: Option<u64>,

    // Node
    pub current_epoch: Option<u64>,
    /// Uptime already formatted for display (days with two decimals).
    pub uptime: Option<String>,
    pub version: Option<String>,
    pub commit: Option<String>,

    /// On-chain system state, for hosts queried over JSON-RPC.
    pub system_state: Option<SystemState>,
}

impl MetricsSnapshot {
    /// Checkpoints synced but not yet executed.
    pub fn checkpoint_exec_backlog(&self) -> Option<u64> {
        let synced = self.highest_synced_checkpoint?;
        let executed = self.last_executed_checkpoint?;
        Some(synced.saturating_sub(executed))
    }

    /// Checkpoints known to the network but not yet synced.
    pub fn checkpoint_sync_backlog(&self) -> Option<u64> {
        let known = self.highest_known_checkpoint?;
        let synced = self.highest_synced_checkpoint?;
        Some(known.saturating_sub(synced))
    }

    /// Share of known checkpoints this host has synced, in whole percent.
    pub fn checkpoint_sync_percentage(&self) -> Option<u64> {
        let synced = self.highest_synced_checkpoint?;
        percentage(synced, self.highest_known_checkpoint?)
    }

    /// Share of certified transactions this host has executed, in whole percent.
    pub fn tx_sync_percentage(&self) -> Option<u64> {
        percentage(
            self.total_transaction_effects?,
            self.total_transaction_certificates?,
        )
    }

    /// Fill the per-second rates from the counters of the record this one replaces.
    ///
    /// Rates stay `None` when there is no earlier successful fetch, when no
    /// time has elapsed, or when a counter went backwards (node restart).
    pub fn derive_rates(&mut self, previous: &MetricsSnapshot) {
        if !previous.updated || self.fetched_at_ms <= previous.fetched_at_ms {
            return;
        }

        let elapsed_secs = (self.fetched_at_ms - previous.fetched_at_ms) as f64 / 1_000.0;
        let rate = |current: Option<u64>, before: Option<u64>| -> Option<f64> {
            let (current, before) = (current?, before?);
            (current >= before).then(|| (current - before) as f64 / elapsed_secs)
        };

        self.transactions_per_second = rate(
            self.total_transaction_blocks.or(self.total_transaction_effects),
            previous.total_transaction_blocks.or(previous.total_transaction_effects),
        );
        self.certificates_per_second = rate(
            self.total_transaction_certificates,
            previous.total_transaction_certificates,
        );
        self.checkpoints_per_second = rate(
            self.last_executed_checkpoint.or(self.latest_checkpoint),
            previous.last_executed_checkpoint.or(previous.latest_checkpoint),
        );
        self.rounds_per_second = rate(self.current_round, previous.current_round);
    }
}

fn percentage(part: u64, whole: u64) -> Option<u64> {
    if whole == 0 {
        return None;
    }
    let pct = (part as u128 * 100 / whole as u128) as u64;
    Some(pct.min(100))
}
