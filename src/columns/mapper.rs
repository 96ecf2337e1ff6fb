//! Snapshot to column-value mapping.
//!
//! Pure functions: the same input always yields the same map. Each function
//! returns exactly the columns [`layout`](super::layout) declares for its
//! table type, with [`ColumnValue::Missing`] standing in for absent data.

use chrono::{DateTime, Utc};
use suimon_types::{
    MetricsSnapshot, SystemState, ValidatorAtRisk, ValidatorReport, ValidatorSummary,
    MIST_PER_SUI,
};

use super::ColumnName::*;
use super::{ColumnValue, ColumnValues};
use crate::host::{HostInfo, HostStatus};

/// Everything the host-table mappers read for one host.
#[derive(Debug, Clone, Copy)]
pub struct HostRecord<'a> {
    /// Position of the host in its group, used only for numbering.
    pub index: usize,
    pub info: &'a HostInfo,
    pub snapshot: &'a MetricsSnapshot,
    pub status: HostStatus,
}

fn ordinal(index: usize) -> ColumnValue {
    ColumnValue::Number(index as u64 + 1)
}

fn port(port: Option<u16>) -> ColumnValue {
    port.map(u64::from).into()
}

fn sui(mist: u64) -> ColumnValue {
    ColumnValue::Number(mist / MIST_PER_SUI)
}

fn basis_points(bps: u64) -> ColumnValue {
    ColumnValue::Percent(bps / 100)
}

fn current_epoch(snapshot: &MetricsSnapshot) -> Option<u64> {
    snapshot
        .current_epoch
        .or_else(|| snapshot.system_state.as_ref().map(|state| state.epoch))
}

fn utc_timestamp(ms: u64) -> ColumnValue {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .into()
}

fn hours_minutes(ms: u64) -> ColumnValue {
    let minutes = ms / 60_000;
    ColumnValue::Text(format!("{}h {:02}m", minutes / 60, minutes % 60))
}

pub fn rpc_columns(record: &HostRecord) -> ColumnValues {
    let s = record.snapshot;
    ColumnValues::from([
        (Index, ordinal(record.index)),
        (Health, record.status.into()),
        (Address, record.info.address.as_str().into()),
        (PortRpc, port(record.info.rpc_port)),
        (TotalTransactionBlocks, s.total_transaction_blocks.into()),
        (TransactionsPerSecond, s.transactions_per_second.into()),
        (LatestCheckpoint, s.latest_checkpoint.into()),
        (CheckpointsPerSecond, s.checkpoints_per_second.into()),
        (CurrentEpoch, current_epoch(s).into()),
        (Country, record.info.location.country.as_deref().into()),
    ])
}

pub fn node_columns(record: &HostRecord) -> ColumnValues {
    let s = record.snapshot;
    ColumnValues::from([
        (Index, ordinal(record.index)),
        (Health, record.status.into()),
        (Address, record.info.address.as_str().into()),
        (PortRpc, port(record.info.rpc_port)),
        (Uptime, s.uptime.as_deref().into()),
        (Version, s.version.as_deref().into()),
        (Commit, s.commit.as_deref().into()),
        (Country, record.info.location.country.as_deref().into()),
        (TotalTransactionBlocks, s.total_transaction_blocks.into()),
        (
            TotalTransactionCertificates,
            s.total_transaction_certificates.into(),
        ),
        (TotalTransactionEffects, s.total_transaction_effects.into()),
        (
            TxSyncPercentage,
            ColumnValue::percent(s.tx_sync_percentage()),
        ),
        (TransactionsPerSecond, s.transactions_per_second.into()),
        (CurrentEpoch, current_epoch(s).into()),
        (NetworkPeers, s.network_peers.into()),
        (LatestCheckpoint, s.latest_checkpoint.into()),
        (HighestKnownCheckpoint, s.highest_known_checkpoint.into()),
        (HighestSyncedCheckpoint, s.highest_synced_checkpoint.into()),
        (LastExecutedCheckpoint, s.last_executed_checkpoint.into()),
        (CheckpointExecBacklog, s.checkpoint_exec_backlog().into()),
        (CheckpointSyncBacklog, s.checkpoint_sync_backlog().into()),
        (
            CheckpointSyncPercentage,
            ColumnValue::percent(s.checkpoint_sync_percentage()),
        ),
        (CheckpointsPerSecond, s.checkpoints_per_second.into()),
    ])
}

pub fn validator_columns(record: &HostRecord) -> ColumnValues {
    let s = record.snapshot;
    ColumnValues::from([
        (Index, ordinal(record.index)),
        (Health, record.status.into()),
        (Address, record.info.address.as_str().into()),
        (Uptime, s.uptime.as_deref().into()),
        (Version, s.version.as_deref().into()),
        (Commit, s.commit.as_deref().into()),
        (Country, record.info.location.country.as_deref().into()),
        (CurrentRound, s.current_round.into()),
        (HighestProcessedRound, s.highest_processed_round.into()),
        (LastCommittedRound, s.last_committed_round.into()),
        (RoundsPerSecond, s.rounds_per_second.into()),
        (PrimaryNetworkPeers, s.primary_network_peers.into()),
        (WorkerNetworkPeers, s.worker_network_peers.into()),
        (
            SkippedConsensusTransactions,
            s.skipped_consensus_transactions.into(),
        ),
        (CertificatesCreated, s.certificates_created.into()),
        (NonConsensusLatency, s.non_consensus_latency_sum.into()),
        (TotalSignatureErrors, s.total_signature_errors.into()),
        (CertificatesPerSecond, s.certificates_per_second.into()),
    ])
}

pub fn peer_columns(record: &HostRecord) -> ColumnValues {
    let s = record.snapshot;
    ColumnValues::from([
        (Index, ordinal(record.index)),
        (Health, record.status.into()),
        (Address, record.info.address.as_str().into()),
        (Uptime, s.uptime.as_deref().into()),
        (Version, s.version.as_deref().into()),
        (Commit, s.commit.as_deref().into()),
        (Country, record.info.location.country.as_deref().into()),
        (NetworkPeers, s.network_peers.into()),
        (
            TotalTransactionCertificates,
            s.total_transaction_certificates.into(),
        ),
        (TotalTransactionEffects, s.total_transaction_effects.into()),
        (HighestKnownCheckpoint, s.highest_known_checkpoint.into()),
        (HighestSyncedCheckpoint, s.highest_synced_checkpoint.into()),
        (LastExecutedCheckpoint, s.last_executed_checkpoint.into()),
        (
            CheckpointSyncPercentage,
            ColumnValue::percent(s.checkpoint_sync_percentage()),
        ),
    ])
}

/// Cells of the live node dashboard.
pub fn node_dashboard_columns(record: &HostRecord) -> ColumnValues {
    let s = record.snapshot;
    ColumnValues::from([
        (Health, record.status.into()),
        (CurrentEpoch, current_epoch(s).into()),
        (NetworkPeers, s.network_peers.into()),
        (Uptime, s.uptime.as_deref().into()),
        (Version, s.version.as_deref().into()),
        (Commit, s.commit.as_deref().into()),
        (TotalTransactionBlocks, s.total_transaction_blocks.into()),
        (
            TotalTransactionCertificates,
            s.total_transaction_certificates.into(),
        ),
        (TotalTransactionEffects, s.total_transaction_effects.into()),
        (LatestCheckpoint, s.latest_checkpoint.into()),
        (HighestKnownCheckpoint, s.highest_known_checkpoint.into()),
        (HighestSyncedCheckpoint, s.highest_synced_checkpoint.into()),
        (LastExecutedCheckpoint, s.last_executed_checkpoint.into()),
        (
            TxSyncPercentage,
            ColumnValue::percent(s.tx_sync_percentage()),
        ),
        (
            CheckpointSyncPercentage,
            ColumnValue::percent(s.checkpoint_sync_percentage()),
        ),
        (CheckpointExecBacklog, s.checkpoint_exec_backlog().into()),
        (CheckpointSyncBacklog, s.checkpoint_sync_backlog().into()),
    ])
}

pub fn system_state_columns(state: &SystemState) -> ColumnValues {
    let gas = state.gas_price_stats();
    let gas_stat = |pick: fn(&suimon_types::GasPriceStats) -> u64| -> ColumnValue {
        gas.as_ref().map(pick).into()
    };

    ColumnValues::from([
        (SystemEpoch, state.epoch.into()),
        (SystemProtocolVersion, state.protocol_version.into()),
        (
            SystemEpochStartTimestamp,
            utc_timestamp(state.epoch_start_timestamp_ms),
        ),
        (SystemEpochDuration, hours_minutes(state.epoch_duration_ms)),
        (
            SystemTimeTillNextEpoch,
            state
                .time_till_next_epoch_ms
                .map_or(ColumnValue::Missing, hours_minutes),
        ),
        (SystemReferenceGasPrice, state.reference_gas_price.into()),
        (SystemTotalStake, sui(state.total_stake)),
        (
            SystemStorageFundTotalObjectStorageRebates,
            sui(state.storage_fund_total_object_storage_rebates),
        ),
        (
            SystemStorageFundNonRefundableBalance,
            sui(state.storage_fund_non_refundable_balance),
        ),
        (SystemMinReferenceGasPrice, gas_stat(|g| g.min)),
        (SystemMaxReferenceGasPrice, gas_stat(|g| g.max)),
        (SystemMeanReferenceGasPrice, gas_stat(|g| g.mean)),
        (SystemMedianReferenceGasPrice, gas_stat(|g| g.median)),
        (
            SystemStakeWeightedMeanReferenceGasPrice,
            gas_stat(|g| g.stake_weighted_mean),
        ),
        (
            SystemEstimatedReferenceGasPrice,
            gas_stat(|g| g.estimated_reference),
        ),
        (
            SystemStakeSubsidyStartEpoch,
            state.stake_subsidy_start_epoch.into(),
        ),
        (SystemStakeSubsidyBalance, sui(state.stake_subsidy_balance)),
        (
            SystemStakeSubsidyDistributionCounter,
            state.stake_subsidy_distribution_counter.into(),
        ),
        (
            SystemStakeSubsidyCurrentDistributionAmount,
            sui(state.stake_subsidy_current_distribution_amount),
        ),
        (
            SystemStakeSubsidyPeriodLength,
            state.stake_subsidy_period_length.into(),
        ),
        (
            SystemStakeSubsidyDecreaseRate,
            basis_points(state.stake_subsidy_decrease_rate),
        ),
    ])
}

pub fn validator_counts_columns(state: &SystemState) -> ColumnValues {
    ColumnValues::from([
        (SystemMaxValidatorCount, state.max_validator_count.into()),
        (
            SystemActiveValidatorCount,
            state.active_validator_count().into(),
        ),
        (
            SystemPendingActiveValidatorCount,
            state.pending_active_validators_size.into(),
        ),
        (
            SystemValidatorCandidateCount,
            state.validator_candidates_size.into(),
        ),
        (
            SystemPendingRemovalsCount,
            state.pending_removals_count.into(),
        ),
        (
            SystemAtRiskValidatorCount,
            state.at_risk_validator_count().into(),
        ),
        (
            SystemMinValidatorJoiningStake,
            sui(state.min_validator_joining_stake),
        ),
        (
            SystemValidatorLowStakeThreshold,
            sui(state.validator_low_stake_threshold),
        ),
        (
            SystemValidatorVeryLowStakeThreshold,
            sui(state.validator_very_low_stake_threshold),
        ),
        (
            SystemValidatorLowStakeGracePeriod,
            state.validator_low_stake_grace_period.into(),
        ),
    ])
}

pub fn validator_at_risk_columns(index: usize, validator: &ValidatorAtRisk) -> ColumnValues {
    ColumnValues::from([
        (Index, ordinal(index)),
        (AtRiskValidatorName, validator.name.as_str().into()),
        (AtRiskValidatorAddress, validator.address.as_str().into()),
        (
            AtRiskValidatorNumberOfEpochs,
            validator.epochs_at_risk.into(),
        ),
    ])
}

pub fn validator_report_columns(index: usize, report: &ValidatorReport) -> ColumnValues {
    ColumnValues::from([
        (Index, ordinal(index)),
        (ReporterName, report.reporter_name.as_str().into()),
        (ReporterAddress, report.reporter_address.as_str().into()),
        (ReportedName, report.reported_name.as_str().into()),
        (ReportedAddress, report.reported_address.as_str().into()),
        (
            SlashingPercentage,
            ColumnValue::Percent(report.slashing_percentage),
        ),
    ])
}

pub fn active_validator_columns(index: usize, validator: &ValidatorSummary) -> ColumnValues {
    ColumnValues::from([
        (Index, ordinal(index)),
        (ValidatorName, validator.name.as_str().into()),
        (ValidatorNetAddress, validator.net_address.as_str().into()),
        (ValidatorVotingPower, validator.voting_power.into()),
        (ValidatorGasPrice, validator.gas_price.into()),
        (
            ValidatorCommissionRate,
            basis_points(validator.commission_rate),
        ),
        (ValidatorApy, validator.apy.into()),
        (ValidatorNextEpochStake, sui(validator.next_epoch_stake)),
        (
            ValidatorNextEpochGasPrice,
            validator.next_epoch_gas_price.into(),
        ),
        (
            ValidatorNextEpochCommissionRate,
            basis_points(validator.next_epoch_commission_rate),
        ),
        (
            ValidatorStakingPoolSuiBalance,
            sui(validator.staking_pool_sui_balance),
        ),
        (ValidatorRewardsPool, sui(validator.rewards_pool)),
        (ValidatorPoolTokenBalance, sui(validator.pool_token_balance)),
        (ValidatorPendingStake, sui(validator.pending_stake)),
        (
            ValidatorPendingTotalSuiWithdraw,
            sui(validator.pending_total_sui_withdraw),
        ),
        (
            ValidatorPendingPoolTokenWithdraw,
            sui(validator.pending_pool_token_withdraw),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::columns::layout::{dashboard_columns, table_columns};
    use crate::columns::{ColumnName, TableType};
    use crate::host::{HostInfo, Location};
    use crate::orchestrator::GroupKind;

    fn keys(values: &ColumnValues) -> BTreeSet<ColumnName> {
        values.keys().copied().collect()
    }

    fn declared(table: TableType) -> BTreeSet<ColumnName> {
        table_columns(table).into_iter().collect()
    }

    fn info() -> HostInfo {
        HostInfo {
            group: GroupKind::Node,
            address: "10.0.0.1".to_string(),
            rpc_port: Some(9000),
            metrics_port: Some(9184),
            rpc_url: Some("http://10.0.0.1:9000".to_string()),
            location: Location {
                country: Some("Iceland".to_string()),
            },
        }
    }

    fn full_snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            updated: true,
            generation: 4,
            total_transaction_blocks: Some(1_000),
            total_transaction_certificates: Some(200),
            total_transaction_effects: Some(84),
            latest_checkpoint: Some(500),
            highest_known_checkpoint: Some(500),
            highest_synced_checkpoint: Some(490),
            last_executed_checkpoint: Some(480),
            network_peers: Some(12),
            uptime: Some("3.25".to_string()),
            version: Some("1.20.0".to_string()),
            commit: Some("abc123".to_string()),
            system_state: Some(SystemState {
                epoch: 77,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_host_tables_match_declared_columns() {
        let info = info();
        for snapshot in [MetricsSnapshot::default(), full_snapshot()] {
            let record = HostRecord {
                index: 0,
                info: &info,
                snapshot: &snapshot,
                status: HostStatus::Green,
            };
            assert_eq!(keys(&rpc_columns(&record)), declared(TableType::Rpc));
            assert_eq!(keys(&node_columns(&record)), declared(TableType::Node));
            assert_eq!(
                keys(&validator_columns(&record)),
                declared(TableType::Validator)
            );
            assert_eq!(keys(&peer_columns(&record)), declared(TableType::Peers));

            let dashboard: BTreeSet<_> = dashboard_columns().into_iter().collect();
            assert_eq!(keys(&node_dashboard_columns(&record)), dashboard);
        }
    }

    #[test]
    fn test_system_tables_match_declared_columns() {
        for state in [
            SystemState::default(),
            SystemState {
                active_validators: vec![ValidatorSummary::default()],
                time_till_next_epoch_ms: Some(60_000),
                ..Default::default()
            },
        ] {
            assert_eq!(
                keys(&system_state_columns(&state)),
                declared(TableType::SystemState)
            );
            assert_eq!(
                keys(&validator_counts_columns(&state)),
                declared(TableType::ValidatorsCounts)
            );
        }

        assert_eq!(
            keys(&validator_at_risk_columns(0, &ValidatorAtRisk::default())),
            declared(TableType::ValidatorsAtRisk)
        );
        assert_eq!(
            keys(&validator_report_columns(0, &ValidatorReport::default())),
            declared(TableType::ValidatorReports)
        );
        assert_eq!(
            keys(&active_validator_columns(0, &ValidatorSummary::default())),
            declared(TableType::ActiveValidators)
        );
    }

    #[test]
    fn test_percentages_render_with_suffix() {
        let info = info();
        let snapshot = full_snapshot();
        let record = HostRecord {
            index: 2,
            info: &info,
            snapshot: &snapshot,
            status: HostStatus::Yellow,
        };

        let values = node_columns(&record);
        assert_eq!(values[&TxSyncPercentage].to_string(), "42%");
        assert_eq!(values[&CheckpointSyncPercentage].to_string(), "98%");
        assert_eq!(values[&Index], ColumnValue::Number(3));
        assert_eq!(values[&CurrentEpoch], ColumnValue::Number(77));
        assert_eq!(values[&CheckpointExecBacklog], ColumnValue::Number(10));
        assert_eq!(values[&Country].to_string(), "Iceland");
    }

    #[test]
    fn test_missing_metrics_become_placeholders() {
        let info = info();
        let snapshot = MetricsSnapshot::default();
        let record = HostRecord {
            index: 0,
            info: &info,
            snapshot: &snapshot,
            status: HostStatus::Grey,
        };

        let values = node_dashboard_columns(&record);
        assert!(values[&TxSyncPercentage].is_missing());
        assert!(values[&Version].is_missing());
        assert_eq!(values[&Health], ColumnValue::Status(HostStatus::Grey));
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let info = info();
        let snapshot = full_snapshot();
        let record = HostRecord {
            index: 0,
            info: &info,
            snapshot: &snapshot,
            status: HostStatus::Green,
        };
        assert_eq!(node_columns(&record), node_columns(&record));
    }

    #[test]
    fn test_system_state_formatting() {
        let state = SystemState {
            epoch_start_timestamp_ms: 1_700_000_000_000,
            epoch_duration_ms: 86_400_000,
            time_till_next_epoch_ms: Some(5_400_000),
            total_stake: 7 * MIST_PER_SUI,
            stake_subsidy_decrease_rate: 1_000,
            ..Default::default()
        };

        let values = system_state_columns(&state);
        assert_eq!(
            values[&SystemEpochStartTimestamp].to_string(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(values[&SystemEpochDuration].to_string(), "24h 00m");
        assert_eq!(values[&SystemTimeTillNextEpoch].to_string(), "1h 30m");
        assert_eq!(values[&SystemTotalStake], ColumnValue::Number(7));
        assert_eq!(values[&SystemStakeSubsidyDecreaseRate].to_string(), "10%");
        assert!(values[&SystemMinReferenceGasPrice].is_missing());
    }
}
