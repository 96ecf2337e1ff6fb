//! Static per-table column layouts.
//!
//! A table is a list of bands. Each item of the table is printed as one row
//! per band, so wide tables wrap onto several rows instead of being cut.

use super::{ColumnName, TableType};
use ColumnName::*;

pub type Bands = &'static [&'static [ColumnName]];

const RPC: Bands = &[&[
    Index,
    Health,
    Address,
    PortRpc,
    TotalTransactionBlocks,
    TransactionsPerSecond,
    LatestCheckpoint,
    CheckpointsPerSecond,
    CurrentEpoch,
    Country,
]];

const NODE: Bands = &[
    &[
        Index, Health, Address, PortRpc, Uptime, Version, Commit, Country,
    ],
    &[
        TotalTransactionBlocks,
        TotalTransactionCertificates,
        TotalTransactionEffects,
        TxSyncPercentage,
        TransactionsPerSecond,
        CurrentEpoch,
        NetworkPeers,
    ],
    &[
        LatestCheckpoint,
        HighestKnownCheckpoint,
        HighestSyncedCheckpoint,
        LastExecutedCheckpoint,
        CheckpointExecBacklog,
        CheckpointSyncBacklog,
        CheckpointSyncPercentage,
        CheckpointsPerSecond,
    ],
];

const VALIDATOR: Bands = &[
    &[Index, Health, Address, Uptime, Version, Commit, Country],
    &[
        CurrentRound,
        HighestProcessedRound,
        LastCommittedRound,
        RoundsPerSecond,
        PrimaryNetworkPeers,
        WorkerNetworkPeers,
    ],
    &[
        SkippedConsensusTransactions,
        CertificatesCreated,
        NonConsensusLatency,
        TotalSignatureErrors,
        CertificatesPerSecond,
    ],
];

const PEERS: Bands = &[
    &[Index, Health, Address, Uptime, Version, Commit, Country],
    &[
        NetworkPeers,
        TotalTransactionCertificates,
        TotalTransactionEffects,
        HighestKnownCheckpoint,
        HighestSyncedCheckpoint,
        LastExecutedCheckpoint,
        CheckpointSyncPercentage,
    ],
];

const SYSTEM_STATE: Bands = &[
    &[
        SystemEpoch,
        SystemProtocolVersion,
        SystemEpochStartTimestamp,
        SystemEpochDuration,
        SystemTimeTillNextEpoch,
        SystemReferenceGasPrice,
    ],
    &[
        SystemTotalStake,
        SystemStorageFundTotalObjectStorageRebates,
        SystemStorageFundNonRefundableBalance,
    ],
    &[
        SystemMinReferenceGasPrice,
        SystemMaxReferenceGasPrice,
        SystemMeanReferenceGasPrice,
        SystemMedianReferenceGasPrice,
        SystemStakeWeightedMeanReferenceGasPrice,
        SystemEstimatedReferenceGasPrice,
    ],
    &[
        SystemStakeSubsidyStartEpoch,
        SystemStakeSubsidyBalance,
        SystemStakeSubsidyDistributionCounter,
        SystemStakeSubsidyCurrentDistributionAmount,
        SystemStakeSubsidyPeriodLength,
        SystemStakeSubsidyDecreaseRate,
    ],
];

const VALIDATORS_COUNTS: Bands = &[
    &[
        SystemMaxValidatorCount,
        SystemActiveValidatorCount,
        SystemPendingActiveValidatorCount,
        SystemValidatorCandidateCount,
        SystemPendingRemovalsCount,
        SystemAtRiskValidatorCount,
    ],
    &[
        SystemMinValidatorJoiningStake,
        SystemValidatorLowStakeThreshold,
        SystemValidatorVeryLowStakeThreshold,
        SystemValidatorLowStakeGracePeriod,
    ],
];

const VALIDATORS_AT_RISK: Bands = &[&[
    Index,
    AtRiskValidatorName,
    AtRiskValidatorAddress,
    AtRiskValidatorNumberOfEpochs,
]];

const VALIDATOR_REPORTS: Bands = &[&[
    Index,
    ReporterName,
    ReporterAddress,
    ReportedName,
    ReportedAddress,
    SlashingPercentage,
]];

const ACTIVE_VALIDATORS: Bands = &[
    &[
        Index,
        ValidatorName,
        ValidatorNetAddress,
        ValidatorVotingPower,
        ValidatorGasPrice,
        ValidatorCommissionRate,
        ValidatorApy,
    ],
    &[
        ValidatorNextEpochStake,
        ValidatorNextEpochGasPrice,
        ValidatorNextEpochCommissionRate,
        ValidatorStakingPoolSuiBalance,
        ValidatorRewardsPool,
        ValidatorPoolTokenBalance,
    ],
    &[
        ValidatorPendingStake,
        ValidatorPendingTotalSuiWithdraw,
        ValidatorPendingPoolTokenWithdraw,
    ],
];

/// Node dashboard cells, one band per dashboard row. The health cell sits in
/// the header bar and is listed separately in [`NODE_DASHBOARD_HEALTH`].
pub const NODE_DASHBOARD: Bands = &[
    &[CurrentEpoch, NetworkPeers, Uptime, Version, Commit],
    &[
        TotalTransactionBlocks,
        TotalTransactionCertificates,
        TotalTransactionEffects,
    ],
    &[
        LatestCheckpoint,
        HighestKnownCheckpoint,
        HighestSyncedCheckpoint,
        LastExecutedCheckpoint,
    ],
    &[
        TxSyncPercentage,
        CheckpointSyncPercentage,
        CheckpointExecBacklog,
        CheckpointSyncBacklog,
    ],
];

pub const NODE_DASHBOARD_HEALTH: ColumnName = Health;

/// Row bands of a table type.
pub fn table_bands(table: TableType) -> Bands {
    match table {
        TableType::Rpc => RPC,
        TableType::Node => NODE,
        TableType::Validator => VALIDATOR,
        TableType::Peers => PEERS,
        TableType::SystemState => SYSTEM_STATE,
        TableType::ValidatorsCounts => VALIDATORS_COUNTS,
        TableType::ValidatorsAtRisk => VALIDATORS_AT_RISK,
        TableType::ValidatorReports => VALIDATOR_REPORTS,
        TableType::ActiveValidators => ACTIVE_VALIDATORS,
    }
}

/// Declared columns of a table type, in band order.
pub fn table_columns(table: TableType) -> Vec<ColumnName> {
    table_bands(table)
        .iter()
        .flat_map(|band| band.iter().copied())
        .collect()
}

/// Every cell of the node dashboard, health first.
pub fn dashboard_columns() -> Vec<ColumnName> {
    std::iter::once(NODE_DASHBOARD_HEALTH)
        .chain(NODE_DASHBOARD.iter().flat_map(|band| band.iter().copied()))
        .collect()
}

/// Longer caption used on dashboard cell borders.
pub fn dashboard_caption(column: ColumnName) -> &'static str {
    match column {
        Health => "HEALTH",
        CurrentEpoch => "CURRENT EPOCH",
        NetworkPeers => "NETWORK PEERS",
        Uptime => "UPTIME",
        Version => "VERSION",
        Commit => "COMMIT",
        TotalTransactionBlocks => "TOTAL TRANSACTION BLOCKS",
        TotalTransactionCertificates => "TOTAL TRANSACTION CERTIFICATES",
        TotalTransactionEffects => "TOTAL TRANSACTION EFFECTS",
        LatestCheckpoint => "LATEST CHECKPOINT",
        HighestKnownCheckpoint => "HIGHEST KNOWN CHECKPOINT",
        HighestSyncedCheckpoint => "HIGHEST SYNCED CHECKPOINT",
        LastExecutedCheckpoint => "LAST EXECUTED CHECKPOINT",
        TxSyncPercentage => "TX SYNC PERCENTAGE",
        CheckpointSyncPercentage => "CHECKPOINTS SYNC PERCENTAGE",
        CheckpointExecBacklog => "CHECKPOINT EXEC BACKLOG",
        CheckpointSyncBacklog => "CHECKPOINT SYNC BACKLOG",
        other => other.caption(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_no_duplicate_columns_within_a_table() {
        for table in TableType::ALL {
            let columns = table_columns(table);
            let unique: BTreeSet<_> = columns.iter().collect();
            assert_eq!(unique.len(), columns.len(), "{} repeats a column", table);
        }
    }

    #[test]
    fn test_every_table_has_bands() {
        for table in TableType::ALL {
            assert!(table_bands(table).iter().all(|band| !band.is_empty()));
        }
    }

    #[test]
    fn test_dashboard_layout() {
        let columns = dashboard_columns();
        assert_eq!(columns[0], Health);
        assert_eq!(columns.len(), 17);
        assert_eq!(NODE_DASHBOARD.len(), 4);
    }
}
