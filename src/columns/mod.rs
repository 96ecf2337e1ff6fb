//! Column namespace, display values and table types.
//!
//! Every displayable metric has exactly one [`ColumnName`]. Each
//! [`TableType`] declares an ordered subset of them in [`layout`], and the
//! functions in [`mapper`] turn a snapshot into a [`ColumnValues`] map whose
//! key set is exactly that subset.
//!
//! ```text
//! MetricsSnapshot ──▶ mapper::*_columns() ──▶ ColumnValues ──▶ TableBuilder / RefreshLoop
//!                                                   ▲
//!                         layout::table_bands() ────┘ (declared key set)
//! ```

pub mod layout;
pub mod mapper;

use std::collections::BTreeMap;
use std::fmt;

use crate::host::HostStatus;
use crate::orchestrator::GroupKind;

/// Mapping from column to display value for one table item.
pub type ColumnValues = BTreeMap<ColumnName, ColumnValue>;

macro_rules! column_names {
    ($($(#[$meta:meta])* $variant:ident => $id:literal, $caption:literal;)+) => {
        /// Identifier of a single displayable metric.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ColumnName {
            $($(#[$meta])* $variant,)+
        }

        impl ColumnName {
            /// Every column, in declaration order.
            pub const ALL: &'static [ColumnName] = &[$(ColumnName::$variant,)+];

            /// Stable identifier used in logs and error messages.
            pub fn id(&self) -> &'static str {
                match self {
                    $(ColumnName::$variant => $id,)+
                }
            }

            /// Table header caption. May span several lines.
            pub fn caption(&self) -> &'static str {
                match self {
                    $(ColumnName::$variant => $caption,)+
                }
            }
        }
    };
}

column_names! {
    // Overview
    Index => "IDX", "IDX";
    Health => "HEALTH", "HEALTH";
    Address => "ADDRESS", "ADDRESS";
    PortRpc => "PORT_RPC", "RPC";
    Uptime => "UPTIME", "UPTIME DAYS";
    Version => "VERSION", "VERSION";
    Commit => "COMMIT", "COMMIT";
    Country => "COUNTRY", "COUNTRY";

    // Transactions
    TotalTransactionBlocks => "TOTAL_TX_BLOCKS", "TOTAL TX\nBLOCKS";
    TotalTransactionCertificates => "TOTAL_TX_CERTIFICATES", "TOTAL TX\nCERTIFICATES";
    TotalTransactionEffects => "TOTAL_TX_EFFECTS", "TOTAL TX\nEFFECTS";
    TxSyncPercentage => "TX_SYNC_PCT", "TX SYNC PCT";
    SkippedConsensusTransactions => "SKIPPED_CONSENSUS_TX", "SKIPPED\nCONSENSUS TX";
    CertificatesCreated => "CERTIFICATES_CREATED", "CERTIFICATES\nCREATED";
    NonConsensusLatency => "NON_CONSENSUS_LATENCY", "CERTIFICATE\nNON CONSENSUS LATENCY";
    TotalSignatureErrors => "SIGNATURE_ERRORS", "SIGNATURE\nERRORS";
    TransactionsPerSecond => "TPS", "TRANSACTIONS\nPER SECOND";
    CertificatesPerSecond => "CPS", "CERTIFICATES\nPER SECOND";

    // Checkpoints
    LatestCheckpoint => "LATEST_CHECKPOINT", "LATEST\nCHECKPOINT";
    HighestKnownCheckpoint => "HIGHEST_KNOWN_CHECKPOINT", "HIGHEST KNOWN\nCHECKPOINT";
    LastExecutedCheckpoint => "LAST_EXECUTED_CHECKPOINT", "LAST EXECUTED\nCHECKPOINT";
    HighestSyncedCheckpoint => "HIGHEST_SYNCED_CHECKPOINT", "HIGHEST SYNCED\nCHECKPOINT";
    CheckpointExecBacklog => "CHECKPOINT_EXEC_BACKLOG", "CHECKPOINT\nEXEC BACKLOG";
    CheckpointSyncBacklog => "CHECKPOINT_SYNC_BACKLOG", "CHECKPOINT\nSYNC BACKLOG";
    CheckpointSyncPercentage => "CHECKPOINT_SYNC_PCT", "CHECKPOINT\nSYNC PCT";
    CheckpointsPerSecond => "CHECKPOINTS_PER_SECOND", "CHECKPOINTS\nPER SECOND";

    // Consensus rounds
    CurrentRound => "CURRENT_ROUND", "CURRENT\nROUND";
    HighestProcessedRound => "HIGHEST_PROCESSED_ROUND", "HIGHEST\nPROCESSED ROUND";
    LastCommittedRound => "LAST_COMMITTED_ROUND", "LAST COMMITTED\nROUND";
    RoundsPerSecond => "ROUNDS_PER_SECOND", "ROUNDS\nPER SECOND";

    // Peers
    NetworkPeers => "NETWORK_PEERS", "NETWORK\nPEERS";
    PrimaryNetworkPeers => "PRIMARY_NETWORK_PEERS", "PRIMARY\nNETWORK PEERS";
    WorkerNetworkPeers => "WORKER_NETWORK_PEERS", "WORKER\nNETWORK PEERS";

    // Active validators
    ValidatorName => "VALIDATOR_NAME", "NAME";
    ValidatorNetAddress => "VALIDATOR_NET_ADDRESS", "NET ADDRESS";
    ValidatorVotingPower => "VALIDATOR_VOTING_POWER", "VOTING\nPOWER";
    ValidatorGasPrice => "VALIDATOR_GAS_PRICE", "GAS\nPRICE";
    ValidatorCommissionRate => "VALIDATOR_COMMISSION_RATE", "COMMISSION\nRATE";
    ValidatorNextEpochStake => "VALIDATOR_NEXT_EPOCH_STAKE", "NEXT EPOCH\nSTAKE, SUI";
    ValidatorNextEpochGasPrice => "VALIDATOR_NEXT_EPOCH_GAS_PRICE", "NEXT EPOCH\nGAS PRICE";
    ValidatorNextEpochCommissionRate => "VALIDATOR_NEXT_EPOCH_COMMISSION_RATE", "NEXT EPOCH\nCOMMISSION RATE";
    ValidatorStakingPoolSuiBalance => "VALIDATOR_STAKING_POOL_BALANCE", "STAKING POOL SUI\nBALANCE, SUI";
    ValidatorRewardsPool => "VALIDATOR_REWARDS_POOL", "REWARDS POOL, SUI";
    ValidatorPoolTokenBalance => "VALIDATOR_POOL_TOKEN_BALANCE", "POOL TOKEN\nBALANCE, SUI";
    ValidatorPendingStake => "VALIDATOR_PENDING_STAKE", "PENDING STAKE, SUI";
    ValidatorPendingTotalSuiWithdraw => "VALIDATOR_PENDING_SUI_WITHDRAW", "PENDING TOTAL\nSUI WITHDRAW";
    ValidatorPendingPoolTokenWithdraw => "VALIDATOR_PENDING_POOL_TOKEN_WITHDRAW", "PENDING POOL\nTOKEN WITHDRAW";
    ValidatorApy => "VALIDATOR_APY", "APY, %";

    // System state
    CurrentEpoch => "CURRENT_EPOCH", "CURRENT\nEPOCH";
    SystemEpoch => "SYSTEM_EPOCH", "EPOCH";
    SystemProtocolVersion => "SYSTEM_PROTOCOL_VERSION", "PROTOCOL\nVERSION";
    SystemEpochStartTimestamp => "SYSTEM_EPOCH_START", "EPOCH START TIME UTC";
    SystemEpochDuration => "SYSTEM_EPOCH_DURATION", "EPOCH\nDURATION";
    SystemTimeTillNextEpoch => "SYSTEM_TIME_TILL_NEXT_EPOCH", "TIME TILL\nNEXT EPOCH";
    SystemTotalStake => "SYSTEM_TOTAL_STAKE", "TOTAL STAKE, SUI";
    SystemStorageFundTotalObjectStorageRebates => "SYSTEM_STORAGE_FUND_REBATES", "STORAGE FUND TOTAL\nOBJECT REBATES, SUI";
    SystemStorageFundNonRefundableBalance => "SYSTEM_STORAGE_FUND_NON_REFUNDABLE", "STORAGE FUND NON\nREFUNDABLE BALANCE, SUI";
    SystemReferenceGasPrice => "SYSTEM_REFERENCE_GAS_PRICE", "REFERENCE\nGAS PRICE";
    SystemMinReferenceGasPrice => "SYSTEM_MIN_REFERENCE_GAS_PRICE", "MIN REFERENCE\nGAS PRICE";
    SystemMaxReferenceGasPrice => "SYSTEM_MAX_REFERENCE_GAS_PRICE", "MAX REFERENCE\nGAS PRICE";
    SystemMeanReferenceGasPrice => "SYSTEM_MEAN_REFERENCE_GAS_PRICE", "MEAN REFERENCE\nGAS PRICE";
    SystemStakeWeightedMeanReferenceGasPrice => "SYSTEM_STAKE_WEIGHTED_MEAN_GAS_PRICE", "STAKE WEIGHTED MEAN\nREFERENCE GAS PRICE";
    SystemMedianReferenceGasPrice => "SYSTEM_MEDIAN_REFERENCE_GAS_PRICE", "MEDIAN REFERENCE\nGAS PRICE";
    SystemEstimatedReferenceGasPrice => "SYSTEM_ESTIMATED_REFERENCE_GAS_PRICE", "ESTIMATED REFERENCE\nGAS PRICE";
    SystemStakeSubsidyStartEpoch => "SYSTEM_STAKE_SUBSIDY_START_EPOCH", "STAKE SUBSIDY\nSTART EPOCH";
    SystemStakeSubsidyBalance => "SYSTEM_STAKE_SUBSIDY_BALANCE", "STAKE SUBSIDY\nBALANCE, SUI";
    SystemStakeSubsidyDistributionCounter => "SYSTEM_STAKE_SUBSIDY_DISTRIBUTION_COUNTER", "STAKE SUBSIDY\nDISTRIBUTION COUNTER";
    SystemStakeSubsidyCurrentDistributionAmount => "SYSTEM_STAKE_SUBSIDY_DISTRIBUTION_AMOUNT", "STAKE SUBSIDY\nDISTRIBUTION AMOUNT, SUI";
    SystemStakeSubsidyPeriodLength => "SYSTEM_STAKE_SUBSIDY_PERIOD_LENGTH", "STAKE SUBSIDY\nPERIOD LENGTH";
    SystemStakeSubsidyDecreaseRate => "SYSTEM_STAKE_SUBSIDY_DECREASE_RATE", "STAKE SUBSIDY\nDECREASE RATE";

    // Validator counts
    SystemMaxValidatorCount => "SYSTEM_MAX_VALIDATOR_COUNT", "MAX VALIDATOR\nCOUNT";
    SystemActiveValidatorCount => "SYSTEM_ACTIVE_VALIDATOR_COUNT", "ACTIVE VALIDATOR\nCOUNT";
    SystemPendingActiveValidatorCount => "SYSTEM_PENDING_ACTIVE_VALIDATOR_COUNT", "PENDING ACTIVE\nVALIDATORS COUNT";
    SystemValidatorCandidateCount => "SYSTEM_VALIDATOR_CANDIDATE_COUNT", "VALIDATOR\nCANDIDATE COUNT";
    SystemPendingRemovalsCount => "SYSTEM_PENDING_REMOVALS_COUNT", "PENDING VALIDATOR\nREMOVALS COUNT";
    SystemAtRiskValidatorCount => "SYSTEM_AT_RISK_VALIDATOR_COUNT", "VALIDATOR AT RISK\nCOUNT";
    SystemMinValidatorJoiningStake => "SYSTEM_MIN_VALIDATOR_JOINING_STAKE", "MIN VALIDATOR\nJOINING STAKE, SUI";
    SystemValidatorLowStakeThreshold => "SYSTEM_VALIDATOR_LOW_STAKE_THRESHOLD", "VALIDATOR LOW\nSTAKE THRESHOLD, SUI";
    SystemValidatorVeryLowStakeThreshold => "SYSTEM_VALIDATOR_VERY_LOW_STAKE_THRESHOLD", "VALIDATOR VERY LOW\nSTAKE THRESHOLD, SUI";
    SystemValidatorLowStakeGracePeriod => "SYSTEM_VALIDATOR_LOW_STAKE_GRACE_PERIOD", "VALIDATOR LOW STAKE\nGRACE PERIOD";

    // Validators at risk
    AtRiskValidatorName => "AT_RISK_VALIDATOR_NAME", "VALIDATOR NAME";
    AtRiskValidatorAddress => "AT_RISK_VALIDATOR_ADDRESS", "VALIDATOR ADDRESS";
    AtRiskValidatorNumberOfEpochs => "AT_RISK_EPOCHS", "NUMBER OF EPOCHS\nAT RISK";

    // Validator reports
    ReporterName => "REPORTER_NAME", "REPORTER VALIDATOR";
    ReporterAddress => "REPORTER_ADDRESS", "REPORTER VALIDATOR ADDRESS";
    ReportedName => "REPORTED_NAME", "REPORTED VALIDATOR";
    ReportedAddress => "REPORTED_ADDRESS", "REPORTED VALIDATOR ADDRESS";
    SlashingPercentage => "SLASHING_PCT", "SLASHING PCT";
}

impl ColumnName {
    /// Width of the widest caption line.
    pub fn caption_width(&self) -> u16 {
        self.caption()
            .lines()
            .map(|line| line.chars().count() as u16)
            .max()
            .unwrap_or(0)
    }

    /// Number of lines in the caption.
    pub fn caption_height(&self) -> u16 {
        self.caption().lines().count().max(1) as u16
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A display-ready cell value.
///
/// Absent metrics are [`ColumnValue::Missing`], never omitted from a
/// [`ColumnValues`] map.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Number(u64),
    Decimal(f64),
    Text(String),
    /// Whole percent, rendered with a trailing `%`.
    Percent(u64),
    Status(HostStatus),
    Missing,
}

impl ColumnValue {
    /// Percent value, or `Missing` when absent.
    pub fn percent(value: Option<u64>) -> Self {
        value.map_or(ColumnValue::Missing, ColumnValue::Percent)
    }

    /// The underlying percentage, for gauge-style cells.
    pub fn as_percent(&self) -> Option<u64> {
        match self {
            ColumnValue::Percent(pct) => Some(*pct),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ColumnValue::Missing)
    }
}

impl From<u64> for ColumnValue {
    fn from(value: u64) -> Self {
        ColumnValue::Number(value)
    }
}

impl From<Option<u64>> for ColumnValue {
    fn from(value: Option<u64>) -> Self {
        value.map_or(ColumnValue::Missing, ColumnValue::Number)
    }
}

impl From<Option<f64>> for ColumnValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ColumnValue::Missing, ColumnValue::Decimal)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<Option<String>> for ColumnValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(ColumnValue::Missing, ColumnValue::Text)
    }
}

impl From<Option<&str>> for ColumnValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(ColumnValue::Missing, ColumnValue::from)
    }
}

impl From<HostStatus> for ColumnValue {
    fn from(status: HostStatus) -> Self {
        ColumnValue::Status(status)
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Number(n) => write!(f, "{}", n),
            ColumnValue::Decimal(d) => write!(f, "{:.2}", d),
            ColumnValue::Text(s) => f.write_str(s),
            ColumnValue::Percent(pct) => write!(f, "{}%", pct),
            ColumnValue::Status(status) => f.write_str(status.symbol()),
            ColumnValue::Missing => f.write_str("-"),
        }
    }
}

/// The tables a static report can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum TableType {
    Rpc,
    Node,
    Validator,
    Peers,
    SystemState,
    ValidatorsCounts,
    ValidatorsAtRisk,
    ValidatorReports,
    ActiveValidators,
}

/// Where a table takes its items from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    /// One item per updated host of the group.
    Hosts(GroupKind),
    /// Records from the on-chain system state.
    SystemState,
}

impl TableType {
    pub const ALL: [TableType; 9] = [
        TableType::Rpc,
        TableType::Node,
        TableType::Validator,
        TableType::Peers,
        TableType::SystemState,
        TableType::ValidatorsCounts,
        TableType::ValidatorsAtRisk,
        TableType::ValidatorReports,
        TableType::ActiveValidators,
    ];

    /// Title printed above the table.
    pub fn title(&self) -> &'static str {
        match self {
            TableType::Rpc => "RPC",
            TableType::Node => "NODE",
            TableType::Validator => "VALIDATOR",
            TableType::Peers => "PEERS",
            TableType::SystemState => "SYSTEM STATE",
            TableType::ValidatorsCounts => "VALIDATORS COUNTS",
            TableType::ValidatorsAtRisk => "VALIDATORS AT RISK",
            TableType::ValidatorReports => "VALIDATOR REPORTS",
            TableType::ActiveValidators => "ACTIVE VALIDATORS",
        }
    }

    pub fn source(&self) -> TableSource {
        match self {
            TableType::Rpc => TableSource::Hosts(GroupKind::Rpc),
            TableType::Node | TableType::Validator => TableSource::Hosts(GroupKind::Node),
            TableType::Peers => TableSource::Hosts(GroupKind::Peers),
            TableType::SystemState
            | TableType::ValidatorsCounts
            | TableType::ValidatorsAtRisk
            | TableType::ValidatorReports
            | TableType::ActiveValidators => TableSource::SystemState,
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
