//! On-chain system state as reported by `suix_getLatestSuiSystemState`.

use crate::TOTAL_VOTING_POWER;

/// Epoch-wide state of the Sui system object.
///
/// Amounts are in MIST unless a field says otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemState {
    pub epoch: u64,
    pub protocol_version: u64,
    pub epoch_start_timestamp_ms: u64,
    pub epoch_duration_ms: u64,
    /// Time left in the epoch at the moment of the fetch.
    pub time_till_next_epoch_ms: Option<u64>,
    pub reference_gas_price: u64,
    pub total_stake: u64,

    pub storage_fund_total_object_storage_rebates: u64,
    pub storage_fund_non_refundable_balance: u64,

    pub stake_subsidy_start_epoch: u64,
    pub stake_subsidy_balance: u64,
    pub stake_subsidy_distribution_counter: u64,
    pub stake_subsidy_current_distribution_amount: u64,
    pub stake_subsidy_period_length: u64,
    /// Basis points.
    pub stake_subsidy_decrease_rate: u64,

    pub max_validator_count: u64,
    pub min_validator_joining_stake: u64,
    pub validator_low_stake_threshold: u64,
    pub validator_very_low_stake_threshold: u64,
    pub validator_low_stake_grace_period: u64,
    pub pending_active_validators_size: u64,
    pub pending_removals_count: u64,
    pub validator_candidates_size: u64,

    pub active_validators: Vec<ValidatorSummary>,
    pub validators_at_risk: Vec<ValidatorAtRisk>,
    pub validator_reports: Vec<ValidatorReport>,
}

/// One active validator.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidatorSummary {
    pub name: String,
    pub address: String,
    pub net_address: String,
    /// Basis points out of [`TOTAL_VOTING_POWER`].
    pub voting_power: u64,
    pub gas_price: u64,
    /// Basis points.
    pub commission_rate: u64,
    pub next_epoch_stake: u64,
    pub next_epoch_gas_price: u64,
    pub next_epoch_commission_rate: u64,
    pub staking_pool_sui_balance: u64,
    pub rewards_pool: u64,
    pub pool_token_balance: u64,
    pub pending_stake: u64,
    pub pending_total_sui_withdraw: u64,
    pub pending_pool_token_withdraw: u64,
    /// Annual percentage yield, when the APY endpoint answered.
    pub apy: Option<f64>,
}

/// A validator whose stake fell below the low-stake threshold.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidatorAtRisk {
    pub name: String,
    pub address: String,
    pub epochs_at_risk: u64,
}

/// One reporter → reported pair from the validator report records.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidatorReport {
    pub reporter_name: String,
    pub reporter_address: String,
    pub reported_name: String,
    pub reported_address: String,
    /// Voting power of everyone reporting the same validator, in whole percent.
    pub slashing_percentage: u64,
}

/// Reference gas price statistics across the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasPriceStats {
    pub min: u64,
    pub max: u64,
    pub mean: u64,
    pub median: u64,
    pub stake_weighted_mean: u64,
    /// Price at which a two-thirds quorum of voting power is reached.
    pub estimated_reference: u64,
}

impl SystemState {
    /// Number of validators in the active set.
    pub fn active_validator_count(&self) -> u64 {
        self.active_validators.len() as u64
    }

    /// Number of validators currently at risk of removal.
    pub fn at_risk_validator_count(&self) -> u64 {
        self.validators_at_risk.len() as u64
    }

    /// Look up a validator name by its address.
    pub fn validator_name(&self, address: &str) -> Option<&str> {
        self.active_validators
            .iter()
            .find(|v| v.address == address)
            .map(|v| v.name.as_str())
    }

    /// Next-epoch gas price statistics, or `None` with an empty active set.
    pub fn gas_price_stats(&self) -> Option<GasPriceStats> {
        if self.active_validators.is_empty() {
            return None;
        }

        let mut by_price: Vec<(u64, u64)> = self
            .active_validators
            .iter()
            .map(|v| (v.next_epoch_gas_price, v.voting_power))
            .collect();
        by_price.sort_unstable();

        let prices: Vec<u64> = by_price.iter().map(|(price, _)| *price).collect();
        let count = prices.len() as u128;
        let sum: u128 = prices.iter().map(|p| *p as u128).sum();

        let total_power: u128 = by_price.iter().map(|(_, power)| *power as u128).sum();
        let stake_weighted_mean = if total_power == 0 {
            (sum / count) as u64
        } else {
            let weighted: u128 = by_price.iter().map(|(p, w)| *p as u128 * *w as u128).sum();
            (weighted / total_power) as u64
        };

        // Walk prices upwards until two thirds of the voting power would accept them.
        let quorum = TOTAL_VOTING_POWER * 2 / 3 + 1;
        let mut accumulated = 0;
        let mut estimated_reference = prices[prices.len() - 1];
        for (price, power) in &by_price {
            accumulated += power;
            if accumulated >= quorum {
                estimated_reference = *price;
                break;
            }
        }

        Some(GasPriceStats {
            min: prices[0],
            max: prices[prices.len() - 1],
            mean: (sum / count) as u64,
            median: median(&prices),
            stake_weighted_mean,
            estimated_reference,
        })
    }
}

/// Median of a sorted, non-empty slice; even lengths average the two middle values.
fn median(sorted: &[u64]) -> u64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        ((sorted[mid - 1] as u128 + sorted[mid] as u128) / 2) as u64
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(name: &str, price: u64, power: u64) -> ValidatorSummary {
        ValidatorSummary {
            name: name.to_string(),
            address: format!("0x{}", name),
            next_epoch_gas_price: price,
            voting_power: power,
            ..Default::default()
        }
    }

    #[test]
    fn test_gas_price_stats_empty() {
        assert!(SystemState::default().gas_price_stats().is_none());
    }

    #[test]
    fn test_gas_price_stats() {
        let state = SystemState {
            active_validators: vec![
                validator("a", 1_000, 4_000),
                validator("b", 750, 3_000),
                validator("c", 500, 2_000),
                validator("d", 2_000, 1_000),
            ],
            ..Default::default()
        };

        let stats = state.gas_price_stats().unwrap();
        assert_eq!(stats.min, 500);
        assert_eq!(stats.max, 2_000);
        assert_eq!(stats.mean, 1_062);
        assert_eq!(stats.median, 875);
        // (500*2000 + 750*3000 + 1000*4000 + 2000*1000) / 10000
        assert_eq!(stats.stake_weighted_mean, 925);
        // 2000 + 3000 = 5000 < 6667, + 4000 = 9000 >= 6667
        assert_eq!(stats.estimated_reference, 1_000);
    }

    #[test]
    fn test_validator_name_lookup() {
        let state = SystemState {
            active_validators: vec![validator("alpha", 1, 1)],
            ..Default::default()
        };
        assert_eq!(state.validator_name("0xalpha"), Some("alpha"));
        assert_eq!(state.validator_name("0xbeta"), None);
        assert_eq!(state.active_validator_count(), 1);
    }
}
