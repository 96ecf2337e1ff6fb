//! Sui JSON-RPC calls.

use std::collections::HashMap;

use reqwest::Client;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};
use suimon_types::{
    SystemState, ValidatorAtRisk, ValidatorReport, ValidatorSummary, TOTAL_VOTING_POWER,
};

use crate::error::FetchError;

pub(super) struct RpcClient<'a> {
    client: &'a Client,
    url: &'a str,
}

impl<'a> RpcClient<'a> {
    pub(super) fn new(client: &'a Client, url: &'a str) -> Self {
        Self { client, url }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, FetchError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.client.post(self.url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "{} returned status {}",
                method,
                response.status()
            )));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(format!("{}: {}", method, e)))?;
        envelope.into_result(method)
    }

    pub(super) async fn total_transaction_blocks(&self) -> Result<u64, FetchError> {
        let count: BigInt = self.call("sui_getTotalTransactionBlocks", json!([])).await?;
        Ok(count.0)
    }

    pub(super) async fn latest_checkpoint(&self) -> Result<u64, FetchError> {
        let sequence: BigInt = self
            .call("sui_getLatestCheckpointSequenceNumber", json!([]))
            .await?;
        Ok(sequence.0)
    }

    pub(super) async fn system_state(&self) -> Result<SystemState, FetchError> {
        let (summary, apys) = tokio::try_join!(
            self.call::<RpcSystemState>("suix_getLatestSuiSystemState", json!([])),
            self.call::<RpcValidatorApys>("suix_getValidatorsApy", json!([])),
        )?;

        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Ok(summary.into_system_state(&apys, now_ms))
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T, FetchError> {
        if let Some(error) = self.error {
            return Err(FetchError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| FetchError::Parse(format!("{}: response has no result", method)))
    }
}

/// Sui encodes 64-bit integers as decimal strings; accept both forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BigInt(u64);

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(BigInt(n)),
            Raw::Text(s) => s.parse().map(BigInt).map_err(de::Error::custom),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSystemState {
    epoch: BigInt,
    protocol_version: BigInt,
    epoch_start_timestamp_ms: BigInt,
    epoch_duration_ms: BigInt,
    reference_gas_price: BigInt,
    total_stake: BigInt,
    storage_fund_total_object_storage_rebates: BigInt,
    storage_fund_non_refundable_balance: BigInt,
    stake_subsidy_start_epoch: BigInt,
    stake_subsidy_balance: BigInt,
    stake_subsidy_distribution_counter: BigInt,
    stake_subsidy_current_distribution_amount: BigInt,
    stake_subsidy_period_length: BigInt,
    stake_subsidy_decrease_rate: BigInt,
    max_validator_count: BigInt,
    min_validator_joining_stake: BigInt,
    validator_low_stake_threshold: BigInt,
    validator_very_low_stake_threshold: BigInt,
    validator_low_stake_grace_period: BigInt,
    pending_active_validators_size: BigInt,
    #[serde(default)]
    pending_removals: Vec<BigInt>,
    validator_candidates_size: BigInt,
    active_validators: Vec<RpcValidator>,
    #[serde(default)]
    at_risk_validators: Vec<(String, BigInt)>,
    #[serde(default)]
    validator_report_records: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcValidator {
    sui_address: String,
    name: String,
    net_address: String,
    voting_power: BigInt,
    gas_price: BigInt,
    commission_rate: BigInt,
    next_epoch_stake: BigInt,
    next_epoch_gas_price: BigInt,
    next_epoch_commission_rate: BigInt,
    staking_pool_sui_balance: BigInt,
    rewards_pool: BigInt,
    pool_token_balance: BigInt,
    pending_stake: BigInt,
    pending_total_sui_withdraw: BigInt,
    pending_pool_token_withdraw: BigInt,
}

#[derive(Debug, Default, Deserialize)]
struct RpcValidatorApys {
    apys: Vec<RpcValidatorApy>,
}

#[derive(Debug, Deserialize)]
struct RpcValidatorApy {
    address: String,
    apy: f64,
}

impl RpcSystemState {
    fn into_system_state(self, apys: &RpcValidatorApys, now_ms: u64) -> SystemState {
        let apy_by_address: HashMap<&str, f64> = apys
            .apys
            .iter()
            .map(|entry| (entry.address.as_str(), entry.apy))
            .collect();

        let active_validators: Vec<ValidatorSummary> = self
            .active_validators
            .into_iter()
            .map(|v| ValidatorSummary {
                apy: apy_by_address.get(v.sui_address.as_str()).map(|apy| apy * 100.0),
                name: v.name,
                address: v.sui_address,
                net_address: v.net_address,
                voting_power: v.voting_power.0,
                gas_price: v.gas_price.0,
                commission_rate: v.commission_rate.0,
                next_epoch_stake: v.next_epoch_stake.0,
                next_epoch_gas_price: v.next_epoch_gas_price.0,
                next_epoch_commission_rate: v.next_epoch_commission_rate.0,
                staking_pool_sui_balance: v.staking_pool_sui_balance.0,
                rewards_pool: v.rewards_pool.0,
                pool_token_balance: v.pool_token_balance.0,
                pending_stake: v.pending_stake.0,
                pending_total_sui_withdraw: v.pending_total_sui_withdraw.0,
                pending_pool_token_withdraw: v.pending_pool_token_withdraw.0,
            })
            .collect();

        let mut state = SystemState {
            epoch: self.epoch.0,
            protocol_version: self.protocol_version.0,
            epoch_start_timestamp_ms: self.epoch_start_timestamp_ms.0,
            epoch_duration_ms: self.epoch_duration_ms.0,
            time_till_next_epoch_ms: None,
            reference_gas_price: self.reference_gas_price.0,
            total_stake: self.total_stake.0,
            storage_fund_total_object_storage_rebates: self
                .storage_fund_total_object_storage_rebates
                .0,
            storage_fund_non_refundable_balance: self.storage_fund_non_refundable_balance.0,
            stake_subsidy_start_epoch: self.stake_subsidy_start_epoch.0,
            stake_subsidy_balance: self.stake_subsidy_balance.0,
            stake_subsidy_distribution_counter: self.stake_subsidy_distribution_counter.0,
            stake_subsidy_current_distribution_amount: self
                .stake_subsidy_current_distribution_amount
                .0,
            stake_subsidy_period_length: self.stake_subsidy_period_length.0,
            stake_subsidy_decrease_rate: self.stake_subsidy_decrease_rate.0,
            max_validator_count: self.max_validator_count.0,
            min_validator_joining_stake: self.min_validator_joining_stake.0,
            validator_low_stake_threshold: self.validator_low_stake_threshold.0,
            validator_very_low_stake_threshold: self.validator_very_low_stake_threshold.0,
            validator_low_stake_grace_period: self.validator_low_stake_grace_period.0,
            pending_active_validators_size: self.pending_active_validators_size.0,
            pending_removals_count: self.pending_removals.len() as u64,
            validator_candidates_size: self.validator_candidates_size.0,
            active_validators,
            validators_at_risk: Vec::new(),
            validator_reports: Vec::new(),
        };

        let epoch_end_ms = state.epoch_start_timestamp_ms + state.epoch_duration_ms;
        if state.epoch_start_timestamp_ms > 0 {
            state.time_till_next_epoch_ms = Some(epoch_end_ms.saturating_sub(now_ms));
        }

        state.validators_at_risk = self
            .at_risk_validators
            .into_iter()
            .map(|(address, epochs)| ValidatorAtRisk {
                name: name_of(&state, &address),
                address,
                epochs_at_risk: epochs.0,
            })
            .collect();

        let power_of = |address: &str| -> u64 {
            state
                .active_validators
                .iter()
                .find(|v| v.address == address)
                .map_or(0, |v| v.voting_power)
        };

        let mut reports = Vec::new();
        for (reported, reporters) in &self.validator_report_records {
            let reporting_power: u64 = reporters.iter().map(|r| power_of(r)).sum();
            let slashing_percentage = reporting_power * 100 / TOTAL_VOTING_POWER;
            for reporter in reporters {
                reports.push(ValidatorReport {
                    reporter_name: name_of(&state, reporter),
                    reporter_address: reporter.clone(),
                    reported_name: name_of(&state, reported),
                    reported_address: reported.clone(),
                    slashing_percentage,
                });
            }
        }
        state.validator_reports = reports;

        state
    }
}

fn name_of(state: &SystemState, address: &str) -> String {
    state.validator_name(address).unwrap_or_default().to_string()
}
