//! Input checks and call shaping for the external escrow pool contract.
//!
//! Nothing here enforces contract rules. The contract owns pool lifecycle,
//! vote accounting and payouts; this module only refuses obviously bad input
//! before a transaction is handed to the wallet, and renders what the
//! contract returns.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

use crate::error::EscrowError;
use crate::events::{Blockchain, PoolCreatedPayload};

pub const WEI_PER_ETH: Decimal = dec!(1000000000000000000);
/// Value attached to `createPool`, as a multiple of the participation price.
pub const POOL_PRIZE_MULTIPLIER: u32 = 10;
/// Pools open this long after submission so the start time is in the future.
pub const START_DELAY_SECS: i64 = 60;

const MIN_QUESTION_CHARS: usize = 10;
const MIN_PARTICIPATION_ETH: Decimal = dec!(0.001);
const MIN_DURATION_HOURS: Decimal = dec!(0.1);
const WALRUS_SNIPPET_CHARS: usize = 20;

/// A pool as entered in the creation form.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolDraft {
    pub question: String,
    pub participation_eth: Option<Decimal>,
    pub duration_hours: Option<Decimal>,
}

impl PoolDraft {
    pub fn new(
        question: impl Into<String>,
        participation_eth: Decimal,
        duration_hours: Decimal,
    ) -> Self {
        PoolDraft {
            question: question.into(),
            participation_eth: Some(participation_eth),
            duration_hours: Some(duration_hours),
        }
    }

    /// Unparseable numbers are kept as `None` and reported by `validate`.
    pub fn from_form(question: &str, participation: &str, duration_hours: &str) -> Self {
        PoolDraft {
            question: question.to_string(),
            participation_eth: participation.trim().parse().ok(),
            duration_hours: duration_hours.trim().parse().ok(),
        }
    }

    /// Collects every problem rather than stopping at the first.
    pub fn validate(&self) -> Result<(), EscrowError> {
        let mut errors = Vec::new();

        let question = self.question.trim();
        if question.is_empty() {
            errors.push("Question is required".to_string());
        }
        if question.chars().count() < MIN_QUESTION_CHARS {
            errors.push(format!(
                "Question must be at least {MIN_QUESTION_CHARS} characters"
            ));
        }

        match self.participation_eth {
            Some(amount) if amount > Decimal::ZERO => {
                if amount < MIN_PARTICIPATION_ETH {
                    errors.push("Participation amount must be at least 0.001 ETH".to_string());
                }
            }
            Some(_) => {
                errors.push("Participation amount must be greater than 0".to_string());
                errors.push("Participation amount must be at least 0.001 ETH".to_string());
            }
            None => errors.push("Participation amount must be greater than 0".to_string()),
        }

        match self.duration_hours {
            Some(hours) if hours > Decimal::ZERO => {
                if hours < MIN_DURATION_HOURS {
                    errors.push("Duration must be at least 0.1 hours (6 minutes)".to_string());
                }
            }
            Some(_) => {
                errors.push("Duration must be greater than 0 hours".to_string());
                errors.push("Duration must be at least 0.1 hours (6 minutes)".to_string());
            }
            None => errors.push("Duration must be greater than 0 hours".to_string()),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EscrowError::Validation(errors))
        }
    }

    /// Validates and builds the `createPool` call. The creator address doubles
    /// as the creator name.
    pub fn into_call(
        self,
        creator: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<EscrowCall, EscrowError> {
        let creator = creator.ok_or(EscrowError::WalletNotConnected)?;
        self.validate()?;

        let price = self.participation_eth.unwrap_or_default();
        let hours = self.duration_hours.unwrap_or_default();
        let price_wei = eth_to_wei(price)?;
        let start_time = now.timestamp() + START_DELAY_SECS;
        let end_time = hours
            .checked_mul(dec!(3600))
            .and_then(|secs| secs.trunc().to_i64())
            .and_then(|secs| start_time.checked_add(secs))
            .and_then(|end| u64::try_from(end).ok())
            .ok_or_else(duration_too_long)?;
        let value_wei = price_wei
            .checked_mul(u128::from(POOL_PRIZE_MULTIPLIER))
            .ok_or_else(|| out_of_range(price))?;

        Ok(EscrowCall::CreatePool {
            creator_name: creator.to_string(),
            price_wei,
            start_time: u64::try_from(start_time).map_err(|_| duration_too_long())?,
            end_time,
            walrus_hash: walrus_hash(&self.question, now),
            value_wei,
        })
    }

    /// The `pool_created` notification sent once the transaction confirmed.
    pub fn announcement(
        &self,
        blockchain: Blockchain,
        pool_id: Option<String>,
        creator: &str,
        now: DateTime<Utc>,
    ) -> PoolCreatedPayload {
        let price = self.participation_eth.unwrap_or_default();
        let total = price
            .checked_mul(Decimal::from(POOL_PRIZE_MULTIPLIER))
            .unwrap_or(Decimal::MAX);
        PoolCreatedPayload {
            pool_id: pool_id
                .unwrap_or_else(|| format!("{}-{}", blockchain.as_str(), now.timestamp_millis())),
            question: self.question.trim().to_string(),
            blockchain,
            total_amount: total.to_f64().unwrap_or_default(),
            creator_address: creator.to_string(),
        }
    }
}

/// Placeholder storage key the contract keeps alongside the pool; the app
/// reads it back as the question text.
pub fn walrus_hash(question: &str, now: DateTime<Utc>) -> String {
    let snippet: String = question
        .chars()
        .take(WALRUS_SNIPPET_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("pool_{}_{}", now.timestamp_millis(), snippet)
}

pub fn eth_to_wei(eth: Decimal) -> Result<u128, EscrowError> {
    eth.checked_mul(WEI_PER_ETH)
        .and_then(|wei| wei.trunc().to_u128())
        .ok_or_else(|| out_of_range(eth))
}

fn out_of_range(eth: Decimal) -> EscrowError {
    EscrowError::Validation(vec![format!("Amount {eth} is out of range")])
}

fn duration_too_long() -> EscrowError {
    EscrowError::Validation(vec!["Duration is too long".to_string()])
}

pub fn wei_to_eth(wei: u128) -> Decimal {
    i128::try_from(wei)
        .ok()
        .and_then(|wei| Decimal::try_from_i128_with_scale(wei, 18).ok())
        .map(|eth| eth.normalize())
        .unwrap_or(Decimal::MAX)
}

/// A contract function invocation, ready for a wallet to sign or a node to
/// read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowCall {
    CreatePool {
        creator_name: String,
        price_wei: u128,
        start_time: u64,
        end_time: u64,
        walrus_hash: String,
        value_wei: u128,
    },
    Vote {
        pool_id: u64,
        vote_yes: bool,
        value_wei: u128,
    },
    ResolvePool {
        pool_id: u64,
        winning_vote: bool,
    },
    ClaimReward {
        pool_id: u64,
    },
    GetPoolInfo {
        pool_id: u64,
        participant: String,
    },
    GetVoteCounts {
        pool_id: u64,
    },
    GetTotalPools,
    GetPoolWalrusHash {
        pool_id: u64,
    },
}

impl EscrowCall {
    pub fn vote(pool_id: u64, vote_yes: bool, amount_eth: Decimal) -> Result<Self, EscrowError> {
        if amount_eth <= Decimal::ZERO {
            return Err(EscrowError::Validation(vec![
                "Vote amount must be greater than 0".to_string(),
            ]));
        }
        Ok(EscrowCall::Vote {
            pool_id,
            vote_yes,
            value_wei: eth_to_wei(amount_eth)?,
        })
    }

    pub fn function_name(&self) -> &'static str {
        match self {
            EscrowCall::CreatePool { .. } => "createPool",
            EscrowCall::Vote { .. } => "vote",
            EscrowCall::ResolvePool { .. } => "resolvePool",
            EscrowCall::ClaimReward { .. } => "claimReward",
            EscrowCall::GetPoolInfo { .. } => "getPoolInfo",
            EscrowCall::GetVoteCounts { .. } => "getVoteCounts",
            EscrowCall::GetTotalPools => "getTotalPools",
            EscrowCall::GetPoolWalrusHash { .. } => "getPoolWalrusHash",
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            EscrowCall::GetPoolInfo { .. }
                | EscrowCall::GetVoteCounts { .. }
                | EscrowCall::GetTotalPools
                | EscrowCall::GetPoolWalrusHash { .. }
        )
    }

    /// Native value sent with the transaction.
    pub fn value_wei(&self) -> u128 {
        match self {
            EscrowCall::CreatePool { value_wei, .. } | EscrowCall::Vote { value_wei, .. } => {
                *value_wei
            }
            _ => 0,
        }
    }

    /// Positional arguments, with uint256 values as decimal strings.
    pub fn args(&self) -> Vec<Value> {
        match self {
            EscrowCall::CreatePool {
                creator_name,
                price_wei,
                start_time,
                end_time,
                walrus_hash,
                ..
            } => vec![
                json!(creator_name),
                json!(price_wei.to_string()),
                json!(start_time.to_string()),
                json!(end_time.to_string()),
                json!(walrus_hash),
            ],
            EscrowCall::Vote {
                pool_id, vote_yes, ..
            } => vec![json!(pool_id.to_string()), json!(vote_yes)],
            EscrowCall::ResolvePool {
                pool_id,
                winning_vote,
            } => vec![json!(pool_id.to_string()), json!(winning_vote)],
            EscrowCall::GetPoolInfo {
                pool_id,
                participant,
            } => vec![json!(pool_id.to_string()), json!(participant)],
            EscrowCall::ClaimReward { pool_id }
            | EscrowCall::GetVoteCounts { pool_id }
            | EscrowCall::GetPoolWalrusHash { pool_id } => vec![json!(pool_id.to_string())],
            EscrowCall::GetTotalPools => Vec::new(),
        }
    }
}

/// `getPoolInfo` result tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInfo {
    pub creator_name: String,
    pub price: u128,
    pub pool_prize: u128,
    pub pool_balance: u128,
    pub start_time: u64,
    pub end_time: u64,
    pub is_active: bool,
    pub creator: String,
    pub walrus_hash: String,
    pub is_resolved: bool,
    pub winning_vote: bool,
    pub total_winners: u64,
    pub total_winner_amount: u128,
    pub claimed_amount: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteCounts {
    pub yes_votes: u64,
    pub no_votes: u64,
}

/// What a pool list renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolView {
    pub id: String,
    pub question: String,
    pub total_amount: Decimal,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub ends_at: Option<DateTime<Utc>>,
    pub participation_amount: Decimal,
    pub creator: String,
    pub walrus_hash: String,
    pub is_active: bool,
    pub is_resolved: bool,
}

impl PoolView {
    pub fn from_contract(
        blockchain: Blockchain,
        pool_id: u64,
        info: &PoolInfo,
        votes: VoteCounts,
        walrus_hash: &str,
    ) -> Self {
        PoolView {
            id: format!("{}-{}", blockchain.as_str(), pool_id),
            question: walrus_hash.to_string(),
            total_amount: wei_to_eth(info.pool_balance),
            yes_votes: votes.yes_votes,
            no_votes: votes.no_votes,
            ends_at: i64::try_from(info.end_time)
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            participation_amount: wei_to_eth(info.price),
            creator: info.creator.clone(),
            walrus_hash: info.walrus_hash.clone(),
            is_active: info.is_active,
            is_resolved: info.is_resolved,
        }
    }
}

/// Why a submitted transaction did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxFailure {
    Rejected,
    InsufficientFunds,
    Reverted(String),
    Network(String),
}

impl TxFailure {
    /// Sorts a wallet or RPC error message into a failure class.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("rejected the request")
        {
            TxFailure::Rejected
        } else if lower.contains("insufficient funds") {
            TxFailure::InsufficientFunds
        } else if lower.contains("revert") {
            TxFailure::Reverted(message.to_string())
        } else {
            TxFailure::Network(message.to_string())
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            TxFailure::Rejected => "Transaction was rejected in your wallet.".to_string(),
            TxFailure::InsufficientFunds => {
                "Not enough funds to cover the amount and gas.".to_string()
            }
            TxFailure::Reverted(reason) => {
                format!("The contract rejected the transaction: {reason}")
            }
            TxFailure::Network(reason) => {
                format!("Could not reach the network, please try again: {reason}")
            }
        }
    }
}

impl fmt::Display for TxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl From<TxFailure> for EscrowError {
    fn from(failure: TxFailure) -> Self {
        EscrowError::Transaction(failure)
    }
}
