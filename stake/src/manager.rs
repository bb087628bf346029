//! The validator stake table.

use std::collections::BTreeMap;

use serde::Serialize;
use stakenet_types::params::{BPS_DENOMINATOR, YEAR_MILLIS};
use stakenet_types::{ChainParams, PublicKey, Timestamp};
use tracing::debug;

use crate::error::StakeError;
use crate::record::{StakeInfo, StakeRecord};

/// An active validator and its bonded amount, as seen by leader election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveValidator {
    pub public_key: PublicKey,
    pub stake: u64,
}

/// Tracks bonded stake per validator and the running total.
///
/// Records are kept in a `BTreeMap` so every iteration walks validators in
/// public-key order. Leader election depends on that order being identical on
/// every node.
pub struct StakeManager {
    stakes: BTreeMap<PublicKey, StakeRecord>,
    total_staked: u64,
    minimum_stake: u64,
    maturity_ms: u64,
    reward_rate_bps: u64,
    slashing_penalty_bps: u64,
}

impl StakeManager {
    pub fn new(params: &ChainParams) -> Self {
        Self {
            stakes: BTreeMap::new(),
            total_staked: 0,
            minimum_stake: params.minimum_stake,
            maturity_ms: params.stake_maturity_ms,
            reward_rate_bps: params.reward_rate_bps,
            slashing_penalty_bps: params.slashing_penalty_bps,
        }
    }

    /// Bond `amount` for `key`.
    ///
    /// A deposit into an existing record adds to its amount and keeps the
    /// original bonding time, activity flag and last reward claim.
    pub fn add_stake(
        &mut self,
        key: &PublicKey,
        amount: u64,
        now: Timestamp,
    ) -> Result<StakeRecord, StakeError> {
        if amount < self.minimum_stake {
            return Err(StakeError::BelowMinimum {
                amount,
                minimum: self.minimum_stake,
            });
        }

        let record = self
            .stakes
            .entry(key.clone())
            .and_modify(|existing| existing.amount = existing.amount.saturating_add(amount))
            .or_insert_with(|| StakeRecord::bonded(amount, now))
            .clone();
        self.total_staked = self.total_staked.saturating_add(amount);

        debug!(validator = %key.short(), amount, total = record.amount, "stake added");
        Ok(record)
    }

    pub fn get_stake(&self, key: &PublicKey) -> Option<&StakeRecord> {
        self.stakes.get(key)
    }

    /// Whether `key` may propose at `now`. Promotes a matured record to
    /// active as a side effect.
    ///
    /// A record that fell below the minimum stays inactive until topped up.
    pub fn is_active_validator(&mut self, key: &PublicKey, now: Timestamp) -> bool {
        let (maturity_ms, minimum) = (self.maturity_ms, self.minimum_stake);
        match self.stakes.get_mut(key) {
            Some(record) => {
                if promote(record, maturity_ms, minimum, now) {
                    debug!(validator = %key.short(), "stake matured, validator active");
                }
                record.active
            }
            None => false,
        }
    }

    /// Reward accrued since the last claim:
    /// `floor(amount * rate * elapsed / year)`. Zero for inactive records.
    pub fn calculate_reward(&self, key: &PublicKey, now: Timestamp) -> u64 {
        let Some(record) = self.stakes.get(key) else {
            return 0;
        };
        if !record.active {
            return 0;
        }
        let elapsed = record.last_reward_claim.elapsed_since(now) as u128;
        let reward = record.amount as u128 * self.reward_rate_bps as u128 * elapsed
            / (BPS_DENOMINATOR as u128 * YEAR_MILLIS as u128);
        u64::try_from(reward).unwrap_or(u64::MAX)
    }

    /// Compute the accrued reward and, when non-zero, advance the claim time
    /// to `now`. Crediting the reward is up to the caller.
    pub fn claim_reward(&mut self, key: &PublicKey, now: Timestamp) -> u64 {
        let reward = self.calculate_reward(key, now);
        if reward > 0 {
            if let Some(record) = self.stakes.get_mut(key) {
                record.last_reward_claim = now;
            }
        }
        reward
    }

    /// Remove `amount` from an active stake. The validator is deactivated if
    /// the remainder falls below the minimum.
    pub fn withdraw_stake(&mut self, key: &PublicKey, amount: u64) -> Result<u64, StakeError> {
        let record = match self.stakes.get_mut(key) {
            Some(record) if record.active => record,
            _ => return Err(StakeError::NoActiveStake),
        };
        if amount > record.amount {
            return Err(StakeError::InsufficientStake {
                requested: amount,
                available: record.amount,
            });
        }

        record.amount -= amount;
        if record.amount < self.minimum_stake {
            record.active = false;
        }
        self.total_staked = self.total_staked.saturating_sub(amount);
        Ok(amount)
    }

    /// Deduct the slashing penalty from `key`'s stake. Returns the amount
    /// removed, zero for an unknown validator.
    pub fn apply_slashing(&mut self, key: &PublicKey) -> u64 {
        let Some(record) = self.stakes.get_mut(key) else {
            return 0;
        };
        let slashed = (record.amount as u128 * self.slashing_penalty_bps as u128
            / BPS_DENOMINATOR as u128) as u64;
        record.amount -= slashed;
        if record.amount < self.minimum_stake {
            record.active = false;
        }
        self.total_staked = self.total_staked.saturating_sub(slashed);

        debug!(validator = %key.short(), slashed, remaining = record.amount, "stake slashed");
        slashed
    }

    /// Every matured validator with its amount, in key order. Promotes
    /// matured records like [`Self::is_active_validator`].
    pub fn get_active_validators(&mut self, now: Timestamp) -> Vec<ActiveValidator> {
        let (maturity_ms, minimum) = (self.maturity_ms, self.minimum_stake);
        self.stakes
            .iter_mut()
            .filter_map(|(key, record)| {
                promote(record, maturity_ms, minimum, now);
                record.active.then(|| ActiveValidator {
                    public_key: key.clone(),
                    stake: record.amount,
                })
            })
            .collect()
    }

    pub fn get_total_stake(&self) -> u64 {
        self.total_staked
    }

    /// Install a record received from a peer if we have none for `key` or the
    /// remote bond is at least as recent as ours. Returns whether it was
    /// applied.
    pub fn merge_record(&mut self, key: &PublicKey, record: StakeRecord) -> bool {
        let previous_amount = match self.stakes.get(key) {
            Some(local) if record.bonded_at < local.bonded_at => return false,
            Some(local) => local.amount,
            None => 0,
        };
        self.total_staked = self
            .total_staked
            .saturating_sub(previous_amount)
            .saturating_add(record.amount);
        self.stakes.insert(key.clone(), record);
        true
    }

    /// Merge a full table from a peer, then recompute the total from scratch.
    /// Returns the number of records applied.
    pub fn merge_all(&mut self, records: impl IntoIterator<Item = StakeInfo>) -> usize {
        let mut applied = 0;
        for info in records {
            if self.merge_record(&info.public_key, info.record) {
                applied += 1;
            }
        }
        self.total_staked = self
            .stakes
            .values()
            .fold(0u64, |sum, r| sum.saturating_add(r.amount));
        applied
    }

    /// The full table in key order, as sent in STAKE_SYNC.
    pub fn records(&self) -> Vec<StakeInfo> {
        self.stakes
            .iter()
            .map(|(key, record)| StakeInfo::new(key.clone(), record.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }
}

/// Activate a matured record holding at least `minimum`. Returns whether
/// the record was promoted.
fn promote(record: &mut StakeRecord, maturity_ms: u64, minimum: u64, now: Timestamp) -> bool {
    if record.active || record.amount < minimum || !record.is_matured(maturity_ms, now) {
        return false;
    }
    record.active = true;
    true
}
