//! Per-validator stake records and their wire form.

use serde::{Deserialize, Serialize};
use stakenet_types::{PublicKey, Timestamp};

/// The bonded stake of one validator.
///
/// Records are never removed from the table; a fully withdrawn validator keeps
/// a zero-amount, inactive record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRecord {
    pub amount: u64,
    /// When the stake was first bonded. Maturity is measured from here, and
    /// later deposits do not reset it.
    #[serde(rename = "timestamp")]
    pub bonded_at: Timestamp,
    pub last_reward_claim: Timestamp,
    pub active: bool,
}

impl StakeRecord {
    /// A freshly bonded, not yet matured record.
    pub fn bonded(amount: u64, now: Timestamp) -> Self {
        Self {
            amount,
            bonded_at: now,
            last_reward_claim: now,
            active: false,
        }
    }

    pub fn is_matured(&self, maturity_ms: u64, now: Timestamp) -> bool {
        self.bonded_at.has_elapsed(maturity_ms, now)
    }
}

/// A record tagged with its owner, as carried by STAKE and STAKE_SYNC messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeInfo {
    pub public_key: PublicKey,
    #[serde(flatten)]
    pub record: StakeRecord,
}

impl StakeInfo {
    pub fn new(public_key: PublicKey, record: StakeRecord) -> Self {
        Self { public_key, record }
    }
}
