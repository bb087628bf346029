//! Chain parameters: the constants every node must agree on.
//!
//! Stake thresholds, maturity, block spacing, slot width and the reward and
//! slashing rates. A node whose parameters differ from its peers will reject
//! their blocks or elect different leaders, so these are network-wide values.

use serde::{Deserialize, Serialize};

/// Milliseconds in a (365-day) year, the denominator of the reward rate.
pub const YEAR_MILLIS: u64 = 365 * 24 * 60 * 60 * 1000;

/// One hundred percent expressed in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Consensus parameters shared by all nodes on a network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    // ── Staking ──────────────────────────────────────────────────────────
    /// Minimum amount accepted by a single stake deposit, and the balance
    /// below which a validator is deactivated.
    pub minimum_stake: u64,

    /// Dwell time (ms) between bonding and becoming proposal-eligible.
    pub stake_maturity_ms: u64,

    /// Annual reward rate in basis points (500 = 5%).
    pub reward_rate_bps: u64,

    /// Fraction of stake removed by a slashing event, in basis points (1000 = 10%).
    pub slashing_penalty_bps: u64,

    // ── Block production ─────────────────────────────────────────────────
    /// Minimum spacing (ms) between a block and its `last_block_time`.
    pub min_block_interval_ms: u64,

    /// Width (ms) of one leader-election slot.
    pub slot_duration_ms: u64,

    /// Timestamp stamped on the deterministic genesis block.
    pub genesis_timestamp: u64,
}

impl ChainParams {
    /// Default network values (one-minute maturity, fifteen-second
    /// blocks).
    pub fn standard() -> Self {
        Self {
            minimum_stake: 1000,
            stake_maturity_ms: 60 * 1000,
            reward_rate_bps: 500,
            slashing_penalty_bps: 1000,
            min_block_interval_ms: 15 * 1000,
            slot_duration_ms: 15 * 1000,
            genesis_timestamp: 0,
        }
    }

    /// Slot number containing `now_ms`.
    pub fn slot_at(&self, now_ms: u64) -> u64 {
        now_ms / self.slot_duration_ms.max(1)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::standard()
    }
}
