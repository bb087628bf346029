//! Stake-weighted leader election.
//!
//! For slot `s` after block `prev`, `seed = H(prev ++ s)` and each active
//! validator `v` draws `h_v = H(seed ++ v)`. Its priority is `h_v / stake_v`
//! and the lowest priority wins, so a larger stake shrinks the draw.
//!
//! Priorities are compared by cross-multiplying the leading 64 bits of each
//! draw with the other candidate's stake, in 128-bit integers. Candidates are
//! visited in key order and only a strictly lower priority replaces the
//! incumbent, so ties go to the lowest key.

use stakenet_crypto::blake2b_256_multi;
use stakenet_stake::{ActiveValidator, StakeManager};
use stakenet_types::{BlockHash, ChainParams, PublicKey, Timestamp};
use tracing::debug;

/// `H(previous_hash ++ slot)`, with the slot as 8 big-endian bytes.
pub fn slot_seed(previous_hash: &BlockHash, slot: u64) -> [u8; 32] {
    blake2b_256_multi(&[previous_hash.as_bytes(), &slot.to_be_bytes()])
}

fn draw(seed: &[u8; 32], key: &PublicKey) -> u64 {
    BlockHash::new(blake2b_256_multi(&[seed, key.as_bytes()])).leading_u64()
}

/// `true` if `(draw_a, stake_a)` has a strictly lower priority than
/// `(draw_b, stake_b)`.
fn outranks(draw_a: u64, stake_a: u64, draw_b: u64, stake_b: u64) -> bool {
    (draw_a as u128) * (stake_b as u128) < (draw_b as u128) * (stake_a as u128)
}

/// Outcome of one slot's election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Election {
    pub slot: u64,
    pub seed: [u8; 32],
    pub leader: PublicKey,
    pub leader_stake: u64,
    pub candidates: usize,
    pub active_stake: u64,
}

pub struct ValidatorSelector {
    slot_duration_ms: u64,
}

impl ValidatorSelector {
    pub fn new(params: &ChainParams) -> Self {
        Self {
            slot_duration_ms: params.slot_duration_ms.max(1),
        }
    }

    pub fn slot_at(&self, now: Timestamp) -> u64 {
        now.as_millis() / self.slot_duration_ms
    }

    /// Elect the leader for the slot containing `now`, or `None` when no
    /// validator is active.
    pub fn elect_leader(
        &self,
        stakes: &mut StakeManager,
        now: Timestamp,
        previous_hash: &BlockHash,
    ) -> Option<Election> {
        let slot = self.slot_at(now);
        let seed = slot_seed(previous_hash, slot);
        let validators = stakes.get_active_validators(now);
        elect_from(&validators, slot, seed)
    }

    /// Returns `me` if this node leads the slot containing `now`.
    pub fn select_validator(
        &self,
        stakes: &mut StakeManager,
        now: Timestamp,
        previous_hash: &BlockHash,
        me: &PublicKey,
    ) -> Option<PublicKey> {
        if !stakes.is_active_validator(me, now) {
            debug!(slot = self.slot_at(now), "not an active validator, skipping election");
            return None;
        }
        let election = self.elect_leader(stakes, now, previous_hash)?;
        let won = &election.leader == me;
        debug!(
            slot = election.slot,
            validators = election.candidates,
            active_stake = election.active_stake,
            leader = %election.leader.short(),
            won,
            "leader elected"
        );
        won.then(|| me.clone())
    }
}

fn elect_from(validators: &[ActiveValidator], slot: u64, seed: [u8; 32]) -> Option<Election> {
    let mut best: Option<(&ActiveValidator, u64)> = None;
    let mut active_stake = 0u64;
    for candidate in validators.iter().filter(|v| v.stake > 0) {
        active_stake = active_stake.saturating_add(candidate.stake);
        let candidate_draw = draw(&seed, &candidate.public_key);
        best = match best {
            Some((incumbent, incumbent_draw))
                if !outranks(candidate_draw, candidate.stake, incumbent_draw, incumbent.stake) =>
            {
                Some((incumbent, incumbent_draw))
            }
            _ => Some((candidate, candidate_draw)),
        };
    }
    let (leader, _) = best?;
    Some(Election {
        slot,
        seed,
        leader: leader.public_key.clone(),
        leader_stake: leader.stake,
        candidates: validators.len(),
        active_stake,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakenet_crypto::blake2b_256;
    use std::collections::HashMap;

    fn key(n: u8) -> PublicKey {
        PublicKey([n; 32])
    }

    fn params() -> ChainParams {
        ChainParams::standard()
    }

    /// A stake table with every validator matured by t = 60s.
    fn table(entries: &[(u8, u64)]) -> StakeManager {
        let mut stakes = StakeManager::new(&params());
        for &(n, amount) in entries {
            stakes.add_stake(&key(n), amount, Timestamp::new(0)).unwrap();
        }
        stakes
    }

    #[test]
    fn test_election_is_deterministic_across_nodes() {
        let selector = ValidatorSelector::new(&params());
        let prev = BlockHash::new([5; 32]);
        let now = Timestamp::new(120_000);

        let mut node_a = table(&[(1, 1000), (2, 5000), (3, 2000)]);
        let mut node_b = table(&[(3, 2000), (1, 1000), (2, 5000)]);
        let a = selector.elect_leader(&mut node_a, now, &prev).unwrap();
        let b = selector.elect_leader(&mut node_b, now, &prev).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.candidates, 3);
        assert_eq!(a.active_stake, 8000);
    }

    #[test]
    fn test_same_slot_same_leader() {
        let selector = ValidatorSelector::new(&params());
        let prev = BlockHash::new([9; 32]);
        let mut stakes = table(&[(1, 1000), (2, 1000), (3, 1000)]);
        let early = selector.elect_leader(&mut stakes, Timestamp::new(75_000), &prev).unwrap();
        let late = selector.elect_leader(&mut stakes, Timestamp::new(89_999), &prev).unwrap();
        assert_eq!(early.slot, 5);
        assert_eq!(early, late);
    }

    #[test]
    fn test_no_active_validators() {
        let selector = ValidatorSelector::new(&params());
        let mut stakes = table(&[(1, 1000)]);
        let prev = BlockHash::ZERO;
        assert!(selector.elect_leader(&mut stakes, Timestamp::new(10_000), &prev).is_none());
    }

    #[test]
    fn test_inactive_node_exits_early() {
        let selector = ValidatorSelector::new(&params());
        let mut stakes = table(&[(1, 1000)]);
        let now = Timestamp::new(60_000);
        assert!(selector.select_validator(&mut stakes, now, &BlockHash::ZERO, &key(2)).is_none());
    }

    #[test]
    fn test_sole_validator_always_wins() {
        let selector = ValidatorSelector::new(&params());
        let mut stakes = table(&[(1, 1000)]);
        for slot in 4..20u64 {
            let now = Timestamp::new(slot * 15_000);
            let prev = BlockHash::new([slot as u8; 32]);
            assert_eq!(
                selector.select_validator(&mut stakes, now, &prev, &key(1)),
                Some(key(1))
            );
        }
    }

    #[test]
    fn test_exactly_one_winner_per_slot() {
        let selector = ValidatorSelector::new(&params());
        let mut stakes = table(&[(1, 1000), (2, 3000), (3, 6000)]);
        let now = Timestamp::new(300_000);
        let prev = BlockHash::new([1; 32]);
        let winners = (1..=3)
            .filter(|&n| selector.select_validator(&mut stakes, now, &prev, &key(n)).is_some())
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_larger_stake_wins_more_often() {
        let selector = ValidatorSelector::new(&params());
        let mut stakes = table(&[(1, 1000), (2, 9000)]);
        let mut wins: HashMap<PublicKey, u32> = HashMap::new();
        for slot in 0..400u64 {
            let now = Timestamp::new(60_000 + slot * 15_000);
            let prev = BlockHash::new(blake2b_256(&slot.to_be_bytes()));
            let election = selector.elect_leader(&mut stakes, now, &prev).unwrap();
            *wins.entry(election.leader).or_default() += 1;
        }
        assert!(wins.get(&key(2)).copied().unwrap_or(0) > wins.get(&key(1)).copied().unwrap_or(0));
    }

    #[test]
    fn test_ties_go_to_lowest_key() {
        let validators = vec![
            ActiveValidator { public_key: key(1), stake: 1000 },
            ActiveValidator { public_key: key(2), stake: 1000 },
        ];
        assert!(!outranks(7, 1000, 7, 1000));
        let seed = [0u8; 32];
        let election = elect_from(&validators, 0, seed).unwrap();
        let d1 = draw(&seed, &key(1));
        let d2 = draw(&seed, &key(2));
        let expected = if outranks(d2, 1000, d1, 1000) { key(2) } else { key(1) };
        assert_eq!(election.leader, expected);
    }

    #[test]
    fn test_priority_cross_multiplication() {
        // 100/1000 vs 150/2000: 0.1 > 0.075, so b outranks a.
        assert!(outranks(150, 2000, 100, 1000));
        assert!(!outranks(100, 1000, 150, 2000));
    }

    #[test]
    fn test_zero_stake_records_never_lead() {
        let validators = vec![ActiveValidator { public_key: key(1), stake: 0 }];
        assert!(elect_from(&validators, 0, [0; 32]).is_none());
    }
}
