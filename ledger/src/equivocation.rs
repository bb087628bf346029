//! Equivocation detection: catch proposers that sign two different blocks
//! at the same height.
//!
//! Only one block per height can be canonical, so a proposer that signs
//! two conflicting blocks for one index is either malicious or has a
//! compromised key. Proofs are collected and logged; no penalty is applied.

use std::collections::HashMap;

use stakenet_types::{BlockHash, PublicKey, Timestamp};

use crate::block::Block;

/// Upper bound on (proposer, index) entries held at once.
pub const MAX_TRACKED: usize = 4096;
/// Proofs retained; the oldest are dropped first.
pub const MAX_PROOFS: usize = 256;

/// Evidence that a proposer signed two different blocks at one index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquivocationProof {
    pub proposer: PublicKey,
    pub index: u64,
    /// First block seen from the proposer at this index.
    pub block_a: BlockHash,
    /// The conflicting block.
    pub block_b: BlockHash,
    pub detected_at: Timestamp,
}

#[derive(Default)]
pub struct EquivocationDetector {
    /// (proposer, index) → first block hash seen.
    seen: HashMap<(PublicKey, u64), BlockHash>,
    proofs: Vec<EquivocationProof>,
}

impl EquivocationDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signed block. Returns a proof if the proposer already signed
    /// a different block at the same index. Genesis blocks are ignored.
    pub fn record(&mut self, block: &Block, now: Timestamp) -> Option<EquivocationProof> {
        if block.proposer.is_sentinel() {
            return None;
        }
        let key = (block.proposer.clone(), block.index);
        match self.seen.get(&key) {
            Some(existing) if *existing != block.hash => {
                let proof = EquivocationProof {
                    proposer: block.proposer.clone(),
                    index: block.index,
                    block_a: *existing,
                    block_b: block.hash,
                    detected_at: now,
                };
                if self.proofs.len() >= MAX_PROOFS {
                    self.proofs.remove(0);
                }
                self.proofs.push(proof.clone());
                Some(proof)
            }
            // Same block seen again.
            Some(_) => None,
            None if self.seen.len() >= MAX_TRACKED => None,
            None => {
                self.seen.insert(key, block.hash);
                None
            }
        }
    }

    pub fn proofs(&self) -> &[EquivocationProof] {
        &self.proofs
    }

    /// Forget entries and proofs below `index`.
    pub fn prune_below(&mut self, index: u64) {
        self.seen.retain(|(_, i), _| *i >= index);
        self.proofs.retain(|p| p.index >= index);
    }

    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}
