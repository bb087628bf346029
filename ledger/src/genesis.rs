//! Genesis block creation.
//!
//! The genesis block is the same on every node of a network: index 0, no
//! transactions, an all-zero previous hash, the sentinel proposer key, zero
//! stake and an all-zero signature. Only `ChainParams::genesis_timestamp`
//! varies it, so nodes with matching parameters share a genesis hash.

use stakenet_types::{BlockHash, ChainParams, PublicKey, Signature, Timestamp};

use crate::block::Block;
use crate::error::BlockError;

pub fn genesis_block(params: &ChainParams) -> Result<Block, BlockError> {
    let timestamp = Timestamp::new(params.genesis_timestamp);
    let mut block = Block {
        index: 0,
        timestamp,
        transactions: Vec::new(),
        previous_hash: BlockHash::ZERO,
        proposer: PublicKey::SENTINEL,
        stake: 0,
        last_block_time: timestamp,
        hash: BlockHash::ZERO,
        signature: Signature::EMPTY,
        vrf_proof: None,
    };
    block.hash = block.compute_hash()?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_deterministic() {
        let params = ChainParams::standard();
        let a = genesis_block(&params).unwrap();
        let b = genesis_block(&params).unwrap();
        assert_eq!(a, b);
        assert!(!a.hash.is_zero());
        assert!(a.proposer.is_sentinel());
    }

    #[test]
    fn test_genesis_timestamp_changes_hash() {
        let a = genesis_block(&ChainParams::standard()).unwrap();
        let b = genesis_block(&ChainParams {
            genesis_timestamp: 1,
            ..ChainParams::standard()
        })
        .unwrap();
        assert_ne!(a.hash, b.hash);
    }
}
