//! Block and chain validation.
//!
//! A block is accepted onto the local tip only if it passes both
//! [`verify_block`] (content, signature and proposer stake) and
//! [`is_valid_block`] (link to the predecessor and block spacing).

use stakenet_stake::StakeManager;
use stakenet_types::ChainParams;
use tracing::debug;

use crate::block::Block;
use crate::error::BlockError;

/// Check a block's hash, signature and that its proposer is an active
/// validator holding exactly the stake the block claims.
pub fn verify_block(block: &Block, stakes: &mut StakeManager) -> Result<(), BlockError> {
    block.verify_hash()?;
    block.verify_signature()?;

    let expected = stakes.get_stake(&block.proposer).map_or(0, |r| r.amount);
    if expected != block.stake {
        return Err(BlockError::StakeMismatch {
            expected,
            actual: block.stake,
        });
    }
    if !stakes.is_active_validator(&block.proposer, block.timestamp) {
        return Err(BlockError::InactiveProposer);
    }
    Ok(())
}

/// Check that `block` extends `previous` and respects the minimum block
/// interval.
pub fn is_valid_block(
    block: &Block,
    previous: &Block,
    params: &ChainParams,
) -> Result<(), BlockError> {
    let expected = previous.index + 1;
    if block.index != expected {
        return Err(BlockError::IndexGap {
            expected,
            got: block.index,
        });
    }
    if block.previous_hash != previous.hash {
        return Err(BlockError::LinkMismatch { index: block.index });
    }
    if block.timestamp <= previous.timestamp {
        return Err(BlockError::StaleTimestamp { index: block.index });
    }
    if block.last_block_time != previous.timestamp {
        return Err(BlockError::LastBlockTimeMismatch { index: block.index });
    }
    let elapsed = previous.timestamp.elapsed_since(block.timestamp);
    if elapsed < params.min_block_interval_ms {
        return Err(BlockError::TooFast {
            elapsed,
            min: params.min_block_interval_ms,
        });
    }
    Ok(())
}

/// Walk a candidate chain checking index continuity, hash links, recomputed
/// hashes, strictly increasing timestamps and proposer signatures.
///
/// A single-block chain is trivially valid. Stake is not checked: a peer's
/// history cannot be replayed against the local stake table.
pub fn validate_chain(chain: &[Block]) -> Result<(), BlockError> {
    if chain.is_empty() {
        return Err(BlockError::EmptyChain);
    }
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let result = check_link(current, previous)
            .and_then(|_| current.verify_hash())
            .and_then(|_| current.verify_signature());
        if let Err(e) = result {
            debug!(index = current.index, error = %e, "candidate chain invalid");
            return Err(e);
        }
    }
    Ok(())
}

fn check_link(current: &Block, previous: &Block) -> Result<(), BlockError> {
    if current.index != previous.index + 1 {
        return Err(BlockError::IndexGap {
            expected: previous.index + 1,
            got: current.index,
        });
    }
    if current.previous_hash != previous.hash {
        return Err(BlockError::LinkMismatch {
            index: current.index,
        });
    }
    if current.timestamp <= previous.timestamp {
        return Err(BlockError::StaleTimestamp {
            index: current.index,
        });
    }
    if current.last_block_time != previous.timestamp {
        return Err(BlockError::LastBlockTimeMismatch {
            index: current.index,
        });
    }
    Ok(())
}
