//! The canonical chain.

use std::sync::Arc;

use stakenet_stake::StakeManager;
use stakenet_store::{ChainStore, StoreError};
use stakenet_types::{ChainParams, Timestamp};
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::equivocation::{EquivocationDetector, EquivocationProof};
use crate::error::{BlockError, ChainError};
use crate::genesis::genesis_block;
use crate::validation::{is_valid_block, validate_chain, verify_block};

/// Heights of equivocation history kept behind the tip.
const EQUIVOCATION_WINDOW: u64 = 1024;

/// The local chain, kept in memory and mirrored to storage.
///
/// Every mutation writes the new sequence to storage first and only then
/// updates memory, so a failed write leaves both unchanged.
pub struct Blockchain {
    chain: Vec<Block>,
    store: Arc<dyn ChainStore + Send + Sync>,
    params: ChainParams,
    equivocation: EquivocationDetector,
}

impl Blockchain {
    /// Load the persisted chain, or mint and persist genesis if there is none.
    pub fn load_or_create(
        store: Arc<dyn ChainStore + Send + Sync>,
        params: ChainParams,
    ) -> Result<Self, ChainError> {
        let chain = match store.get_chain() {
            Ok(bytes) => serde_json::from_slice::<Vec<Block>>(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut blockchain = Self {
            chain,
            store,
            params,
            equivocation: EquivocationDetector::new(),
        };
        if blockchain.chain.is_empty() {
            let genesis = genesis_block(&blockchain.params)?;
            blockchain.persist(std::slice::from_ref(&genesis))?;
            blockchain.chain.push(genesis);
            info!("no stored chain, created genesis block");
        } else {
            info!(length = blockchain.chain.len(), "loaded chain from storage");
        }
        Ok(blockchain)
    }

    pub fn last_block(&self) -> &Block {
        // The chain always holds at least genesis.
        &self.chain[self.chain.len() - 1]
    }

    pub fn genesis(&self) -> &Block {
        &self.chain[0]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn contains_transaction(&self, id: &str) -> bool {
        self.chain.iter().any(|b| b.contains_transaction(id))
    }

    /// Validate `block` against the tip and the stake table, then append and
    /// persist it. On any failure the chain is left untouched.
    pub fn add_block_to_chain(
        &mut self,
        block: Block,
        stakes: &mut StakeManager,
    ) -> Result<(), ChainError> {
        verify_block(&block, stakes)?;
        is_valid_block(&block, self.last_block(), &self.params)?;

        self.chain.push(block);
        if let Err(e) = self.persist(&self.chain) {
            self.chain.pop();
            return Err(e.into());
        }

        let tip = self.last_block();
        info!(index = tip.index, hash = %tip.hash, txs = tip.transactions.len(), "block appended");
        let tip = tip.clone();
        self.observe(&tip, Timestamp::now());
        Ok(())
    }

    /// See [`validate_chain`].
    pub fn is_chain_valid(&self, candidate: &[Block]) -> bool {
        validate_chain(candidate).is_ok()
    }

    /// Adopt `candidate` if it is strictly longer than the local chain, valid,
    /// and shares our genesis. Returns whether the chain was replaced;
    /// rejected candidates are logged, not errors.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<bool, ChainError> {
        if candidate.len() <= self.chain.len() {
            debug!(
                received = candidate.len(),
                local = self.chain.len(),
                "received chain is not longer, ignoring"
            );
            return Ok(false);
        }
        if let Err(e) = self.check_candidate(&candidate) {
            warn!(received = candidate.len(), error = %e, "received chain is invalid, ignoring");
            return Ok(false);
        }

        self.persist(&candidate)?;
        let previous = self.chain.len();
        self.chain = candidate;
        info!(previous, length = self.chain.len(), "replaced chain");
        Ok(true)
    }

    fn check_candidate(&self, candidate: &[Block]) -> Result<(), BlockError> {
        validate_chain(candidate)?;
        if candidate[0] != *self.genesis() {
            return Err(BlockError::GenesisMismatch);
        }
        Ok(())
    }

    /// Record a block signed by its proposer, whether or not it was
    /// appended. Returns proof if the proposer already signed a different
    /// block at the same index. Blocks whose hash or signature does not
    /// verify are ignored.
    pub fn observe(&mut self, block: &Block, now: Timestamp) -> Option<EquivocationProof> {
        if let Err(e) = block.verify_hash().and_then(|_| block.verify_signature()) {
            debug!(index = block.index, error = %e, "not tracking unauthenticated block");
            return None;
        }
        let proof = self.equivocation.record(block, now);
        if let Some(proof) = &proof {
            warn!(
                proposer = %proof.proposer.short(),
                index = proof.index,
                first = %proof.block_a,
                second = %proof.block_b,
                "proposer equivocated"
            );
        }
        let tip = self.last_block().index;
        if tip > EQUIVOCATION_WINDOW {
            self.equivocation.prune_below(tip - EQUIVOCATION_WINDOW);
        }
        proof
    }

    pub fn equivocations(&self) -> &[EquivocationProof] {
        self.equivocation.proofs()
    }

    fn persist(&self, chain: &[Block]) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(chain).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.put_chain(&bytes)
    }
}
