//! Block structure and content hashing.

use serde::{Deserialize, Serialize};
use stakenet_crypto::{hash_block, sign_message, verify_signature};
use stakenet_transactions::Transaction;
use stakenet_types::{BlockHash, KeyPair, PublicKey, Signature, Timestamp};
use stakenet_vrf::VrfProof;

use crate::error::BlockError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Height in the chain. Genesis is 0.
    pub index: u64,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
    pub previous_hash: BlockHash,
    #[serde(rename = "proposerPublicKey")]
    pub proposer: PublicKey,
    /// The proposer's bonded stake when the block was built.
    pub stake: u64,
    /// Timestamp of the predecessor at build time.
    pub last_block_time: Timestamp,
    pub hash: BlockHash,
    /// Proposer signature over `hash`.
    pub signature: Signature,
    /// Not covered by `hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf_proof: Option<VrfProof>,
}

/// The fields a block hash commits to.
pub struct BlockContents<'a> {
    pub index: u64,
    pub timestamp: Timestamp,
    pub transactions: &'a [Transaction],
    pub previous_hash: &'a BlockHash,
    pub proposer: &'a PublicKey,
    pub stake: u64,
    pub last_block_time: Timestamp,
}

impl BlockContents<'_> {
    /// `H(index ++ timestamp ++ json(transactions) ++ previous_hash ++
    /// proposer ++ stake ++ last_block_time)`, integers as 8 big-endian bytes.
    pub fn hash(&self) -> Result<BlockHash, BlockError> {
        let transactions =
            serde_json::to_vec(self.transactions).map_err(|e| BlockError::Encoding {
                index: self.index,
                reason: e.to_string(),
            })?;
        Ok(hash_block(&[
            &self.index.to_be_bytes(),
            &self.timestamp.as_millis().to_be_bytes(),
            &transactions,
            self.previous_hash.as_bytes(),
            self.proposer.as_bytes(),
            &self.stake.to_be_bytes(),
            &self.last_block_time.as_millis().to_be_bytes(),
        ]))
    }
}

impl Block {
    /// Build, hash and sign a block on top of `previous`.
    pub fn create(
        previous: &Block,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
        stake: u64,
        keys: &KeyPair,
    ) -> Result<Self, BlockError> {
        let index = previous.index + 1;
        let hash = BlockContents {
            index,
            timestamp,
            transactions: &transactions,
            previous_hash: &previous.hash,
            proposer: &keys.public,
            stake,
            last_block_time: previous.timestamp,
        }
        .hash()?;

        Ok(Self {
            index,
            timestamp,
            transactions,
            previous_hash: previous.hash,
            proposer: keys.public.clone(),
            stake,
            last_block_time: previous.timestamp,
            signature: sign_message(hash.as_bytes(), &keys.private),
            hash,
            vrf_proof: None,
        })
    }

    pub fn with_vrf_proof(mut self, proof: VrfProof) -> Self {
        self.vrf_proof = Some(proof);
        self
    }

    pub fn contents(&self) -> BlockContents<'_> {
        BlockContents {
            index: self.index,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            previous_hash: &self.previous_hash,
            proposer: &self.proposer,
            stake: self.stake,
            last_block_time: self.last_block_time,
        }
    }

    pub fn compute_hash(&self) -> Result<BlockHash, BlockError> {
        self.contents().hash()
    }

    /// Recomputed hash matches the stored one.
    pub fn verify_hash(&self) -> Result<(), BlockError> {
        if self.compute_hash()? != self.hash {
            return Err(BlockError::HashMismatch { index: self.index });
        }
        Ok(())
    }

    /// The signature over `hash` verifies against the proposer key.
    pub fn verify_signature(&self) -> Result<(), BlockError> {
        if !verify_signature(self.hash.as_bytes(), &self.signature, &self.proposer) {
            return Err(BlockError::BadSignature { index: self.index });
        }
        Ok(())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn contains_transaction(&self, id: &str) -> bool {
        self.transactions.iter().any(|tx| tx.id == id)
    }
}
