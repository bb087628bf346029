use thiserror::Error;

/// Why a block or candidate chain was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("block {index}: hash does not match contents")]
    HashMismatch { index: u64 },

    #[error("block {index}: proposer signature does not verify")]
    BadSignature { index: u64 },

    #[error("block {index}: failed to encode contents: {reason}")]
    Encoding { index: u64, reason: String },

    #[error("stake mismatch: proposer holds {expected}, block claims {actual}")]
    StakeMismatch { expected: u64, actual: u64 },

    #[error("proposer is not an active validator")]
    InactiveProposer,

    #[error("index gap: expected {expected}, got {got}")]
    IndexGap { expected: u64, got: u64 },

    #[error("block {index}: previous hash does not match predecessor")]
    LinkMismatch { index: u64 },

    #[error("block {index}: timestamp not after predecessor")]
    StaleTimestamp { index: u64 },

    #[error("block {index}: last block time does not match predecessor timestamp")]
    LastBlockTimeMismatch { index: u64 },

    #[error("block produced too fast: {elapsed}ms since last block, minimum {min}ms")]
    TooFast { elapsed: u64, min: u64 },

    #[error("candidate chain is empty")]
    EmptyChain,

    #[error("candidate chain starts from a different genesis")]
    GenesisMismatch,
}

impl BlockError {
    /// The block's contents or signature cannot be trusted.
    pub fn is_crypto_failure(&self) -> bool {
        matches!(
            self,
            Self::HashMismatch { .. } | Self::BadSignature { .. } | Self::Encoding { .. }
        )
    }

    /// The block is authentic but does not fit the local chain or stake
    /// table. Resyncing with the sender may resolve it.
    pub fn is_consensus_rejection(&self) -> bool {
        !self.is_crypto_failure()
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("block rejected: {0}")]
    Rejected(#[from] BlockError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] stakenet_store::StoreError),
}
