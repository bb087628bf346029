//! Chain and node key persistence.

use crate::StoreError;

/// Key under which the serialized block sequence is stored.
pub const CHAIN_KEY: &str = "blockchain";

/// Key under which the node's private key bytes are stored.
pub const WALLET_KEY: &str = "wallet_key";

/// Byte-level persistence for the canonical chain and the node key.
///
/// The chain is always written whole: a put replaces the previous sequence
/// in a single write, so a reader never observes a partially replaced chain.
pub trait ChainStore {
    /// Retrieve the serialized chain. `StoreError::NotFound` if none has been
    /// written yet.
    fn get_chain(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the stored chain.
    fn put_chain(&self, chain: &[u8]) -> Result<(), StoreError>;

    /// Retrieve the node's private key bytes.
    fn get_wallet_key(&self) -> Result<Vec<u8>, StoreError>;

    fn put_wallet_key(&self, key: &[u8]) -> Result<(), StoreError>;
}
