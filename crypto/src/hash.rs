//! Blake2b-256 content hashing.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use stakenet_types::{BlockHash, TxHash};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
///
/// Equivalent to hashing the concatenation of `parts`.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash the concatenated content fields of a block to produce its `BlockHash`.
pub fn hash_block(parts: &[&[u8]]) -> BlockHash {
    BlockHash::new(blake2b_256_multi(parts))
}

/// Hash a canonical transaction payload to produce its `TxHash`.
pub fn hash_transaction(payload: &[u8]) -> TxHash {
    TxHash::new(blake2b_256(payload))
}
