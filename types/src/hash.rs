//! Content hash types for blocks and transactions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hex_serde;
use crate::ParseError;

/// A 32-byte block content hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash(#[serde(with = "crate::hex_serde")] [u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The first 8 bytes read as a big-endian integer.
    ///
    /// Used as the numeric value of a hash when ranking election candidates.
    pub fn leading_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(buf)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for BlockHash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_serde::decode_fixed(s).map(Self)
    }
}

/// A 32-byte transaction payload hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(#[serde(with = "crate::hex_serde")] [u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_serializes_as_hex_string() {
        let hash = BlockHash::new([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: BlockHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn block_hash_parses_display_form() {
        let hash = BlockHash::new([7; 32]);
        let parsed: BlockHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn leading_u64_reads_big_endian_prefix() {
        let mut bytes = [0u8; 32];
        bytes[7] = 1;
        bytes[8] = 0xff;
        assert_eq!(BlockHash::new(bytes).leading_u64(), 1);
    }

    #[test]
    fn short_hash_string_is_rejected() {
        assert!(serde_json::from_str::<BlockHash>("\"abcd\"").is_err());
    }
}
