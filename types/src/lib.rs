//! Fundamental types for the stakenet node.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! hashes, keys, signatures, millisecond timestamps and the chain parameters.

pub mod error;
pub mod hash;
pub mod hex_serde;
pub mod keys;
pub mod params;
pub mod time;

pub use error::ParseError;
pub use hash::{BlockHash, TxHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::ChainParams;
pub use time::Timestamp;
