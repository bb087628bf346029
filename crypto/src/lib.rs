//! Cryptographic primitives for stakenet.
//!
//! - **Ed25519** for signing and signature verification (blocks, transactions, VRF proofs)
//! - **Blake2b-256** for fixed-length content hashing

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, hash_block, hash_transaction};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
