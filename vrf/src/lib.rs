//! Leader election for block production.
//!
//! Every slot has exactly one leader, computed from the previous block hash,
//! the slot number and the active stake table. Any node holding the same
//! table elects the same leader without exchanging messages.
//!
//! The [`VrfProof`] a leader attaches to its block is an audit artifact:
//! peers can check it, but election never depends on it.

pub mod error;
pub mod proof;
pub mod selector;

pub use error::VrfError;
pub use proof::{compute_vrf_proof, verify_vrf_proof, VrfProof};
pub use selector::{slot_seed, Election, ValidatorSelector};
