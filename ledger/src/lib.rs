//! The linear block chain.
//!
//! Blocks are produced by the elected leader of each slot, link to their
//! predecessor by hash and are signed by their proposer. Nodes keep the
//! longest valid chain they have seen and persist every change before it
//! becomes visible in memory.

pub mod block;
pub mod blockchain;
pub mod equivocation;
pub mod error;
pub mod genesis;
pub mod validation;

pub use block::Block;
pub use blockchain::Blockchain;
pub use equivocation::{EquivocationDetector, EquivocationProof};
pub use error::{BlockError, ChainError};
pub use genesis::genesis_block;
pub use validation::{is_valid_block, validate_chain, verify_block};
