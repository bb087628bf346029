//! Abstract storage traits for the stakenet node.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod chain;
pub mod error;

pub use chain::{ChainStore, CHAIN_KEY, WALLET_KEY};
pub use error::StoreError;
