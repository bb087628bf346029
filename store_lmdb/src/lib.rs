//! LMDB storage backend for the stakenet node.
//!
//! Implements the storage traits from `stakenet-store` using the `heed` LMDB
//! bindings. All records live in one named database inside a single
//! environment.

pub mod chain;
pub mod environment;
pub mod error;

pub use chain::LmdbChainStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
