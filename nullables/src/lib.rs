//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the node (clock, storage, the bootstrap
//! directory and time service, remote peers) has a test-friendly stand-in
//! here. They:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod coordinator;
pub mod network;
pub mod store;

pub use clock::NullClock;
pub use coordinator::NullCoordinator;
pub use network::NullPeer;
pub use store::NullStore;
