//! stakenet full node: ties the chain, stake table, transaction pool and
//! peer network together.
//!
//! The node:
//! - Handshakes with every new peer and answers the gossip protocol
//! - Validates, appends and relays blocks, adopting longer valid chains
//! - Elects a leader every slot and produces a block when it wins
//! - Keeps its stake table in sync with peers
//! - Re-discovers peers through the bootstrap directory

pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod scheduler;
pub mod shutdown;
pub mod state;
pub mod tracing_spans;

pub use config::NodeConfig;
pub use error::NodeError;
pub use keys::load_or_create_keypair;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{open_chain_store, NodeCommand, NodeHandle, StakeNode};
pub use scheduler::BlockScheduler;
pub use shutdown::{ShutdownController, StopSignal};
pub use state::{BlockOutcome, NodeState, NodeStatus};
