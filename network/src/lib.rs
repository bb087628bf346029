//! P2P networking layer for stakenet.
//!
//! Owns the WebSocket transport (listener, dialer, per-connection reader and
//! writer tasks), the set of live peers, flood broadcasting, and the HTTP
//! client for the peer directory / block-time coordinator.

pub mod bootstrap;
pub mod broadcast;
pub mod connection;
pub mod directory;
pub mod error;
pub mod peers;
pub mod transport;

pub use bootstrap::BootstrapClient;
pub use broadcast::{broadcast_except, broadcast_to_all, send_to, BroadcastResult};
pub use connection::{spawn_connection, ConnectionEvent, Direction, PeerId};
pub use directory::{BlockTiming, PeerDirectory, TimeCoordinator};
pub use error::NetworkError;
pub use peers::{PeerHandle, PeerSet};
pub use transport::Transport;
