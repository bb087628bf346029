//! Pre-built [`tracing::Span`] constructors for common node operations.
//!
//! Using consistent span names and field sets across the codebase makes it
//! easy to filter and correlate logs from one block or one peer.

use tracing::{info_span, Span};

/// Span covering the full processing of a single received or produced block.
pub fn block_process_span(index: u64, block_hash: &str) -> Span {
    info_span!("block_process", index, hash = %block_hash)
}

/// Span covering the handling of a single inbound network message.
pub fn network_recv_span(peer_id: u64, msg_type: &str) -> Span {
    info_span!("network_recv", peer_id, msg_type = %msg_type)
}

/// Span covering the broadcast of a message to connected peers.
pub fn broadcast_span(msg_type: &str, peer_count: usize) -> Span {
    info_span!("broadcast", msg_type = %msg_type, peer_count = %peer_count)
}

/// Span covering one slot's production attempt.
pub fn produce_span(slot: u64) -> Span {
    info_span!("produce", slot)
}
