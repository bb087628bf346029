//! Flood broadcasting.
//!
//! Messages are encoded once and the resulting frame is queued on every
//! target peer's outbound channel with `try_send`. A slow peer whose queue is
//! full misses the frame instead of stalling the node.

use stakenet_messages::Message;
use stakenet_protocol::ProtocolError;

use crate::connection::PeerId;
use crate::peers::PeerSet;

/// Outcome of a broadcast attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Number of peers the frame was queued for.
    pub sent: usize,
    /// Number of peers whose queue was full or closed.
    pub failed: usize,
}

/// Queue `message` for every connected peer.
pub fn broadcast_to_all(peers: &PeerSet, message: &Message) -> Result<BroadcastResult, ProtocolError> {
    broadcast(peers, message, None)
}

/// Queue `message` for every connected peer except `sender`.
pub fn broadcast_except(
    peers: &PeerSet,
    message: &Message,
    sender: PeerId,
) -> Result<BroadcastResult, ProtocolError> {
    broadcast(peers, message, Some(sender))
}

fn broadcast(
    peers: &PeerSet,
    message: &Message,
    except: Option<PeerId>,
) -> Result<BroadcastResult, ProtocolError> {
    let frame = stakenet_protocol::encode(message)?;
    let mut result = BroadcastResult::default();

    for (peer_id, handle) in peers.iter() {
        if Some(peer_id) == except {
            continue;
        }
        if handle.try_send(frame.clone()) {
            result.sent += 1;
        } else {
            result.failed += 1;
        }
    }

    Ok(result)
}

/// Queue `message` for a single peer. Returns `Ok(false)` if the peer is
/// gone or its queue is full.
pub fn send_to(peers: &PeerSet, peer_id: PeerId, message: &Message) -> Result<bool, ProtocolError> {
    let Some(handle) = peers.get(peer_id) else {
        return Ok(false);
    };
    Ok(handle.try_send(stakenet_protocol::encode(message)?))
}
