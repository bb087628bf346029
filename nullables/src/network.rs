//! Nullable network — a remote peer that records what it is sent.

use stakenet_messages::Message;
use stakenet_network::{Direction, PeerId, PeerSet};
use tokio::sync::mpsc;

/// The far end of a fake connection.
///
/// `attach` registers the peer in a [`PeerSet`] exactly as the transport
/// would after a handshake; everything the node queues for it can then be
/// drained and decoded here.
#[derive(Debug)]
pub struct NullPeer {
    pub peer_id: PeerId,
    pub address: String,
    outbound: mpsc::Receiver<String>,
    sent: mpsc::Sender<String>,
}

impl NullPeer {
    /// A peer that is not yet attached to any set.
    pub fn new(peer_id: PeerId, address: impl Into<String>, capacity: usize) -> Self {
        let (sent, outbound) = mpsc::channel(capacity.max(1));
        Self {
            peer_id,
            address: address.into(),
            outbound,
            sent,
        }
    }

    /// The sender the node writes to, for feeding a `Connected` event.
    pub fn sender(&self) -> mpsc::Sender<String> {
        self.sent.clone()
    }

    /// Create an outbound peer and register it in `peers`.
    pub fn attach(peers: &mut PeerSet, peer_id: PeerId, address: impl Into<String>) -> Self {
        let peer = Self::new(peer_id, address, 1024);
        peers.insert(peer_id, peer.address.clone(), Direction::Outbound, peer.sender());
        peer
    }

    /// Every message queued for this peer since the last call.
    pub fn received(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            if let Ok(message) = stakenet_protocol::decode(&frame) {
                messages.push(message);
            }
        }
        messages
    }

    /// Wire names of [`received`](Self::received), for terse assertions.
    pub fn received_kinds(&mut self) -> Vec<&'static str> {
        self.received().iter().map(Message::kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_receive() {
        let mut peers = PeerSet::new("ws://localhost:5001");
        let mut peer = NullPeer::attach(&mut peers, 3, "ws://localhost:5003");
        assert_eq!(peers.len(), 1);

        let frame = stakenet_protocol::encode(&Message::RequestChain).unwrap();
        assert!(peers.get(3).unwrap().try_send(frame));
        assert_eq!(peer.received_kinds(), vec!["REQUEST_CHAIN"]);
        assert!(peer.received().is_empty());
    }
}
