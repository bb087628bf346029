//! The node's set of live connections and dialed addresses.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::mpsc;

use crate::connection::{Direction, PeerId};

/// A live connection as seen by the node.
#[derive(Debug)]
pub struct PeerHandle {
    pub address: String,
    pub direction: Direction,
    outbound: mpsc::Sender<String>,
}

impl PeerHandle {
    /// Queue an encoded frame without waiting. Returns `false` if the queue
    /// is full or the writer has gone away.
    pub fn try_send(&self, frame: String) -> bool {
        self.outbound.try_send(frame).is_ok()
    }
}

/// Live connections keyed by [`PeerId`], plus the outbound addresses that are
/// connected or being dialed.
///
/// An address stays in the dialed set from the moment a dial starts until
/// the dial fails or the resulting connection closes, so a directory refresh
/// never dials the same address twice.
#[derive(Debug)]
pub struct PeerSet {
    self_address: String,
    peers: BTreeMap<PeerId, PeerHandle>,
    dialed: BTreeSet<String>,
}

impl PeerSet {
    pub fn new(self_address: impl Into<String>) -> Self {
        Self {
            self_address: self_address.into(),
            peers: BTreeMap::new(),
            dialed: BTreeSet::new(),
        }
    }

    pub fn self_address(&self) -> &str {
        &self.self_address
    }

    pub fn insert(
        &mut self,
        peer_id: PeerId,
        address: String,
        direction: Direction,
        outbound: mpsc::Sender<String>,
    ) {
        if direction == Direction::Outbound {
            self.dialed.insert(address.clone());
        }
        self.peers.insert(
            peer_id,
            PeerHandle {
                address,
                direction,
                outbound,
            },
        );
    }

    /// Drop a closed connection. Dropping the handle closes its writer.
    pub fn remove(&mut self, peer_id: PeerId) -> Option<PeerHandle> {
        let handle = self.peers.remove(&peer_id)?;
        if handle.direction == Direction::Outbound {
            self.dialed.remove(&handle.address);
        }
        Some(handle)
    }

    /// Claim `address` for dialing. Returns `false` for our own address and
    /// for addresses already connected or in flight.
    pub fn begin_dial(&mut self, address: &str) -> bool {
        if address == self.self_address || self.dialed.contains(address) {
            return false;
        }
        self.dialed.insert(address.to_string());
        true
    }

    /// Forget an address whose dial failed.
    pub fn dial_failed(&mut self, address: &str) -> bool {
        self.dialed.remove(address)
    }

    pub fn get(&self, peer_id: PeerId) -> Option<&PeerHandle> {
        self.peers.get(&peer_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeerId, &PeerHandle)> {
        self.peers.iter().map(|(id, handle)| (*id, handle))
    }

    /// Addresses of all live connections.
    pub fn addresses(&self) -> Vec<String> {
        self.peers.values().map(|p| p.address.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELF: &str = "ws://localhost:5001";

    #[test]
    fn test_begin_dial_skips_self_and_duplicates() {
        let mut peers = PeerSet::new(SELF);
        assert!(!peers.begin_dial(SELF));
        assert!(peers.begin_dial("ws://localhost:5002"));
        assert!(!peers.begin_dial("ws://localhost:5002"));
    }

    #[test]
    fn test_failed_dial_can_be_retried() {
        let mut peers = PeerSet::new(SELF);
        assert!(peers.begin_dial("ws://localhost:5002"));
        assert!(peers.dial_failed("ws://localhost:5002"));
        assert!(peers.begin_dial("ws://localhost:5002"));
    }

    #[test]
    fn test_closed_outbound_frees_address() {
        let mut peers = PeerSet::new(SELF);
        let (tx, _rx) = mpsc::channel(1);
        peers.begin_dial("ws://localhost:5002");
        peers.insert(7, "ws://localhost:5002".into(), Direction::Outbound, tx);
        assert_eq!(peers.len(), 1);
        assert!(!peers.begin_dial("ws://localhost:5002"));

        let handle = peers.remove(7).unwrap();
        assert_eq!(handle.address, "ws://localhost:5002");
        assert!(peers.is_empty());
        assert!(peers.begin_dial("ws://localhost:5002"));
    }

    #[test]
    fn test_inbound_does_not_claim_address() {
        let mut peers = PeerSet::new(SELF);
        let (tx, _rx) = mpsc::channel(1);
        peers.insert(1, "127.0.0.1:40000".into(), Direction::Inbound, tx);
        assert!(peers.begin_dial("127.0.0.1:40000"));
        assert!(peers.remove(1).is_some());
        assert!(peers.remove(1).is_none());
    }

    #[test]
    fn test_try_send_reports_full_queue() {
        let mut peers = PeerSet::new(SELF);
        let (tx, _rx) = mpsc::channel(1);
        peers.insert(1, "a".into(), Direction::Inbound, tx);
        let handle = peers.get(1).unwrap();
        assert!(handle.try_send("one".into()));
        assert!(!handle.try_send("two".into()));
    }
}
