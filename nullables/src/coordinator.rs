//! Nullable coordinator — a scripted peer directory and block-time service.

use stakenet_network::{BlockTiming, NetworkError, PeerDirectory, TimeCoordinator};
use stakenet_types::Timestamp;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Stands in for the bootstrap service.
///
/// Registrations are recorded and added to the peer list. Block timings are
/// served from a queue; once the queue is drained the last timing repeats.
#[derive(Debug, Default)]
pub struct NullCoordinator {
    peers: Mutex<Vec<String>>,
    registrations: Mutex<Vec<String>>,
    timings: Mutex<VecDeque<BlockTiming>>,
    last_timing: Mutex<Option<BlockTiming>>,
    unreachable: AtomicBool,
    timing_requests: AtomicUsize,
}

impl NullCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peers<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let coordinator = Self::new();
        coordinator.set_peers(peers);
        coordinator
    }

    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.peers.lock().unwrap() = peers.into_iter().map(Into::into).collect();
    }

    /// Queue a timing response.
    pub fn push_timing(&self, timing: BlockTiming) {
        self.timings.lock().unwrap().push_back(timing);
    }

    /// Queue a timing whose coordinator clock matches `now` exactly.
    pub fn push_next_block_at(&self, next: Timestamp, now: Timestamp) {
        self.push_timing(BlockTiming {
            last_block_time: now,
            next_block_time: next,
            current_time: now,
        });
    }

    /// Make every call fail as if the service were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Addresses passed to `register`, in call order.
    pub fn registrations(&self) -> Vec<String> {
        self.registrations.lock().unwrap().clone()
    }

    /// How many times `block_timing` has been called.
    pub fn timing_requests(&self) -> usize {
        self.timing_requests.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), NetworkError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("null coordinator offline".into()));
        }
        Ok(())
    }
}

impl PeerDirectory for NullCoordinator {
    async fn register(&self, address: &str) -> Result<(), NetworkError> {
        self.check_reachable()?;
        self.registrations.lock().unwrap().push(address.to_string());
        let mut peers = self.peers.lock().unwrap();
        if !peers.iter().any(|p| p == address) {
            peers.push(address.to_string());
        }
        Ok(())
    }

    async fn peers(&self) -> Result<Vec<String>, NetworkError> {
        self.check_reachable()?;
        Ok(self.peers.lock().unwrap().clone())
    }
}

impl TimeCoordinator for NullCoordinator {
    async fn block_timing(&self) -> Result<BlockTiming, NetworkError> {
        self.timing_requests.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let next = self.timings.lock().unwrap().pop_front();
        let mut last = self.last_timing.lock().unwrap();
        if let Some(timing) = next {
            *last = Some(timing);
        }
        (*last).ok_or_else(|| NetworkError::Directory("no block timing scripted".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_adds_to_peer_list() {
        let coordinator = NullCoordinator::with_peers(["ws://a:1"]);
        coordinator.register("ws://b:2").await.unwrap();
        coordinator.register("ws://b:2").await.unwrap();
        assert_eq!(coordinator.peers().await.unwrap(), vec!["ws://a:1", "ws://b:2"]);
        assert_eq!(coordinator.registrations().len(), 2);
    }

    #[tokio::test]
    async fn test_last_timing_repeats() {
        let coordinator = NullCoordinator::new();
        assert!(coordinator.block_timing().await.is_err());

        coordinator.push_next_block_at(Timestamp::new(15_000), Timestamp::new(1_000));
        coordinator.push_next_block_at(Timestamp::new(30_000), Timestamp::new(16_000));
        let first = coordinator.block_timing().await.unwrap();
        let second = coordinator.block_timing().await.unwrap();
        let third = coordinator.block_timing().await.unwrap();
        assert_eq!(first.next_block_time, Timestamp::new(15_000));
        assert_eq!(second.next_block_time, Timestamp::new(30_000));
        assert_eq!(third, second);
        assert_eq!(coordinator.timing_requests(), 4);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let coordinator = NullCoordinator::with_peers(["ws://a:1"]);
        coordinator.set_unreachable(true);
        assert!(coordinator.peers().await.is_err());
        assert!(coordinator.register("ws://b:2").await.is_err());
        assert!(coordinator.registrations().is_empty());
    }
}
