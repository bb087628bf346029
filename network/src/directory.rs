//! Collaborator seams for the peer directory and the block-time coordinator.

use std::future::Future;

use serde::{Deserialize, Serialize};
use stakenet_types::Timestamp;

use crate::error::NetworkError;

/// The coordinator's view of block timing, as returned by `GET /block-time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTiming {
    pub last_block_time: Timestamp,
    pub next_block_time: Timestamp,
    pub current_time: Timestamp,
}

impl BlockTiming {
    /// The next production instant expressed on the local clock.
    ///
    /// Half the observed offset between `local_now` and the coordinator's
    /// clock is treated as one-way latency and added to `next_block_time`.
    pub fn compensated_next(&self, local_now: Timestamp) -> Timestamp {
        let latency = (i128::from(local_now.as_millis()) - i128::from(self.current_time.as_millis())) / 2;
        let next = i128::from(self.next_block_time.as_millis()) + latency;
        Timestamp::new(next.clamp(0, i128::from(u64::MAX)) as u64)
    }
}

/// Registry of node addresses.
pub trait PeerDirectory: Send + Sync {
    /// Announce `address` so other nodes can find us.
    fn register(&self, address: &str) -> impl Future<Output = Result<(), NetworkError>> + Send;

    /// Every address currently registered, ours included.
    fn peers(&self) -> impl Future<Output = Result<Vec<String>, NetworkError>> + Send;
}

/// Source of the network-wide block production schedule.
pub trait TimeCoordinator: Send + Sync {
    fn block_timing(&self) -> impl Future<Output = Result<BlockTiming, NetworkError>> + Send;
}
