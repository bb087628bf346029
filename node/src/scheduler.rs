//! Block production timing.
//!
//! The scheduler holds a single next-production instant taken from the
//! time coordinator. It sleeps until that instant, re-syncs, then asks the
//! node task to attempt production. A wake that finds the instant already
//! behind it re-syncs without producing. When the coordinator cannot be
//! reached the next instant falls back to one slot after the current one.

use std::sync::Arc;
use std::time::Duration;

use stakenet_network::TimeCoordinator;
use stakenet_types::{ChainParams, Timestamp};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::node::NodeHandle;
use crate::NodeError;

pub struct BlockScheduler<T> {
    coordinator: Arc<T>,
    node: NodeHandle,
    slot_ms: u64,
}

impl<T: TimeCoordinator + 'static> BlockScheduler<T> {
    pub fn new(coordinator: Arc<T>, node: NodeHandle, params: &ChainParams) -> Self {
        Self {
            coordinator,
            node,
            slot_ms: params.slot_duration_ms.max(1),
        }
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut next = self.next_instant(Timestamp::now()).await;
        loop {
            let now = Timestamp::now();
            if now > next {
                debug!(missed_by_ms = next.elapsed_since(now), "production instant passed, resyncing");
                next = self.next_instant(now).await;
                continue;
            }

            let wait = Duration::from_millis(next.as_millis() - now.as_millis());
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("block scheduler shutting down");
                    return;
                }
                _ = tokio::time::sleep_until(Instant::now() + wait) => {}
            }

            let fired = next;
            next = self.next_instant(fired).await;

            match self.node.produce_block().await {
                Ok(Some(block)) => debug!(index = block.index, "slot produced a block"),
                Ok(None) => debug!("not the slot leader"),
                Err(NodeError::Stopped) => return,
                Err(e) => warn!(error = %e, "block production failed"),
            }
        }
    }

    /// The coordinator's next production instant, latency compensated, or
    /// one slot past `after` if the coordinator is unreachable or behind.
    async fn next_instant(&self, after: Timestamp) -> Timestamp {
        let local_now = Timestamp::now();
        match self.coordinator.block_timing().await {
            Ok(timing) => {
                let next = timing.compensated_next(local_now);
                if next > after {
                    return next;
                }
                debug!(next = %next, after = %after, "coordinator instant is stale");
            }
            Err(e) => warn!(error = %e, "block time sync failed"),
        }
        after.saturating_add(self.slot_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeCommand;
    use stakenet_nullables::NullCoordinator;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn params(slot_ms: u64) -> ChainParams {
        ChainParams {
            slot_duration_ms: slot_ms,
            ..ChainParams::standard()
        }
    }

    #[tokio::test]
    async fn test_sleeps_until_instant_then_resyncs_and_produces() {
        let coordinator = Arc::new(NullCoordinator::new());
        let now = Timestamp::now();
        coordinator.push_next_block_at(now.saturating_add(50), now);
        coordinator.push_next_block_at(now.saturating_add(60_000), now);

        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = BlockScheduler::new(coordinator.clone(), NodeHandle::new(tx), &params(15_000))
            .spawn(shutdown_rx);

        let command = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("scheduler never fired")
            .unwrap();
        let NodeCommand::ProduceBlock { reply } = command else {
            panic!("expected ProduceBlock");
        };
        assert!(Timestamp::now() >= now.saturating_add(50));
        assert_eq!(coordinator.timing_requests(), 2);
        reply.send(Ok(None)).unwrap();

        shutdown_tx.send(()).unwrap();
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_coordinator_falls_back_to_slot() {
        let coordinator = Arc::new(NullCoordinator::new());
        coordinator.set_unreachable(true);

        let (tx, mut rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        BlockScheduler::new(coordinator.clone(), NodeHandle::new(tx), &params(40)).spawn(shutdown_rx);

        for _ in 0..2 {
            let command = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
            let NodeCommand::ProduceBlock { reply } = command else {
                panic!("expected ProduceBlock");
            };
            let _ = reply.send(Ok(None));
        }
        assert!(coordinator.timing_requests() >= 3);
    }

    #[tokio::test]
    async fn test_stale_instant_is_never_produced() {
        let coordinator = Arc::new(NullCoordinator::new());
        let now = Timestamp::now();
        // Always an instant in the past; the scheduler must fall back to slots.
        coordinator.push_next_block_at(Timestamp::new(now.as_millis() - 10_000), now);

        let (tx, mut rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        BlockScheduler::new(coordinator.clone(), NodeHandle::new(tx), &params(40)).spawn(shutdown_rx);

        let command = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(command, NodeCommand::ProduceBlock { .. }));
        assert!(Timestamp::now() >= now.saturating_add(40));
    }

    #[tokio::test]
    async fn test_stops_when_node_is_gone() {
        let coordinator = Arc::new(NullCoordinator::new());
        coordinator.set_unreachable(true);

        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task =
            BlockScheduler::new(coordinator, NodeHandle::new(tx), &params(20)).spawn(shutdown_rx);
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }
}
