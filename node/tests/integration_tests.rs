//! Multi-node scenarios: gossip between node states, chain adoption,
//! restart from LMDB, and two live nodes talking over real sockets.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use stakenet_ledger::Blockchain;
use stakenet_messages::Message;
use stakenet_network::Direction;
use stakenet_node::{open_chain_store, BlockOutcome, NodeConfig, NodeHandle, NodeState, StakeNode};
use stakenet_nullables::{NullClock, NullCoordinator, NullPeer, NullStore};
use stakenet_transactions::SensorReading;
use stakenet_types::{ChainParams, Timestamp};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

const MATURE: Timestamp = Timestamp::new(60_001);

fn node(seed: u8) -> NodeState {
    let chain = Blockchain::load_or_create(Arc::new(NullStore::new()), ChainParams::standard())
        .unwrap();
    let keys = stakenet_crypto::keypair_from_seed(&[seed; 32]);
    NodeState::new(keys, chain, format!("ws://node{seed}:5001"))
}

/// Connect `a` and `b` through a pair of fake peers, returning the peer
/// that records what `a` sends to `b` and the one recording `b` to `a`.
fn link(a: &mut NodeState, b: &mut NodeState) -> (NullPeer, NullPeer) {
    let a_to_b = NullPeer::new(2, "ws://node2:5001", 1024);
    let b_to_a = NullPeer::new(1, "ws://node1:5001", 1024);
    a.on_connected(2, a_to_b.address.clone(), Direction::Outbound, a_to_b.sender());
    b.on_connected(1, b_to_a.address.clone(), Direction::Inbound, b_to_a.sender());
    (a_to_b, b_to_a)
}

/// Deliver everything queued on `wire` to `to` as if it came from `from`.
fn deliver(wire: &mut NullPeer, to: &mut NodeState, from: u64, now: Timestamp) -> usize {
    let messages = wire.received();
    let count = messages.len();
    for message in messages {
        to.handle_message(from, message, now);
    }
    count
}

/// Exchange queued traffic until both sides go quiet.
fn settle(a: &mut NodeState, b: &mut NodeState, a_to_b: &mut NullPeer, b_to_a: &mut NullPeer) {
    loop {
        let moved = deliver(a_to_b, b, 1, MATURE) + deliver(b_to_a, a, 2, MATURE);
        if moved == 0 {
            break;
        }
    }
}

#[test]
fn test_gossiped_block_gives_identical_tips() {
    let mut a = node(1);
    let mut b = node(2);
    a.add_stake(1000, Timestamp::EPOCH).unwrap();

    let (mut a_to_b, mut b_to_a) = link(&mut a, &mut b);
    settle(&mut a, &mut b, &mut a_to_b, &mut b_to_a);
    assert_eq!(b.stakes().get_total_stake(), 1000);

    let block = a.produce_block(MATURE).unwrap().expect("a is the only validator");
    assert_eq!(deliver(&mut a_to_b, &mut b, 1, MATURE), 1);

    assert_eq!(a.chain().len(), 2);
    assert_eq!(b.chain().len(), 2);
    assert_eq!(b.chain().last_block().hash, block.hash);
    assert_eq!(a.chain().last_block().hash, b.chain().last_block().hash);
    // b relays to everyone except the sender.
    assert!(b_to_a.received().is_empty());
}

#[test]
fn test_longer_chain_adopted_and_shorter_ignored() {
    let clock = NullClock::new(MATURE.as_millis());
    let mut producer = node(1);
    producer.add_stake(1000, Timestamp::EPOCH).unwrap();
    producer.produce_block(clock.now()).unwrap().unwrap();
    producer.produce_block(clock.advance(15_000)).unwrap().unwrap();
    let long = producer.chain().blocks().to_vec();
    assert_eq!(long.len(), 3);

    let mut b = node(2);
    assert_eq!(b.chain().len(), 1);
    b.handle_message(1, Message::Chain { chain: long.clone() }, MATURE);
    assert_eq!(b.chain().len(), 3);
    assert_eq!(b.chain().blocks(), &long[..]);

    let short = long[..1].to_vec();
    b.handle_message(1, Message::Chain { chain: short }, MATURE);
    assert_eq!(b.chain().len(), 3);
    assert_eq!(b.metrics().chain_replacements.get(), 1);
}

#[test]
fn test_late_joiner_catches_up_through_chain_request() {
    let clock = NullClock::new(MATURE.as_millis());
    let mut a = node(1);
    a.add_stake(1000, Timestamp::EPOCH).unwrap();
    a.produce_block(clock.now()).unwrap().unwrap();
    let second = a.produce_block(clock.advance(15_000)).unwrap().unwrap();

    let mut b = node(2);
    let (mut a_to_b, mut b_to_a) = link(&mut a, &mut b);
    // Drop the handshake so b only sees the gossiped block first.
    a_to_b.received();
    b_to_a.received();

    let now = clock.now();
    assert_eq!(b.handle_block(1, second, now), BlockOutcome::ChainRequested);
    assert_eq!(deliver(&mut b_to_a, &mut a, 2, now), 1);
    assert_eq!(deliver(&mut a_to_b, &mut b, 1, now), 1);
    assert_eq!(b.chain().blocks(), a.chain().blocks());
}

#[test]
fn test_pending_reading_confirmed_across_nodes() {
    let mut a = node(1);
    let mut b = node(2);
    a.add_stake(1000, Timestamp::EPOCH).unwrap();
    let (mut a_to_b, mut b_to_a) = link(&mut a, &mut b);
    settle(&mut a, &mut b, &mut a_to_b, &mut b_to_a);

    let reading = SensorReading {
        sensor_id: "hygro-3".into(),
        reading: json!({ "humidity": 41 }),
        metadata: Some(json!({ "unit": "%" })),
    };
    b.submit_reading(reading, MATURE).unwrap();
    deliver(&mut b_to_a, &mut a, 2, MATURE);
    assert_eq!(a.pool().len(), 1);

    let block = a.produce_block(MATURE).unwrap().unwrap();
    assert_eq!(block.transactions.len(), 1);
    deliver(&mut a_to_b, &mut b, 1, MATURE);
    assert!(a.pool().is_empty());
    assert!(b.pool().is_empty());
    assert!(b.chain().contains_transaction(&block.transactions[0].id));
}

#[test]
fn test_restart_reloads_chain_and_key_from_lmdb() {
    let dir = tempfile::tempdir().unwrap();
    let (public_key, tip) = {
        let store = open_chain_store(dir.path()).unwrap();
        let keys = stakenet_node::load_or_create_keypair(store.as_ref()).unwrap();
        let chain = Blockchain::load_or_create(store, ChainParams::standard()).unwrap();
        let mut state = NodeState::new(keys, chain, "ws://localhost:5001");
        state.add_stake(1000, Timestamp::EPOCH).unwrap();
        let block = state.produce_block(MATURE).unwrap().unwrap();
        (state.public_key().clone(), block.hash)
    };

    let store = open_chain_store(dir.path()).unwrap();
    let keys = stakenet_node::load_or_create_keypair(store.as_ref()).unwrap();
    assert_eq!(keys.public, public_key);
    let chain = Blockchain::load_or_create(store, ChainParams::standard()).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.last_block().hash, tip);
    assert!(chain.is_chain_valid(chain.blocks()));

    // Stake lives in memory only and is relearned from peers.
    let state = NodeState::new(keys, chain, "ws://localhost:5001");
    assert!(state.stakes().get_stake(&public_key).is_none());
}

// ── Live nodes over real sockets ────────────────────────────────────────

fn live_config(port: u16, initial_stake: u64) -> NodeConfig {
    NodeConfig {
        p2p_host: "127.0.0.1".into(),
        p2p_port: port,
        listen_host: "127.0.0.1".into(),
        initial_stake,
        stake_sync_interval_secs: 1,
        directory_refresh_interval_secs: 1,
        startup_grace_secs: 0,
        params: ChainParams {
            stake_maturity_ms: 0,
            min_block_interval_ms: 0,
            slot_duration_ms: 200,
            ..ChainParams::standard()
        },
        ..NodeConfig::default()
    }
}

async fn start(
    config: NodeConfig,
    coordinator: Arc<NullCoordinator>,
    listener: TcpListener,
    shutdown: &broadcast::Sender<()>,
) -> (NodeHandle, tokio::task::JoinHandle<()>) {
    let node = StakeNode::new(config, Arc::new(NullStore::new()), coordinator).unwrap();
    let handle = node.handle();
    let task = tokio::spawn({
        let shutdown = shutdown.subscribe();
        async move {
            node.run(listener, shutdown).await.unwrap();
        }
    });
    (handle, task)
}

async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(20), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_live_nodes_converge() {
    let coordinator = Arc::new(NullCoordinator::new());
    let (shutdown, _) = broadcast::channel(1);

    let listener_a = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port_a = listener_a.local_addr().unwrap().port();
    let config_a = live_config(port_a, 1000);
    let address_a = config_a.self_address();
    let (a, task_a) = start(config_a, coordinator.clone(), listener_a, &shutdown).await;

    wait_for(|| {
        let coordinator = coordinator.clone();
        let address_a = address_a.clone();
        async move { coordinator.registrations().contains(&address_a) }
    })
    .await;

    // b bonds nothing, so a is the only producer.
    let listener_b = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port_b = listener_b.local_addr().unwrap().port();
    let (b, task_b) = start(live_config(port_b, 0), coordinator.clone(), listener_b, &shutdown).await;

    wait_for(|| {
        let b = b.clone();
        async move { b.status().await.map(|s| s.chain_length >= 3).unwrap_or(false) }
    })
    .await;

    let chain_a = a.chain().await.unwrap();
    let chain_b = b.chain().await.unwrap();
    for (left, right) in chain_a.iter().zip(&chain_b).take(3) {
        assert_eq!(left.hash, right.hash);
    }

    let status_b = b.status().await.unwrap();
    assert!(status_b.total_stake >= 1000);
    assert!(status_b.stake.is_none());
    assert!(!status_b.peers.is_empty());

    shutdown.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task_a).await.unwrap().unwrap();
    tokio::time::timeout(Duration::from_secs(5), task_b).await.unwrap().unwrap();
}
