//! The running node.
//!
//! A single task owns the [`NodeState`] and serialises everything that
//! touches it: connection events from the transport, commands from
//! [`NodeHandle`]s (including the block scheduler), and the stake-sync and
//! directory-refresh timers. Directory lookups and dials run in their own
//! tasks and report back through the same channels.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use stakenet_ledger::{Block, Blockchain};
use stakenet_network::{ConnectionEvent, PeerDirectory, TimeCoordinator, Transport};
use stakenet_stake::StakeRecord;
use stakenet_store::ChainStore;
use stakenet_store_lmdb::environment::DEFAULT_MAP_SIZE;
use stakenet_store_lmdb::LmdbEnvironment;
use stakenet_transactions::{SensorReading, Transaction};
use stakenet_types::{PublicKey, Timestamp};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::keys::load_or_create_keypair;
use crate::scheduler::BlockScheduler;
use crate::state::{NodeState, NodeStatus};
use crate::NodeError;

/// Channel capacity for transport events.
const EVENT_CHANNEL_CAPACITY: usize = 1024;
/// Channel capacity for local commands.
const COMMAND_CHANNEL_CAPACITY: usize = 256;

type Reply<T> = oneshot::Sender<T>;

/// Requests served by the node task.
#[derive(Debug)]
pub enum NodeCommand {
    ProduceBlock {
        reply: Reply<Result<Option<Block>, NodeError>>,
    },
    SubmitReading {
        reading: SensorReading,
        reply: Reply<Result<Transaction, NodeError>>,
    },
    AddStake {
        amount: u64,
        reply: Reply<Result<StakeRecord, NodeError>>,
    },
    Status {
        reply: Reply<NodeStatus>,
    },
    GetChain {
        reply: Reply<Vec<Block>>,
    },
    GetPending {
        reply: Reply<Vec<Transaction>>,
    },
    RenderMetrics {
        reply: Reply<String>,
    },
    /// A directory listing fetched in the background.
    PeersDiscovered { addresses: Vec<String> },
}

/// Cloneable entry point to a running node.
#[derive(Clone, Debug)]
pub struct NodeHandle {
    commands: mpsc::Sender<NodeCommand>,
}

impl NodeHandle {
    pub(crate) fn new(commands: mpsc::Sender<NodeCommand>) -> Self {
        Self { commands }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> NodeCommand,
    ) -> Result<T, NodeError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| NodeError::Stopped)?;
        response.await.map_err(|_| NodeError::Stopped)
    }

    /// Attempt production for the current slot.
    pub async fn produce_block(&self) -> Result<Option<Block>, NodeError> {
        self.request(|reply| NodeCommand::ProduceBlock { reply }).await?
    }

    pub async fn submit_reading(&self, reading: SensorReading) -> Result<Transaction, NodeError> {
        self.request(|reply| NodeCommand::SubmitReading { reading, reply })
            .await?
    }

    pub async fn add_stake(&self, amount: u64) -> Result<StakeRecord, NodeError> {
        self.request(|reply| NodeCommand::AddStake { amount, reply })
            .await?
    }

    pub async fn status(&self) -> Result<NodeStatus, NodeError> {
        self.request(|reply| NodeCommand::Status { reply }).await
    }

    pub async fn chain(&self) -> Result<Vec<Block>, NodeError> {
        self.request(|reply| NodeCommand::GetChain { reply }).await
    }

    pub async fn pending_transactions(&self) -> Result<Vec<Transaction>, NodeError> {
        self.request(|reply| NodeCommand::GetPending { reply }).await
    }

    pub async fn render_metrics(&self) -> Result<String, NodeError> {
        self.request(|reply| NodeCommand::RenderMetrics { reply }).await
    }
}

/// A stakenet node wired to its transport and coordinator.
pub struct StakeNode<C> {
    config: NodeConfig,
    coordinator: Arc<C>,
    state: NodeState,
    transport: Transport,
    events: mpsc::Receiver<ConnectionEvent>,
    commands: mpsc::Receiver<NodeCommand>,
    handle: NodeHandle,
}

impl<C> StakeNode<C>
where
    C: PeerDirectory + TimeCoordinator + 'static,
{
    /// Load (or create) the node key and chain from `store`.
    pub fn new(
        config: NodeConfig,
        store: Arc<dyn ChainStore + Send + Sync>,
        coordinator: Arc<C>,
    ) -> Result<Self, NodeError> {
        let keys = load_or_create_keypair(store.as_ref())?;
        let chain = Blockchain::load_or_create(store, config.params.clone())?;
        let state = NodeState::new(keys, chain, config.self_address());

        let (events_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (commands_tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        Ok(Self {
            transport: Transport::new(events_tx, config.outbound_queue),
            handle: NodeHandle::new(commands_tx),
            config,
            coordinator,
            state,
            events,
            commands,
        })
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle.clone()
    }

    pub fn public_key(&self) -> &PublicKey {
        self.state.public_key()
    }

    /// Serve `listener` and run until `shutdown` fires.
    ///
    /// Startup registers with the directory and dials the listed peers.
    /// After the configured grace period the node bonds its initial stake
    /// (unless peers already told us about one) and block production
    /// starts.
    pub async fn run(
        mut self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), NodeError> {
        info!(
            address = %self.config.self_address(),
            public_key = %self.state.public_key().short(),
            chain_length = self.state.chain().len(),
            "stakenet node starting"
        );

        let listener_task = self.transport.spawn_listener(listener);
        self.spawn_discovery(true);

        let grace = tokio::time::sleep(self.config.startup_grace());
        tokio::pin!(grace);
        let mut producing = false;
        let mut scheduler_task = None;
        let mut stake_sync = interval_after(self.config.stake_sync_interval());
        let mut refresh = interval_after(self.config.directory_refresh_interval());

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("node shutting down");
                    break;
                }
                Some(event) = self.events.recv() => self.on_event(event),
                Some(command) = self.commands.recv() => self.on_command(command),
                _ = &mut grace, if !producing => {
                    producing = true;
                    if let Err(e) = self
                        .state
                        .ensure_initial_stake(self.config.initial_stake, Timestamp::now())
                    {
                        warn!(error = %e, "failed to bond initial stake");
                    }
                    let scheduler = BlockScheduler::new(
                        self.coordinator.clone(),
                        self.handle.clone(),
                        &self.config.params,
                    );
                    scheduler_task = Some(scheduler.spawn(shutdown.resubscribe()));
                    info!("block production started");
                }
                _ = stake_sync.tick() => self.state.broadcast_stake_sync(),
                _ = refresh.tick() => self.spawn_discovery(false),
            }
        }

        listener_task.abort();
        if let Some(task) = scheduler_task {
            task.abort();
        }
        Ok(())
    }

    fn on_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected {
                peer_id,
                address,
                direction,
                outbound,
            } => self.state.on_connected(peer_id, address, direction, outbound),
            ConnectionEvent::Message { peer_id, message } => {
                self.state.handle_message(peer_id, message, Timestamp::now())
            }
            ConnectionEvent::Disconnected { peer_id } => self.state.on_disconnected(peer_id),
            ConnectionEvent::DialFailed { address } => self.state.on_dial_failed(&address),
        }
    }

    fn on_command(&mut self, command: NodeCommand) {
        let now = Timestamp::now();
        // A dropped reply means the caller gave up; nothing to do.
        match command {
            NodeCommand::ProduceBlock { reply } => {
                let _ = reply.send(self.state.produce_block(now));
            }
            NodeCommand::SubmitReading { reading, reply } => {
                let _ = reply.send(self.state.submit_reading(reading, now));
            }
            NodeCommand::AddStake { amount, reply } => {
                let _ = reply.send(self.state.add_stake(amount, now));
            }
            NodeCommand::Status { reply } => {
                let _ = reply.send(self.state.status(now));
            }
            NodeCommand::GetChain { reply } => {
                let _ = reply.send(self.state.chain().blocks().to_vec());
            }
            NodeCommand::GetPending { reply } => {
                let _ = reply.send(self.state.pool().transactions().to_vec());
            }
            NodeCommand::RenderMetrics { reply } => {
                let _ = reply.send(self.state.render_metrics());
            }
            NodeCommand::PeersDiscovered { addresses } => {
                let targets = self.state.claim_dial_targets(addresses);
                if !targets.is_empty() {
                    debug!(count = targets.len(), "dialing discovered peers");
                }
                for address in targets {
                    self.transport.spawn_dial(address);
                }
            }
        }
    }

    /// Fetch the directory listing in the background, registering first
    /// when `register` is set.
    fn spawn_discovery(&self, register: bool) {
        let coordinator = self.coordinator.clone();
        let commands = self.handle.commands.clone();
        let self_address = self.config.self_address();
        tokio::spawn(async move {
            if register {
                match coordinator.register(&self_address).await {
                    Ok(()) => info!(address = %self_address, "registered with directory"),
                    Err(e) => warn!(error = %e, "failed to register with directory"),
                }
            }
            match coordinator.peers().await {
                Ok(addresses) => {
                    let _ = commands
                        .send(NodeCommand::PeersDiscovered { addresses })
                        .await;
                }
                Err(e) => warn!(error = %e, "failed to fetch peer list"),
            }
        });
    }
}

/// Open (creating if needed) the LMDB chain store under `data_dir`.
pub fn open_chain_store(data_dir: &Path) -> Result<Arc<dyn ChainStore + Send + Sync>, NodeError> {
    let env = LmdbEnvironment::open(data_dir, DEFAULT_MAP_SIZE)?;
    Ok(Arc::new(env.chain_store()))
}

fn interval_after(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
