//! The node state machine.
//!
//! [`NodeState`] owns everything the node mutates: the chain, the stake
//! table, the transaction pool and the live peer set. Each handler runs to
//! completion before the next one starts, so a handler never observes
//! another half-applied. Handlers take the current time as an argument and
//! never block; all outbound traffic is queued on peer channels.

use serde::Serialize;
use stakenet_ledger::{Block, Blockchain, ChainError};
use stakenet_messages::Message;
use stakenet_network::{
    broadcast_except, broadcast_to_all, send_to, Direction, PeerId, PeerSet,
};
use stakenet_stake::{ActiveValidator, StakeInfo, StakeManager, StakeRecord};
use stakenet_transactions::{SensorReading, Transaction, TransactionPool};
use stakenet_types::{BlockHash, KeyPair, PublicKey, Timestamp};
use stakenet_vrf::{compute_vrf_proof, slot_seed, verify_vrf_proof, ValidatorSelector};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::metrics::NodeMetrics;
use crate::tracing_spans::{block_process_span, broadcast_span, network_recv_span, produce_span};
use crate::NodeError;

/// What happened to a block received from a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Validated, appended and re-broadcast.
    Appended,
    /// At or below our tip; nothing to do.
    Known,
    /// Gap, fork or consensus rejection: the sender was asked for its chain.
    ChainRequested,
    /// Failed hash/signature checks or could not be persisted.
    Dropped,
}

/// A point-in-time summary of the node.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub public_key: PublicKey,
    pub address: String,
    pub chain_length: usize,
    pub tip_index: u64,
    pub tip_hash: BlockHash,
    pub peers: Vec<String>,
    pub pending_transactions: usize,
    pub stake: Option<StakeRecord>,
    pub active: bool,
    pub total_stake: u64,
    pub active_validators: Vec<ActiveValidator>,
    pub equivocations: usize,
}

pub struct NodeState {
    keys: KeyPair,
    chain: Blockchain,
    stakes: StakeManager,
    pool: TransactionPool,
    peers: PeerSet,
    selector: ValidatorSelector,
    metrics: NodeMetrics,
}

impl NodeState {
    pub fn new(keys: KeyPair, chain: Blockchain, self_address: impl Into<String>) -> Self {
        let params = chain.params().clone();
        let state = Self {
            keys,
            stakes: StakeManager::new(&params),
            selector: ValidatorSelector::new(&params),
            pool: TransactionPool::new(),
            peers: PeerSet::new(self_address),
            metrics: NodeMetrics::new(),
            chain,
        };
        state.refresh_gauges();
        state
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keys.public
    }

    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    pub fn stakes(&self) -> &StakeManager {
        &self.stakes
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    // ── Connections ─────────────────────────────────────────────────────

    /// Register a new connection and run the handshake: our chain, our stake
    /// table, then a request for theirs.
    pub fn on_connected(
        &mut self,
        peer_id: PeerId,
        address: String,
        direction: Direction,
        outbound: mpsc::Sender<String>,
    ) {
        self.peers.insert(peer_id, address.clone(), direction, outbound);
        info!(peer_id, %address, ?direction, peers = self.peers.len(), "peer connected");

        let handshake =
            stakenet_protocol::handshake_messages(self.chain.blocks(), self.stakes.records());
        for message in &handshake {
            self.send(peer_id, message);
        }
        self.refresh_gauges();
    }

    pub fn on_disconnected(&mut self, peer_id: PeerId) {
        if let Some(handle) = self.peers.remove(peer_id) {
            info!(peer_id, address = %handle.address, peers = self.peers.len(), "peer disconnected");
        }
        self.refresh_gauges();
    }

    pub fn on_dial_failed(&mut self, address: &str) {
        if self.peers.dial_failed(address) {
            debug!(%address, "dropped unreachable address");
        }
    }

    /// Filter a directory listing down to addresses worth dialing and mark
    /// them as in flight.
    pub fn claim_dial_targets(&mut self, addresses: impl IntoIterator<Item = String>) -> Vec<String> {
        addresses
            .into_iter()
            .filter(|address| self.peers.begin_dial(address))
            .collect()
    }

    // ── Wire protocol ───────────────────────────────────────────────────

    pub fn handle_message(&mut self, peer_id: PeerId, message: Message, now: Timestamp) {
        let _span = network_recv_span(peer_id, message.kind()).entered();
        match message {
            Message::Chain { chain } => self.handle_chain(chain),
            Message::RequestChain => {
                let reply = Message::Chain {
                    chain: self.chain.blocks().to_vec(),
                };
                self.send(peer_id, &reply);
            }
            Message::Transaction { transaction } => self.handle_transaction(transaction),
            Message::Block { block } => {
                self.handle_block(peer_id, block, now);
            }
            Message::Stake { stake_info } => {
                let StakeInfo { public_key, record } = stake_info;
                let amount = record.amount;
                if self.stakes.merge_record(&public_key, record) {
                    debug!(validator = %public_key.short(), amount, "stake record merged");
                }
            }
            Message::StakeSync { stakes } => {
                let received = stakes.len();
                let applied = self.stakes.merge_all(stakes);
                debug!(
                    received,
                    applied,
                    total = self.stakes.get_total_stake(),
                    "stake table synced"
                );
            }
        }
        self.refresh_gauges();
    }

    fn handle_chain(&mut self, chain: Vec<Block>) {
        match self.chain.replace_chain(chain) {
            Ok(true) => {
                self.metrics.chain_replacements.inc();
                let pruned = self
                    .pool
                    .remove_confirmed(self.chain.blocks().iter().flat_map(|b| b.transactions.iter()));
                if pruned > 0 {
                    debug!(pruned, "removed transactions confirmed by adopted chain");
                }
            }
            Ok(false) => {}
            Err(e) => error!(error = %e, "failed to adopt longer chain"),
        }
    }

    fn handle_transaction(&mut self, transaction: Transaction) {
        self.metrics.transactions_received.inc();
        let id = transaction.id.clone();
        let replaced = self.pool.update_or_add(transaction);
        debug!(%id, replaced, pending = self.pool.len(), "transaction pooled");
    }

    /// Apply a block gossiped by `peer_id`.
    pub fn handle_block(&mut self, peer_id: PeerId, block: Block, now: Timestamp) -> BlockOutcome {
        let _span = block_process_span(block.index, &block.hash.to_string()).entered();
        let (tip_index, tip_hash) = {
            let tip = self.chain.last_block();
            (tip.index, tip.hash)
        };

        if block.index <= tip_index {
            debug!(index = block.index, tip = tip_index, "already have a block at this height");
            self.chain.observe(&block, now);
            return BlockOutcome::Known;
        }
        if block.index > tip_index + 1 {
            info!(index = block.index, tip = tip_index, "block is ahead of our tip, requesting chain");
            self.send(peer_id, &Message::RequestChain);
            return BlockOutcome::ChainRequested;
        }
        if block.previous_hash != tip_hash {
            info!(index = block.index, "block does not extend our tip, requesting chain");
            self.send(peer_id, &Message::RequestChain);
            return BlockOutcome::ChainRequested;
        }

        self.audit_vrf_proof(&block);

        match self.chain.add_block_to_chain(block.clone(), &mut self.stakes) {
            Ok(()) => {
                self.metrics.blocks_accepted.inc();
                let pruned = self.pool.remove_confirmed(&block.transactions);
                debug!(pruned, "pruned confirmed transactions");
                self.broadcast(&Message::Block { block }, Some(peer_id));
                BlockOutcome::Appended
            }
            Err(ChainError::Rejected(e)) if e.is_consensus_rejection() => {
                self.metrics.blocks_rejected.inc();
                warn!(error = %e, "block rejected, requesting chain");
                self.send(peer_id, &Message::RequestChain);
                BlockOutcome::ChainRequested
            }
            Err(ChainError::Rejected(e)) => {
                self.metrics.blocks_rejected.inc();
                warn!(error = %e, "block failed integrity checks, dropped");
                BlockOutcome::Dropped
            }
            Err(e @ ChainError::Persistence(_)) => {
                error!(error = %e, "failed to persist block");
                BlockOutcome::Dropped
            }
        }
    }

    fn audit_vrf_proof(&self, block: &Block) {
        let Some(proof) = &block.vrf_proof else {
            return;
        };
        let seed = slot_seed(&block.previous_hash, self.selector.slot_at(block.timestamp));
        if !verify_vrf_proof(proof, &block.proposer, &seed) {
            warn!(
                index = block.index,
                proposer = %block.proposer.short(),
                "block carries a VRF proof that does not verify"
            );
        }
    }

    // ── Local operations ────────────────────────────────────────────────

    /// Produce a block if this node leads the slot containing `now`.
    pub fn produce_block(&mut self, now: Timestamp) -> Result<Option<Block>, NodeError> {
        let slot = self.selector.slot_at(now);
        let _span = produce_span(slot).entered();
        let previous_hash = self.chain.last_block().hash;
        let me = self.keys.public.clone();

        if self
            .selector
            .select_validator(&mut self.stakes, now, &previous_hash, &me)
            .is_none()
        {
            return Ok(None);
        }

        let stake = self.stakes.get_stake(&me).map_or(0, |r| r.amount);
        let transactions = self.pool.valid_transactions();
        let proof = compute_vrf_proof(&slot_seed(&previous_hash, slot), &self.keys);
        let block = Block::create(self.chain.last_block(), now, transactions, stake, &self.keys)?
            .with_vrf_proof(proof);

        self.chain.add_block_to_chain(block.clone(), &mut self.stakes)?;
        self.metrics.blocks_produced.inc();
        self.pool.remove_confirmed(&block.transactions);
        self.broadcast(&Message::Block { block: block.clone() }, None);

        let reward = self.stakes.claim_reward(&me, now);
        info!(
            index = block.index,
            txs = block.transactions.len(),
            reward,
            "produced block"
        );
        self.refresh_gauges();
        Ok(Some(block))
    }

    /// Bond `amount` for this node and announce it.
    pub fn add_stake(&mut self, amount: u64, now: Timestamp) -> Result<StakeRecord, NodeError> {
        let me = self.keys.public.clone();
        let record = self.stakes.add_stake(&me, amount, now)?;
        info!(amount, bonded = record.amount, "stake added");
        self.broadcast(
            &Message::Stake {
                stake_info: StakeInfo::new(me, record.clone()),
            },
            None,
        );
        self.refresh_gauges();
        Ok(record)
    }

    /// Bond `amount` unless this node already has a stake record, local or
    /// learned from peers.
    pub fn ensure_initial_stake(
        &mut self,
        amount: u64,
        now: Timestamp,
    ) -> Result<Option<StakeRecord>, NodeError> {
        if self.stakes.get_stake(&self.keys.public).is_some() {
            debug!("stake record already present, skipping initial stake");
            return Ok(None);
        }
        self.add_stake(amount, now).map(Some)
    }

    /// Sign a sensor reading, pool it and gossip it.
    pub fn submit_reading(
        &mut self,
        reading: SensorReading,
        now: Timestamp,
    ) -> Result<Transaction, NodeError> {
        let transaction = Transaction::from_sensor_reading(&self.keys, reading, now)?;
        transaction.validate()?;
        self.handle_transaction(transaction.clone());
        self.broadcast(
            &Message::Transaction {
                transaction: transaction.clone(),
            },
            None,
        );
        self.refresh_gauges();
        Ok(transaction)
    }

    /// Send the full stake table to every peer.
    pub fn broadcast_stake_sync(&self) {
        if self.peers.is_empty() {
            return;
        }
        self.broadcast(
            &Message::StakeSync {
                stakes: self.stakes.records(),
            },
            None,
        );
    }

    pub fn status(&mut self, now: Timestamp) -> NodeStatus {
        let me = self.keys.public.clone();
        let active = self.stakes.is_active_validator(&me, now);
        let active_validators = self.stakes.get_active_validators(now);
        let tip = self.chain.last_block();
        NodeStatus {
            address: self.peers.self_address().to_string(),
            chain_length: self.chain.len(),
            tip_index: tip.index,
            tip_hash: tip.hash,
            peers: self.peers.addresses(),
            pending_transactions: self.pool.len(),
            stake: self.stakes.get_stake(&me).cloned(),
            active,
            total_stake: self.stakes.get_total_stake(),
            active_validators,
            equivocations: self.chain.equivocations().len(),
            public_key: me,
        }
    }

    pub fn render_metrics(&self) -> String {
        self.metrics.render()
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn send(&self, peer_id: PeerId, message: &Message) {
        match send_to(&self.peers, peer_id, message) {
            Ok(true) => {}
            Ok(false) => {
                debug!(peer_id, msg_type = message.kind(), "peer queue full or closed, dropped")
            }
            Err(e) => warn!(peer_id, error = %e, "failed to encode message"),
        }
    }

    fn broadcast(&self, message: &Message, except: Option<PeerId>) {
        let _span = broadcast_span(message.kind(), self.peers.len()).entered();
        let result = match except {
            Some(sender) => broadcast_except(&self.peers, message, sender),
            None => broadcast_to_all(&self.peers, message),
        };
        match result {
            Ok(r) if r.failed > 0 => warn!(sent = r.sent, failed = r.failed, "broadcast partially failed"),
            Ok(r) => debug!(sent = r.sent, "broadcast queued"),
            Err(e) => warn!(error = %e, "failed to encode broadcast"),
        }
    }

    fn refresh_gauges(&self) {
        self.metrics.chain_length.set(self.chain.len() as i64);
        self.metrics.peer_count.set(self.peers.len() as i64);
        self.metrics.pending_transactions.set(self.pool.len() as i64);
        self.metrics
            .total_stake
            .set(i64::try_from(self.stakes.get_total_stake()).unwrap_or(i64::MAX));
    }
}
