//! Prometheus metrics for the stakenet node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::render`]
//! encodes it in the Prometheus text exposition format for whatever surface
//! serves it.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks this node produced as slot leader.
    pub blocks_produced: IntCounter,
    /// Gossiped blocks appended to the local chain.
    pub blocks_accepted: IntCounter,
    /// Gossiped blocks that failed validation.
    pub blocks_rejected: IntCounter,
    /// Transactions received from peers or submitted locally.
    pub transactions_received: IntCounter,
    /// Times a longer peer chain replaced the local one.
    pub chain_replacements: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub chain_length: IntGauge,
    pub peer_count: IntGauge,
    pub pending_transactions: IntGauge,
    pub total_stake: IntGauge,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let blocks_produced = register_int_counter_with_registry!(
            Opts::new("stakenet_blocks_produced_total", "Blocks produced by this node"),
            registry
        )
        .expect("failed to register blocks_produced counter");

        let blocks_accepted = register_int_counter_with_registry!(
            Opts::new(
                "stakenet_blocks_accepted_total",
                "Gossiped blocks appended to the local chain"
            ),
            registry
        )
        .expect("failed to register blocks_accepted counter");

        let blocks_rejected = register_int_counter_with_registry!(
            Opts::new(
                "stakenet_blocks_rejected_total",
                "Gossiped blocks that failed validation"
            ),
            registry
        )
        .expect("failed to register blocks_rejected counter");

        let transactions_received = register_int_counter_with_registry!(
            Opts::new(
                "stakenet_transactions_received_total",
                "Transactions received or submitted"
            ),
            registry
        )
        .expect("failed to register transactions_received counter");

        let chain_replacements = register_int_counter_with_registry!(
            Opts::new(
                "stakenet_chain_replacements_total",
                "Local chain replaced by a longer peer chain"
            ),
            registry
        )
        .expect("failed to register chain_replacements counter");

        let chain_length = register_int_gauge_with_registry!(
            Opts::new("stakenet_chain_length", "Blocks in the local chain"),
            registry
        )
        .expect("failed to register chain_length gauge");

        let peer_count = register_int_gauge_with_registry!(
            Opts::new("stakenet_peer_count", "Current number of connected peers"),
            registry
        )
        .expect("failed to register peer_count gauge");

        let pending_transactions = register_int_gauge_with_registry!(
            Opts::new("stakenet_pending_transactions", "Transactions in the pool"),
            registry
        )
        .expect("failed to register pending_transactions gauge");

        let total_stake = register_int_gauge_with_registry!(
            Opts::new("stakenet_total_stake", "Sum of all bonded stake"),
            registry
        )
        .expect("failed to register total_stake gauge");

        Self {
            registry,
            blocks_produced,
            blocks_accepted,
            blocks_rejected,
            transactions_received,
            chain_replacements,
            chain_length,
            peer_count,
            pending_transactions,
            total_stake,
        }
    }

    /// Encode every metric in the Prometheus text format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
