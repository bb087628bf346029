//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use stakenet_types::ChainParams;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a stakenet node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Host other nodes use to reach us; part of our advertised address.
    #[serde(default = "default_p2p_host")]
    pub p2p_host: String,

    /// Port to listen on for P2P connections.
    #[serde(default = "default_p2p_port")]
    pub p2p_port: u16,

    /// Interface the P2P listener binds to.
    #[serde(default = "default_listen_host")]
    pub listen_host: String,

    /// Base URL of the bootstrap directory / block-time service.
    #[serde(default = "default_bootstrap_address")]
    pub bootstrap_address: String,

    /// Data directory for chain and key storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Stake bonded at startup when this node has no stake record.
    #[serde(default = "default_initial_stake")]
    pub initial_stake: u64,

    /// Seconds between full stake-table broadcasts.
    #[serde(default = "default_stake_sync_interval")]
    pub stake_sync_interval_secs: u64,

    /// Seconds between peer list refreshes from the directory.
    #[serde(default = "default_directory_refresh_interval")]
    pub directory_refresh_interval_secs: u64,

    /// Seconds to let initial connections settle before staking and
    /// starting block production.
    #[serde(default = "default_startup_grace")]
    pub startup_grace_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of each peer's outbound frame queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// Consensus parameters. Must match every other node on the network.
    #[serde(default)]
    pub params: ChainParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_p2p_host() -> String {
    "localhost".to_string()
}

fn default_p2p_port() -> u16 {
    5001
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bootstrap_address() -> String {
    "http://127.0.0.1:4000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./chaindata")
}

fn default_initial_stake() -> u64 {
    1000
}

fn default_stake_sync_interval() -> u64 {
    30
}

fn default_directory_refresh_interval() -> u64 {
    60
}

fn default_startup_grace() -> u64 {
    3
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_outbound_queue() -> usize {
    256
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The address we register with the directory and skip when dialing.
    pub fn self_address(&self) -> String {
        format!("ws://{}:{}", self.p2p_host, self.p2p_port)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.p2p_port)
    }

    pub fn log_format(&self) -> LogFormat {
        match self.log_format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Human,
        }
    }

    pub fn stake_sync_interval(&self) -> Duration {
        Duration::from_secs(self.stake_sync_interval_secs.max(1))
    }

    pub fn directory_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.directory_refresh_interval_secs.max(1))
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            p2p_host: default_p2p_host(),
            p2p_port: default_p2p_port(),
            listen_host: default_listen_host(),
            bootstrap_address: default_bootstrap_address(),
            data_dir: default_data_dir(),
            initial_stake: default_initial_stake(),
            stake_sync_interval_secs: default_stake_sync_interval(),
            directory_refresh_interval_secs: default_directory_refresh_interval(),
            startup_grace_secs: default_startup_grace(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            outbound_queue: default_outbound_queue(),
            params: ChainParams::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.p2p_port, config.p2p_port);
        assert_eq!(parsed.params, config.params);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.p2p_port, 5001);
        assert_eq!(config.initial_stake, 1000);
        assert_eq!(config.log_format(), LogFormat::Human);
        assert_eq!(config.self_address(), "ws://localhost:5001");
        assert_eq!(config.params.stake_maturity_ms, 60_000);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            p2p_port = 5002
            log_format = "json"

            [params]
            slot_duration_ms = 5000
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.p2p_port, 5002);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.params.slot_duration_ms, 5000);
        assert_eq!(config.params.minimum_stake, 1000); // default
        assert_eq!(config.listen_address(), "0.0.0.0:5002");
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/stakenet.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
