//! stakenet daemon: entry point for running a stakenet node.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use stakenet_network::{BootstrapClient, Transport};
use stakenet_node::{init_logging, open_chain_store, NodeConfig, ShutdownController, StakeNode};

#[derive(Parser)]
#[command(name = "stakenet-daemon", about = "stakenet proof-of-stake node daemon")]
struct Cli {
    /// Hostname peers use to reach this node.
    #[arg(long, env = "P2P_HOST")]
    host: Option<String>,

    /// Port for P2P connections.
    #[arg(long, env = "P2P_PORT")]
    port: Option<u16>,

    /// Base URL of the bootstrap directory and time coordinator.
    #[arg(long, env = "BOOTSTRAP_ADDRESS")]
    bootstrap_address: Option<String>,

    /// Directory holding the chain database.
    #[arg(long, env = "DB_PATH")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKENET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKENET_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Print the effective configuration as TOML.
    #[command(name = "config")]
    Config,
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

impl Cli {
    /// Overlay flags and environment variables on `base`.
    fn apply(&self, mut config: NodeConfig) -> NodeConfig {
        if let Some(host) = &self.host {
            config.p2p_host = host.clone();
        }
        if let Some(port) = self.port {
            config.p2p_port = port;
        }
        if let Some(address) = &self.bootstrap_address {
            config.bootstrap_address = address.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)?,
        None => NodeConfig::default(),
    };
    let config = cli.apply(base);

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Node {
            action: NodeAction::Run,
        } => run(config).await,
    }
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    if let Err(e) = init_logging(config.log_format(), &config.log_level) {
        eprintln!("logging already initialised: {e}");
    }

    tracing::info!(
        address = %config.self_address(),
        bootstrap = %config.bootstrap_address,
        data_dir = %config.data_dir.display(),
        "starting stakenet node"
    );

    let store = open_chain_store(&config.data_dir)?;
    let coordinator = Arc::new(BootstrapClient::new(&config.bootstrap_address));
    let listener = Transport::bind(config.listen_address()).await?;

    let node = StakeNode::new(config, store, coordinator)?;
    let shutdown = ShutdownController::new();
    let node_shutdown = shutdown.subscribe();
    tokio::spawn(async move { shutdown.wait_for_signal().await });

    node.run(listener, node_shutdown).await?;
    tracing::info!("stakenet daemon exited cleanly");
    Ok(())
}
