//! ctgossip daemon — entry point for running a gossiper node.

use std::path::PathBuf;

use clap::Parser;

use ctgossip_node::{GossipNode, GossiperConfig, LogFormat};

#[derive(Parser)]
#[command(name = "ctgossip-daemon", about = "Threshold-signature gossiper daemon")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CTGOSSIP_CONFIG")]
    config: PathBuf,

    /// Override the listen port from the config file.
    #[arg(long, env = "CTGOSSIP_PORT")]
    port: Option<u16>,

    /// Override the log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CTGOSSIP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Override the snapshot file path.
    #[arg(long, env = "CTGOSSIP_SNAPSHOT_PATH")]
    snapshot_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = GossiperConfig::from_toml_file(&cli.config)?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(path) = cli.snapshot_path {
        config.snapshot_path = Some(path);
    }

    ctgossip_node::init_logging(LogFormat::from_config(&config.log_format), &config.log_level);
    tracing::info!(
        self_url = %config.self_url,
        port = config.port,
        peers = config.peers.len(),
        threshold = config.threshold,
        total = config.total,
        "starting gossiper"
    );

    let node = GossipNode::new(config)?;
    node.run().await?;

    tracing::info!("gossiper exited cleanly");
    Ok(())
}
