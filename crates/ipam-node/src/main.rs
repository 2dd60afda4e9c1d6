//! # IPAM Node
//!
//! Hosts the IPAM service for container networking.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (defaults + `IPAM_*` environment overrides)
//! 3. Lock the data directory and rebuild the subnet registry from disk
//! 4. Serve until Ctrl+C, then release the data directory

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ipam_node::{IpamConfig, IpamNode};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = IpamConfig::from_env();
    let data_dir = config.storage.data_dir.clone();

    let node = IpamNode::start(config)
        .with_context(|| format!("Failed to start IPAM node on {}", data_dir.display()))?;

    // Keep the node running
    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    // Graceful shutdown
    node.shutdown();

    Ok(())
}
