//! # IPAM Node Library
//!
//! Composition root for the IPAM service. The main entry point is the
//! `main.rs` binary; request collaborators embed [`IpamNode`] and call the
//! service it exposes.
//!
//! ## Startup Sequence
//!
//! 1. Create the data directory
//! 2. Lock it against other processes
//! 3. Rebuild the subnet registry from disk
//! 4. Hand out the service until shutdown

pub mod container;

use std::sync::Arc;

use ipam_allocator::{DataDirLock, FileSubnetStore, IpamService, LockError, StoreError};
use thiserror::Error;
use tracing::info;

pub use crate::container::IpamConfig;

/// Errors raised while starting the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The data directory could not be created or read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Another process owns the data directory.
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// A running IPAM node.
pub struct IpamNode {
    service: Arc<IpamService<FileSubnetStore>>,
    config: IpamConfig,
    /// Held for the node's lifetime.
    lock: DataDirLock,
}

impl IpamNode {
    /// Start the node: lock the data directory and bootstrap the service
    /// from the subnets stored there.
    pub fn start(config: IpamConfig) -> Result<Self, NodeError> {
        info!("===========================================");
        info!("  IPAM Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let store = FileSubnetStore::open(&config.storage)?;
        let lock = DataDirLock::acquire_with_timeout(store.data_dir(), config.lock_timeout)?;
        let service = IpamService::bootstrap(store, config.storage.clone())?;

        info!("Data Dir: {:?}", config.storage.data_dir);
        info!("Removal Policy: {}", config.storage.removal_policy);
        info!("Subnets: {}", service.registry().len());

        Ok(Self {
            service: Arc::new(service),
            config,
            lock,
        })
    }

    /// The service, for request collaborators.
    pub fn service(&self) -> Arc<IpamService<FileSubnetStore>> {
        Arc::clone(&self.service)
    }

    pub fn config(&self) -> &IpamConfig {
        &self.config
    }

    /// Stop the node and release the data directory.
    ///
    /// Every committed transaction is already on disk; in-flight requests
    /// keep their own `Arc` of the service.
    pub fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        let subnets = self.service.registry().len();
        drop(self.lock);
        info!(subnets, "Shutdown complete");
    }
}
