//! # Node Configuration
//!
//! Runtime configuration for the IPAM node.
//!
//! ## Environment Overrides
//!
//! | Variable | Field | Values |
//! |----------|-------|--------|
//! | `IPAM_DATA_PATH` | `storage.data_dir` | directory path |
//! | `IPAM_REMOVAL_POLICY` | `storage.removal_policy` | `archive`, `delete` |
//! | `IPAM_SYNC_APPENDS` | `storage.sync_appends` | `true`/`false`/`1`/`0` |
//! | `IPAM_LOCK_TIMEOUT_SECS` | `lock_timeout` | seconds |
//!
//! Invalid values are logged and ignored.

use ipam_allocator::adapters::lock::DEFAULT_LOCK_TIMEOUT;
use ipam_allocator::{RemovalPolicy, StorageConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const ENV_DATA_PATH: &str = "IPAM_DATA_PATH";
pub const ENV_REMOVAL_POLICY: &str = "IPAM_REMOVAL_POLICY";
pub const ENV_SYNC_APPENDS: &str = "IPAM_SYNC_APPENDS";
pub const ENV_LOCK_TIMEOUT: &str = "IPAM_LOCK_TIMEOUT_SECS";

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct IpamConfig {
    /// Subnet store configuration.
    pub storage: StorageConfig,
    /// How long to wait for another process to release the data directory.
    pub lock_timeout: Duration,
}

impl Default for IpamConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl IpamConfig {
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_DATA_PATH) {
            if path.trim().is_empty() {
                warn!("{} is empty, keeping {:?}", ENV_DATA_PATH, self.storage.data_dir);
            } else {
                self.storage.data_dir = PathBuf::from(path);
                info!("Data directory from environment: {:?}", self.storage.data_dir);
            }
        }

        if let Some(value) = lookup(ENV_REMOVAL_POLICY) {
            match value.parse::<RemovalPolicy>() {
                Ok(policy) => self.storage.removal_policy = policy,
                Err(e) => warn!("Ignoring {}: {}", ENV_REMOVAL_POLICY, e),
            }
        }

        if let Some(value) = lookup(ENV_SYNC_APPENDS) {
            match parse_bool(&value) {
                Some(sync) => self.storage.sync_appends = sync,
                None => warn!("Ignoring {}: expected true/false, got {:?}", ENV_SYNC_APPENDS, value),
            }
        }

        if let Some(value) = lookup(ENV_LOCK_TIMEOUT) {
            match value.trim().parse::<u64>() {
                Ok(secs) => self.lock_timeout = Duration::from_secs(secs),
                Err(_) => warn!("Ignoring {}: expected seconds, got {:?}", ENV_LOCK_TIMEOUT, value),
            }
        }

        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
