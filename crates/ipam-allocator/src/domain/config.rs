//! # Value Objects
//!
//! Configuration for the persistent subnet store.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default storage root, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// What happens to a subnet's file when the subnet is removed.
///
/// A file left in place under its canonical name would be loaded again on
/// the next start, so neither policy leaves it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Rename to `<file>.removed`. Kept for audit, ignored at bootstrap.
    #[default]
    Archive,
    /// Unlink the file.
    Delete,
}

impl fmt::Display for RemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalPolicy::Archive => write!(f, "archive"),
            RemovalPolicy::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for RemovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" => Ok(RemovalPolicy::Archive),
            "delete" => Ok(RemovalPolicy::Delete),
            other => Err(format!("unknown removal policy {:?}", other)),
        }
    }
}

/// Configuration for the storage engine.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one file per subnet (default: `./data`).
    pub data_dir: PathBuf,

    /// Fate of the backing file on subnet removal (default: archive).
    pub removal_policy: RemovalPolicy,

    /// fsync after every fast-path append (default: true).
    ///
    /// Disabling trades the durability of the last few reservations on power
    /// loss for allocation throughput.
    pub sync_appends: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            removal_policy: RemovalPolicy::default(),
            sync_appends: true,
        }
    }
}

impl StorageConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage root.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the removal policy.
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    /// Enable or disable fsync on appends.
    pub fn with_sync_appends(mut self, sync: bool) -> Self {
        self.sync_appends = sync;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.removal_policy, RemovalPolicy::Archive);
        assert!(config.sync_appends);
    }

    #[test]
    fn test_removal_policy_parse() {
        assert_eq!("Delete".parse::<RemovalPolicy>(), Ok(RemovalPolicy::Delete));
        assert_eq!(" archive".parse::<RemovalPolicy>(), Ok(RemovalPolicy::Archive));
        assert!("shred".parse::<RemovalPolicy>().is_err());
    }
}
