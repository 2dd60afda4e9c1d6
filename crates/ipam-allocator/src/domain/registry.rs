//! # Subnet Registry
//!
//! Concurrent mapping from canonical subnet key to an exclusively owned
//! [`Subnetwork`].
//!
//! ## Concurrency
//!
//! The map itself sits behind a `RwLock`: lookups and enumeration share it,
//! `set`/`remove` take it briefly for writing. Each entry is an
//! `Arc<Mutex<Subnetwork>>`; holding that mutex is what serialises
//! transactions on one key. Transactions on different keys never contend on
//! anything but the short map read.
//!
//! The map lock is never held while waiting on an entry mutex.

use super::subnet::SubnetKey;
use super::subnetwork::Subnetwork;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to one registry entry. Lock it to read or mutate.
pub type SubnetHandle = Arc<Mutex<Subnetwork>>;

/// Registry of managed subnets.
#[derive(Debug, Default)]
pub struct SubnetRegistry {
    entries: RwLock<HashMap<SubnetKey, SubnetHandle>>,
}

impl SubnetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from reconstructed subnetworks. Later duplicates
    /// replace earlier ones.
    pub fn from_subnetworks(subnets: impl IntoIterator<Item = Subnetwork>) -> Self {
        let entries = subnets
            .into_iter()
            .map(|subnet| (*subnet.key(), Arc::new(Mutex::new(subnet))))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn has(&self, key: &SubnetKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn get(&self, key: &SubnetKey) -> Option<SubnetHandle> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or fully replace the entry for `key`. Returns the handle now
    /// registered.
    pub fn set(&self, key: SubnetKey, subnet: Subnetwork) -> SubnetHandle {
        let handle = Arc::new(Mutex::new(subnet));
        self.entries.write().insert(key, Arc::clone(&handle));
        handle
    }

    /// Insert only if `key` is vacant. On conflict the subnet is handed back.
    pub fn insert_if_absent(
        &self,
        key: SubnetKey,
        subnet: Subnetwork,
    ) -> Result<SubnetHandle, Subnetwork> {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(subnet);
        }
        let handle = Arc::new(Mutex::new(subnet));
        entries.insert(key, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn remove(&self, key: &SubnetKey) -> Option<SubnetHandle> {
        self.entries.write().remove(key)
    }

    /// True if `handle` is the entry currently registered under `key`.
    pub fn is_current(&self, key: &SubnetKey, handle: &SubnetHandle) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    /// Snapshot of the registered keys, sorted.
    pub fn keys(&self) -> Vec<SubnetKey> {
        let mut keys: Vec<SubnetKey> = self.entries.read().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Point-in-time copy of every entry, sorted by key.
    ///
    /// Each entry is copied under its own lock, so a copy reflects a
    /// committed state of that subnet.
    pub fn entries(&self) -> Vec<(SubnetKey, Subnetwork)> {
        let mut handles: Vec<(SubnetKey, SubnetHandle)> = self
            .entries
            .read()
            .iter()
            .map(|(key, handle)| (*key, Arc::clone(handle)))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));

        handles
            .into_iter()
            .map(|(key, handle)| {
                let subnet = handle.lock().clone();
                (key, subnet)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
