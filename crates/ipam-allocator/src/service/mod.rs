//! # IPAM Service
//!
//! The application service implementing the IPAM API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `SubnetAdminApi` for subnet lifecycle
//! 2. Implements `AllocationApi` for address reservation and release
//! 3. Runs every mutation as a per-key transaction: lock the registry entry,
//!    mutate in memory, persist, roll back if the write fails. A write that
//!    is already visible on disk but failed to sync is kept, so memory
//!    follows disk either way
//! 4. Owns the registry built at bootstrap; the store is injected

mod allocation;
mod subnets;

use crate::domain::config::StorageConfig;
use crate::domain::errors::{IpamError, IpamResult, StoreError};
use crate::domain::registry::{SubnetHandle, SubnetRegistry};
use crate::domain::subnet::SubnetKey;
use crate::domain::subnetwork::Subnetwork;
use crate::ports::outbound::SubnetStore;
use tracing::{info, warn};

/// The IPAM service.
pub struct IpamService<S: SubnetStore> {
    /// Live subnets, keyed by canonical CIDR.
    pub(crate) registry: SubnetRegistry,
    /// Durable per-subnet records.
    pub(crate) store: S,
    pub(crate) config: StorageConfig,
}

impl<S: SubnetStore> IpamService<S> {
    /// Create a service over an already built registry.
    pub fn new(store: S, registry: SubnetRegistry, config: StorageConfig) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Load every stored subnet and build the service around them.
    pub fn bootstrap(store: S, config: StorageConfig) -> Result<Self, StoreError> {
        let registry = store.load_all()?;

        let reservations: usize = registry
            .entries()
            .iter()
            .map(|(_, subnet)| subnet.reserved_count())
            .sum();
        info!(
            subnets = registry.len(),
            reservations,
            removal_policy = %config.removal_policy,
            "[ipam] Bootstrap complete"
        );

        Ok(Self::new(store, registry, config))
    }

    pub fn registry(&self) -> &SubnetRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub(crate) fn lookup(&self, key: &SubnetKey) -> IpamResult<SubnetHandle> {
        self.registry
            .get(key)
            .ok_or_else(|| IpamError::SubnetNotFound {
                subnet: key.to_string(),
            })
    }

    /// Run `f` as a transaction on `key`: the entry stays locked for the
    /// whole call.
    ///
    /// Fails with `SubnetNotFound` if the entry was removed or replaced
    /// while waiting for its lock.
    pub(crate) fn transact<T>(
        &self,
        key: &SubnetKey,
        f: impl FnOnce(&mut Subnetwork) -> IpamResult<T>,
    ) -> IpamResult<T> {
        let handle = self.lookup(key)?;
        let mut subnet = handle.lock();
        if !self.registry.is_current(key, &handle) {
            return Err(IpamError::SubnetNotFound {
                subnet: key.to_string(),
            });
        }
        f(&mut *subnet)
    }
}

/// Outcome of a store write as seen by a transaction.
///
/// `Unsynced` means the record already changed, so the transaction commits
/// and only a warning remains.
pub(crate) fn committed(key: &SubnetKey, result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(e) if e.is_unsynced() => {
            warn!(subnet = %key, error = %e, "[ipam] Change committed but not synced");
            Ok(())
        }
        other => other,
    }
}
