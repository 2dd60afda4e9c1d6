//! # Outbound Ports (Driven Ports)
//!
//! Persistence required by the IPAM service.
//!
//! Production: `FileSubnetStore` (one text file per subnet)
//! Testing: `InMemorySubnetStore` (same record format, failure injection)

use crate::domain::config::RemovalPolicy;
use crate::domain::errors::StoreError;
use crate::domain::registry::SubnetRegistry;
use crate::domain::subnet::SubnetKey;
use crate::domain::subnetwork::Subnetwork;
use std::net::IpAddr;

/// Durable per-subnet storage.
///
/// Calls for one subnet key are serialised by the caller (the entry lock);
/// calls for different keys may run concurrently.
///
/// A write that fails leaves the record as it was, except
/// `StoreError::Unsynced`: the change is in place and only its sync failed.
pub trait SubnetStore: Send + Sync {
    /// Create the backing record exclusively and write its header.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if a record for this key is already present. A
    /// failed create leaves no record behind.
    fn create_subnet_file(&self, subnet: &Subnetwork) -> Result<(), StoreError>;

    /// Append one reserved address to an existing record.
    ///
    /// Must not interleave with `rewrite_subnet_file` for the same key. A
    /// failed append is cut back off the record.
    fn append_reservation(&self, key: &SubnetKey, address: IpAddr) -> Result<(), StoreError>;

    /// Replace the record with the full header and reserved set.
    ///
    /// The record is observed either fully old or fully new.
    fn rewrite_subnet_file(&self, subnet: &Subnetwork) -> Result<(), StoreError>;

    /// Dispose of the record of a removed subnet.
    ///
    /// A missing record is not an error.
    fn remove_subnet_file(&self, key: &SubnetKey, policy: RemovalPolicy)
        -> Result<(), StoreError>;

    /// Reconstruct every stored subnet.
    fn load_all(&self) -> Result<SubnetRegistry, StoreError>;
}
