//! # Inbound Ports (Driving Ports)
//!
//! The API request collaborators call. Collaborators decode transport
//! requests into the payload types and translate [`IpamError`] (via
//! [`IpamError::kind`]) into transport responses; they never see the
//! registry or the store.
//!
//! [`IpamError::kind`]: crate::domain::errors::IpamError::kind

use crate::domain::errors::IpamError;
use crate::payloads::{
    AllocateRequest, RegisterSubnetRequest, ReleaseRequest, Reservation, SubnetView,
};
use std::net::IpAddr;

/// Subnet lifecycle operations.
pub trait SubnetAdminApi {
    /// Register a subnet and create its durable record.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed CIDR, range override outside the subnet,
    ///   inverted override, mixed families
    /// - `SubnetAlreadyExists`: key registered in memory or present on disk
    /// - `Persistence`: the record could not be created
    fn register_subnet(&self, request: RegisterSubnetRequest) -> Result<SubnetView, IpamError>;

    /// Remove a subnet. The record is disposed of per the configured
    /// `RemovalPolicy`.
    ///
    /// ## Errors
    ///
    /// - `SubnetNotFound`: key not registered
    /// - `Persistence`: the record could not be archived/deleted (the
    ///   subnet stays registered)
    fn remove_subnet(&self, subnet: &str) -> Result<(), IpamError>;

    /// Current state of one subnet.
    fn get_subnet(&self, subnet: &str) -> Result<SubnetView, IpamError>;

    /// Point-in-time listing of every subnet, sorted by key.
    fn list_subnets(&self) -> Vec<SubnetView>;
}

/// Address allocation operations.
///
/// Each call is one transaction on its subnet key: search, mutate and
/// persist happen under the key's lock, and a failed write is rolled back
/// before the error is returned.
pub trait AllocationApi {
    /// Reserve the requested address, or the next free one.
    ///
    /// ## Errors
    ///
    /// - `SubnetNotFound`: subnet not registered
    /// - `AddressAlreadyReserved`: requested address taken
    /// - `OutOfRange`: requested address outside the subnet
    /// - `AllocationExhausted`: no free address
    /// - `Persistence`: append failed (reservation rolled back)
    fn allocate(&self, request: AllocateRequest) -> Result<Reservation, IpamError>;

    /// Release an address given as `address/prefix`.
    ///
    /// Releasing an address that is not reserved succeeds without writing.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed `address/prefix`
    /// - `SubnetNotFound`: subnet not registered
    /// - `Persistence`: rewrite failed (release rolled back)
    fn release(&self, request: ReleaseRequest) -> Result<(), IpamError>;

    /// Reserved addresses of one subnet, ascending.
    fn list_reservations(&self, subnet: &str) -> Result<Vec<IpAddr>, IpamError>;
}

/// The full IPAM API: subnet lifecycle plus allocation.
pub trait IpamApi: SubnetAdminApi + AllocationApi {}

impl<T: SubnetAdminApi + AllocationApi> IpamApi for T {}
