//! # Domain Errors
//!
//! Error types for the IPAM allocation engine.
//!
//! ## Design Principles
//!
//! - Each error names the failed precondition and carries the offending
//!   subnet key and/or address as structured fields
//! - Validation and business-rule errors are raised before any mutation
//! - `Persistence` is the only error that can follow an in-memory mutation,
//!   and the service rolls that mutation back before returning it
//! - A store write either leaves the record unchanged when it fails, or has
//!   already become visible and reports `StoreError::Unsynced`

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed input or a subnet definition that cannot be allocated from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Text is not a CIDR (`a.b.c.d/n` or an IPv6 prefix).
    #[error("invalid CIDR: {input:?}")]
    InvalidCidr { input: String },

    /// Text is not an IP address.
    #[error("invalid IP address: {input:?}")]
    InvalidAddress { input: String },

    /// Address family of an address does not match the subnet's.
    #[error("address {address} is not the same family as subnet {subnet}")]
    FamilyMismatch { subnet: String, address: IpAddr },

    /// Subnet definition has no network address.
    #[error("missing field \"subnet\" in IPAM configuration")]
    MissingNetworkAddress,

    /// Subnet has no usable address once the broadcast address is excluded.
    #[error("subnet {subnet} has no usable address range")]
    EmptyRange { subnet: String },

    /// `rangeStart`/`rangeEnd` override lies outside the subnet.
    #[error("range override {address} outside of network {subnet}")]
    RangeOverrideOutsideSubnet { subnet: String, address: IpAddr },

    /// `rangeStart` is greater than `rangeEnd`.
    #[error("range start {start} is after range end {end} in {subnet}")]
    RangeOverrideInverted {
        subnet: String,
        start: IpAddr,
        end: IpAddr,
    },
}

/// Coarse error taxonomy handed to transport collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    AlreadyExists,
    OutOfRange,
    AllocationExhausted,
    NotFound,
    Persistence,
}

/// Errors returned by IPAM operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpamError {
    /// Malformed CIDR/address or invalid subnet definition.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Subnet is already registered (in memory or on disk).
    #[error("subnet {subnet} is already registered")]
    SubnetAlreadyExists { subnet: String },

    /// Explicitly requested address is already reserved.
    #[error("address {address} is already reserved in {subnet}")]
    AddressAlreadyReserved { subnet: String, address: IpAddr },

    /// Explicitly requested address is not inside the subnet.
    #[error("address {address} is not within subnet {subnet}")]
    OutOfRange { subnet: String, address: IpAddr },

    /// Every address of the effective range is reserved.
    #[error("no available address in {subnet}")]
    AllocationExhausted { subnet: String },

    /// Subnet key is not registered.
    #[error("subnet {subnet} is not registered")]
    SubnetNotFound { subnet: String },

    /// Durable write failed; any in-memory mutation was rolled back.
    #[error("failed to {operation} for {subnet}: {message}")]
    Persistence {
        subnet: String,
        operation: &'static str,
        message: String,
    },
}

impl IpamError {
    /// Taxonomy tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IpamError::Validation(_) => ErrorKind::Validation,
            IpamError::SubnetAlreadyExists { .. } | IpamError::AddressAlreadyReserved { .. } => {
                ErrorKind::AlreadyExists
            }
            IpamError::OutOfRange { .. } => ErrorKind::OutOfRange,
            IpamError::AllocationExhausted { .. } => ErrorKind::AllocationExhausted,
            IpamError::SubnetNotFound { .. } => ErrorKind::NotFound,
            IpamError::Persistence { .. } => ErrorKind::Persistence,
        }
    }
}

/// Result type for IPAM operations.
pub type IpamResult<T> = Result<T, IpamError>;

/// Subnet store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Exclusive create found an existing file.
    #[error("subnet file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// Underlying filesystem call failed.
    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The change is visible in the data directory but could not be made
    /// durable. The write counts as committed.
    #[error("failed to {operation} {} after commit: {source}", path.display())]
    Unsynced {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl StoreError {
    /// Adapter for `map_err` that tags an I/O error with the failed step.
    pub fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io {
            operation,
            path,
            source,
        }
    }

    /// Like [`StoreError::io`], for a step that runs after the change is
    /// already visible.
    pub fn unsynced(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Unsynced {
            operation,
            path,
            source,
        }
    }

    /// True when the write landed and only its sync failed.
    pub fn is_unsynced(&self) -> bool {
        matches!(self, StoreError::Unsynced { .. })
    }

    /// Attach the subnet key and surface as an [`IpamError`].
    pub fn into_ipam(self, subnet: impl ToString) -> IpamError {
        match self {
            StoreError::AlreadyExists { .. } => IpamError::SubnetAlreadyExists {
                subnet: subnet.to_string(),
            },
            StoreError::Io {
                operation, source, ..
            }
            | StoreError::Unsynced {
                operation, source, ..
            } => IpamError::Persistence {
                subnet: subnet.to_string(),
                operation,
                message: source.to_string(),
            },
        }
    }
}
