//! # Domain Layer
//!
//! Pure allocation logic with no I/O.
//!
//! - `range` - usable-range arithmetic and the successor function
//! - `subnet` - canonical subnet keys and address parsing
//! - `subnetwork` - the allocation entity and its next-free search
//! - `registry` - concurrent key -> subnetwork map
//! - `config` - storage configuration
//! - `errors` - error taxonomy

pub mod config;
pub mod errors;
pub mod range;
pub mod registry;
pub mod subnet;
pub mod subnetwork;

pub use config::{RemovalPolicy, StorageConfig, DEFAULT_DATA_DIR};
pub use errors::{ErrorKind, IpamError, IpamResult, StoreError, ValidationError};
pub use range::{compute_range, successor, validate_within, AddressRange};
pub use registry::{SubnetHandle, SubnetRegistry};
pub use subnet::{parse_address, parse_address_cidr, SubnetKey};
pub use subnetwork::{SubnetDefinition, Subnetwork};
