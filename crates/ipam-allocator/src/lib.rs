//! # IPAM Allocator
//!
//! IP address management for container networking: hands out addresses from
//! registered subnets and keeps every reservation in a crash-safe text file
//! per subnet.
//!
//! ## Architecture
//!
//! ```text
//! request collaborator
//!        │  RegisterSubnetRequest / AllocateRequest / ReleaseRequest
//!        ↓
//!   IpamService ──lock entry──→ SubnetRegistry ──→ Subnetwork (NextFree)
//!        │
//!        └──append / rewrite──→ SubnetStore ──→ <data_dir>/10.0.0.0#24
//! ```
//!
//! Every mutation is one transaction on its subnet key: the in-memory change
//! and the durable write happen under the entry lock, and a failed write is
//! undone before the error is returned.
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Unique Reservations | An address is handed out at most once per subnet |
//! | Bounded Search | NextFree visits each address of the range at most once |
//! | Range Containment | The cursor never leaves the effective range |
//! | Durable Commit | A returned reservation survives a restart |
//! | Atomic Rewrite | A rewritten file is seen fully old or fully new |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Range arithmetic, subnetworks, registry, errors
//! - `ports/` - Inbound API traits, outbound store trait
//! - `adapters/` - File and in-memory stores, data-directory lock
//! - `service/` - Application service implementing the API
//! - `payloads` - Request/response shapes for transport collaborators
//!
//! ## Usage
//!
//! ```ignore
//! use ipam_allocator::{AllocateRequest, AllocationApi, FileSubnetStore, IpamService,
//!     RegisterSubnetRequest, StorageConfig, SubnetAdminApi};
//!
//! let config = StorageConfig::default();
//! let store = FileSubnetStore::open(&config)?;
//! let service = IpamService::bootstrap(store, config)?;
//!
//! service.register_subnet(RegisterSubnetRequest::new("10.0.0.0/24"))?;
//! let reservation = service.allocate(AllocateRequest::next("10.0.0.0/24"))?;
//! ```

pub mod adapters;
pub mod domain;
pub mod payloads;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use domain::config::{RemovalPolicy, StorageConfig, DEFAULT_DATA_DIR};
pub use domain::errors::{ErrorKind, IpamError, IpamResult, StoreError, ValidationError};
pub use domain::range::AddressRange;
pub use domain::registry::SubnetRegistry;
pub use domain::subnet::SubnetKey;
pub use domain::subnetwork::{SubnetDefinition, Subnetwork};
pub use ports::inbound::{AllocationApi, IpamApi, SubnetAdminApi};
pub use ports::outbound::SubnetStore;
pub use service::IpamService;

pub use adapters::{FileSubnetStore, InMemorySubnetStore};
#[cfg(feature = "locking")]
pub use adapters::{DataDirLock, LockError};

pub use payloads::*;
