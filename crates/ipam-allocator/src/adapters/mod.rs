//! # Adapters Layer
//!
//! - `storage` - `SubnetStore` implementations (file-backed, in-memory)
//! - `lock` - exclusive lock on the data directory

#[cfg(feature = "locking")]
pub mod lock;
pub mod storage;

#[cfg(feature = "locking")]
pub use lock::{DataDirLock, LockError};
pub use storage::{FileSubnetStore, InMemorySubnetStore};
