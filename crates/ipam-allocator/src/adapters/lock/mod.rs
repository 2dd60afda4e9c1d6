//! # Data Directory Locking
//!
//! Prevents two processes from serving the same data directory. Each
//! subnet file has a single writer only while one process owns the
//! directory.
//!
//! ## Modules
//!
//! - `flock`: `DataDirLock` implementation using fs2
//! - `security`: lock timeout and stale-holder detection

mod flock;
mod security;

pub use flock::{DataDirLock, LockError};
pub use security::DEFAULT_LOCK_TIMEOUT;
