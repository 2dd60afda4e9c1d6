//! # IPAM Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (NextFree search)
//! └── src/
//!     └── integration/  # Cross-module flows
//!         ├── restart.rs      # Durability across restarts
//!         └── concurrency.rs  # Per-key transactions under contention
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ipam-tests
//!
//! # By category
//! cargo test -p ipam-tests integration::restart::
//! cargo test -p ipam-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p ipam-tests
//! ```

pub mod integration;
