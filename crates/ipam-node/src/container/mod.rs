//! # Node Container
//!
//! Configuration and wiring for the IPAM node.

pub mod config;

pub use config::IpamConfig;
