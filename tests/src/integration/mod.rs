//! # Integration Flows
//!
//! Service + file store + registry exercised together on a real data
//! directory.

pub mod concurrency;
pub mod restart;
