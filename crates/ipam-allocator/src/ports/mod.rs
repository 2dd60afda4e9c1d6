//! # Ports
//!
//! - `inbound` - the API request collaborators drive
//! - `outbound` - the durable store the service depends on

pub mod inbound;
pub mod outbound;
