//! Storage Adapters
//!
//! Implementations of the `SubnetStore` trait. Both share the text record
//! format in [`record`].

mod file;
mod memory;
pub mod record;

pub use file::FileSubnetStore;
pub use memory::InMemorySubnetStore;

use crate::domain::subnetwork::Subnetwork;
use tracing::warn;

/// Rebuild one subnetwork from its record text, best effort.
///
/// `None` when the record has no usable `subnet=` header or describes a
/// subnet that cannot be allocated from. Dropped lines are logged.
pub(crate) fn restore(text: &str, origin: &str) -> Option<Subnetwork> {
    let parsed = record::parse_record(text);

    let Some(definition) = parsed.definition else {
        warn!(origin, "[ipam] Skipping record without a valid subnet header");
        return None;
    };

    let key = definition.subnet;
    let mut subnet = match Subnetwork::new(definition) {
        Ok(subnet) => subnet,
        Err(e) => {
            warn!(origin, subnet = %key, error = %e, "[ipam] Skipping invalid subnet definition");
            return None;
        }
    };

    let mut outside = 0usize;
    for address in parsed.reserved {
        if !subnet.restore_reserved(address) {
            outside += 1;
        }
    }

    if parsed.malformed > 0 || parsed.unsupported > 0 || outside > 0 {
        warn!(
            origin,
            subnet = %key,
            malformed = parsed.malformed,
            unsupported = parsed.unsupported,
            outside,
            "[ipam] Dropped unreadable reservation lines"
        );
    }

    Some(subnet)
}
