//! # Range Arithmetic
//!
//! Pure functions over a subnet's usable address range.
//!
//! Addresses are handled as unsigned integers of their family's width
//! (IPv4 as 4 bytes, IPv6 as 16 bytes) widened to `u128`, so the successor of
//! an address is plain integer addition with wraparound at the range end.
//!
//! ```text
//! 10.0.0.0/30   start = 10.0.0.0   end = 10.0.0.2   (10.0.0.3 is broadcast)
//!
//! successor(10.0.0.0) = 10.0.0.1
//! successor(10.0.0.1) = 10.0.0.2
//! successor(10.0.0.2) = 10.0.0.0   <- wraps
//! ```

use super::errors::ValidationError;
use ipnet::IpNet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Inclusive bounds of the usable addresses of a subnet.
///
/// Invariant: `start <= end` and both share one address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: IpAddr,
    end: IpAddr,
}

impl AddressRange {
    /// Build a range from explicit bounds.
    ///
    /// Returns `None` when the families differ or `start > end`.
    pub fn new(start: IpAddr, end: IpAddr) -> Option<Self> {
        if !same_family(start, end) || to_u128(start) > to_u128(end) {
            return None;
        }
        Some(Self { start, end })
    }

    /// First usable address.
    pub fn start(&self) -> IpAddr {
        self.start
    }

    /// Last usable address.
    pub fn end(&self) -> IpAddr {
        self.end
    }

    /// Number of addresses in the range.
    pub fn size(&self) -> u128 {
        (to_u128(self.end) - to_u128(self.start)).saturating_add(1)
    }

    /// Inclusive membership test.
    pub fn contains(&self, address: IpAddr) -> bool {
        validate_within(address, self)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Derive the usable range of a subnet.
///
/// `start` is the network address and `end` the highest address under the
/// mask. For IPv4 the broadcast address is excluded, so `end` is one below it.
///
/// # Errors
///
/// `EmptyRange` when nothing remains after excluding the broadcast address
/// (an IPv4 `/32`).
pub fn compute_range(subnet: &IpNet) -> Result<AddressRange, ValidationError> {
    let network = subnet.network();
    let last = subnet.broadcast();

    let end = match last {
        IpAddr::V4(_) => {
            let value = to_u128(last);
            if value == to_u128(network) {
                return Err(ValidationError::EmptyRange {
                    subnet: subnet.to_string(),
                });
            }
            from_u128(value - 1, last)
        }
        IpAddr::V6(_) => last,
    };

    AddressRange::new(network, end).ok_or_else(|| ValidationError::EmptyRange {
        subnet: subnet.to_string(),
    })
}

/// Next address after `current`, wrapping to `range.start` after `range.end`.
///
/// A `current` outside the range (or of the other family) also yields
/// `range.start`, so repeated application always stays inside the range.
pub fn successor(range: &AddressRange, current: IpAddr) -> IpAddr {
    if !validate_within(current, range) || current == range.end {
        return range.start;
    }
    from_u128(to_u128(current) + 1, range.start)
}

/// Inclusive bounds check. Addresses of the other family are never within.
pub fn validate_within(address: IpAddr, range: &AddressRange) -> bool {
    if !same_family(address, range.start) {
        return false;
    }
    let value = to_u128(address);
    value >= to_u128(range.start) && value <= to_u128(range.end)
}

/// True when both addresses are IPv4 or both are IPv6.
pub fn same_family(a: IpAddr, b: IpAddr) -> bool {
    a.is_ipv4() == b.is_ipv4()
}

pub(crate) fn to_u128(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Rebuild an address of `family`'s family from an integer value.
///
/// Callers keep `value` within the family's width.
pub(crate) fn from_u128(value: u128, family: IpAddr) -> IpAddr {
    match family {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(value as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(value)),
    }
}
