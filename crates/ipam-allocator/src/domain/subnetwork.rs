//! # Subnetwork
//!
//! The allocation entity: one managed subnet, its reserved-address set and
//! the allocation cursor.
//!
//! ## Next-free search
//!
//! The search starts one step past the cursor and walks `successor` until it
//! finds an unreserved address or comes back to where it started:
//!
//! ```text
//! 10.0.0.0/30, cursor = 10.0.0.0 (range start)
//!
//! allocate -> 10.0.0.1
//! allocate -> 10.0.0.2
//! allocate -> 10.0.0.0   (network address only after wrapping)
//! allocate -> AllocationExhausted
//! ```
//!
//! ## Invariants
//!
//! - `reserved` never holds duplicates
//! - the cursor is unset, the range start/end, or an address the search
//!   landed on; it never leaves the effective range

use super::errors::{IpamError, IpamResult, ValidationError};
use super::range::{same_family, successor, validate_within, AddressRange};
use super::subnet::SubnetKey;
use std::collections::HashSet;
use std::net::IpAddr;

/// The header of a subnet: everything except allocation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetDefinition {
    pub subnet: SubnetKey,
    pub range_start: Option<IpAddr>,
    pub range_end: Option<IpAddr>,
    pub gateway: Option<IpAddr>,
    pub dns: Option<IpAddr>,
}

impl SubnetDefinition {
    /// Definition with no overrides and no informational addresses.
    pub fn new(subnet: SubnetKey) -> Self {
        Self {
            subnet,
            range_start: None,
            range_end: None,
            gateway: None,
            dns: None,
        }
    }

    pub fn with_range(mut self, start: Option<IpAddr>, end: Option<IpAddr>) -> Self {
        self.range_start = start;
        self.range_end = end;
        self
    }

    pub fn with_gateway(mut self, gateway: Option<IpAddr>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn with_dns(mut self, dns: Option<IpAddr>) -> Self {
        self.dns = dns;
        self
    }

    /// Check the range overrides against the subnet's usable range.
    ///
    /// Gateway and DNS are informational and not checked.
    pub fn validate(&self) -> Result<AddressRange, ValidationError> {
        let full = self.subnet.address_range()?;
        let key = self.subnet.to_string();

        for address in [self.range_start, self.range_end].into_iter().flatten() {
            if !same_family(address, full.start()) {
                return Err(ValidationError::FamilyMismatch {
                    subnet: key,
                    address,
                });
            }
            if !validate_within(address, &full) {
                return Err(ValidationError::RangeOverrideOutsideSubnet {
                    subnet: key,
                    address,
                });
            }
        }

        let start = self.range_start.unwrap_or(full.start());
        let end = self.range_end.unwrap_or(full.end());
        AddressRange::new(start, end).ok_or(ValidationError::RangeOverrideInverted {
            subnet: key,
            start,
            end,
        })
    }
}

/// One managed subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnetwork {
    definition: SubnetDefinition,
    /// Effective range, fixed once the definition is validated.
    range: AddressRange,
    reserved: HashSet<IpAddr>,
    cursor: Option<IpAddr>,
}

impl Subnetwork {
    /// Build a subnetwork from a validated definition.
    pub fn new(definition: SubnetDefinition) -> Result<Self, ValidationError> {
        let range = definition.validate()?;
        Ok(Self {
            definition,
            range,
            reserved: HashSet::new(),
            cursor: None,
        })
    }

    pub fn key(&self) -> &SubnetKey {
        &self.definition.subnet
    }

    pub fn definition(&self) -> &SubnetDefinition {
        &self.definition
    }

    pub fn gateway(&self) -> Option<IpAddr> {
        self.definition.gateway
    }

    pub fn dns(&self) -> Option<IpAddr> {
        self.definition.dns
    }

    /// Range `NextFree` allocates from: the subnet range narrowed by overrides.
    pub fn effective_range(&self) -> AddressRange {
        self.range
    }

    /// Last address reserved by the search, if any.
    pub fn cursor(&self) -> Option<IpAddr> {
        self.cursor
    }

    pub fn is_reserved(&self, address: IpAddr) -> bool {
        self.reserved.contains(&address)
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Reserved addresses in ascending order.
    pub fn reserved_sorted(&self) -> Vec<IpAddr> {
        let mut addresses: Vec<IpAddr> = self.reserved.iter().copied().collect();
        addresses.sort();
        addresses
    }

    /// Find the next unreserved address without mutating anything.
    ///
    /// # Errors
    ///
    /// `AllocationExhausted` after a full cycle of the effective range.
    pub fn next_free(&self) -> IpamResult<IpAddr> {
        let range = self.range;
        let cursor = self.cursor.unwrap_or(range.start());

        let first = successor(&range, cursor);
        let mut candidate = first;
        loop {
            if !self.reserved.contains(&candidate) {
                return Ok(candidate);
            }
            candidate = successor(&range, candidate);
            if candidate == first {
                return Err(IpamError::AllocationExhausted {
                    subnet: self.key().to_string(),
                });
            }
        }
    }

    /// Reserve `explicit`, or the next free address when `None`.
    ///
    /// An explicit address is checked against the whole subnet, not the
    /// range override. The cursor only follows addresses inside the effective
    /// range.
    ///
    /// # Errors
    ///
    /// - `AddressAlreadyReserved`: explicit address already taken
    /// - `OutOfRange`: explicit address outside the subnet
    /// - `AllocationExhausted`: no free address left
    pub fn reserve(&mut self, explicit: Option<IpAddr>) -> IpamResult<IpAddr> {
        let address = match explicit {
            Some(address) => {
                if self.reserved.contains(&address) {
                    return Err(IpamError::AddressAlreadyReserved {
                        subnet: self.key().to_string(),
                        address,
                    });
                }
                if !self.key().contains(address) {
                    return Err(IpamError::OutOfRange {
                        subnet: self.key().to_string(),
                        address,
                    });
                }
                address
            }
            None => self.next_free()?,
        };

        self.reserved.insert(address);
        if self.range.contains(address) {
            self.cursor = Some(address);
        }
        Ok(address)
    }

    /// Free `address`. Returns `false` (and changes nothing) if it was not
    /// reserved.
    ///
    /// Releasing the cursor address moves the cursor to the next free
    /// address after it, so the released slot is only offered again in
    /// search order.
    pub fn release(&mut self, address: IpAddr) -> bool {
        if !self.reserved.contains(&address) {
            return false;
        }
        if self.cursor == Some(address) {
            self.cursor = self.next_free().ok();
        }
        self.reserved.remove(&address);
        true
    }

    /// Undo a successful `reserve`.
    pub(crate) fn rollback_reserve(&mut self, address: IpAddr, cursor: Option<IpAddr>) {
        self.reserved.remove(&address);
        self.cursor = cursor;
    }

    /// Undo a successful `release`.
    pub(crate) fn rollback_release(&mut self, address: IpAddr, cursor: Option<IpAddr>) {
        self.reserved.insert(address);
        self.cursor = cursor;
    }

    /// Restore a reservation read back from disk. Addresses outside the
    /// subnet are refused.
    pub(crate) fn restore_reserved(&mut self, address: IpAddr) -> bool {
        if !self.key().contains(address) {
            return false;
        }
        self.reserved.insert(address);
        true
    }
}
