//! # Subnet Keys
//!
//! Canonical subnet identifiers and address parsing.
//!
//! A subnet is keyed by its network address (host bits cleared) and prefix
//! length, rendered as `10.0.0.0/24` or `fd00::/64`. Every lookup, file name
//! and log line uses that canonical text.

use super::errors::ValidationError;
use super::range::{compute_range, AddressRange};
use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Canonical network address + prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubnetKey(IpNet);

impl SubnetKey {
    /// Wrap a network, clearing any host bits.
    pub fn new(net: IpNet) -> Self {
        Self(net.trunc())
    }

    /// Parse CIDR text. Host bits are accepted and cleared
    /// (`10.0.0.7/24` names `10.0.0.0/24`).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingNetworkAddress);
        }
        trimmed
            .parse::<IpNet>()
            .map(Self::new)
            .map_err(|_| ValidationError::InvalidCidr {
                input: input.to_string(),
            })
    }

    /// The underlying network.
    pub fn net(&self) -> &IpNet {
        &self.0
    }

    /// Network address.
    pub fn network(&self) -> IpAddr {
        self.0.network()
    }

    /// Prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// True if `address` lies inside the CIDR block (broadcast included).
    pub fn contains(&self, address: IpAddr) -> bool {
        self.0.contains(&address)
    }

    /// Usable range of this subnet (IPv4 broadcast excluded).
    pub fn address_range(&self) -> Result<AddressRange, ValidationError> {
        compute_range(&self.0)
    }
}

impl fmt::Display for SubnetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SubnetKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SubnetKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SubnetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        SubnetKey::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Parse a single address, folding IPv4-mapped IPv6 (`::ffff:a.b.c.d`) to IPv4.
pub fn parse_address(input: &str) -> Result<IpAddr, ValidationError> {
    input
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_canonical())
        .map_err(|_| ValidationError::InvalidAddress {
            input: input.to_string(),
        })
}

/// Split `10.0.0.5/24` into the address and the subnet it belongs to.
///
/// An IPv4-mapped address (`::ffff:10.0.0.5/120`) folds to IPv4 and no
/// longer belongs to its IPv6 prefix, so it is refused.
pub fn parse_address_cidr(input: &str) -> Result<(IpAddr, SubnetKey), ValidationError> {
    let net = input
        .trim()
        .parse::<IpNet>()
        .map_err(|_| ValidationError::InvalidCidr {
            input: input.to_string(),
        })?;
    let address = net.addr().to_canonical();
    let key = SubnetKey::new(net);
    if address.is_ipv4() != net.addr().is_ipv4() {
        return Err(ValidationError::FamilyMismatch {
            subnet: key.to_string(),
            address,
        });
    }
    Ok((address, key))
}
