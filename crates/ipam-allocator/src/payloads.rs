//! # Request / Response Payloads
//!
//! Decoded shapes exchanged with the transport collaborator. Field names
//! follow the REST wire format (`range-start`, `requestedIp`, ...).

use crate::domain::errors::{ErrorKind, IpamError};
use crate::domain::subnetwork::Subnetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Register a subnet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSubnetRequest {
    /// CIDR text; host bits are cleared.
    #[serde(default)]
    pub subnet: String,
    #[serde(rename = "range-start", default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<IpAddr>,
    #[serde(rename = "range-end", default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<IpAddr>,
}

impl RegisterSubnetRequest {
    pub fn new(subnet: impl Into<String>) -> Self {
        Self {
            subnet: subnet.into(),
            ..Self::default()
        }
    }

    pub fn with_range(mut self, start: IpAddr, end: IpAddr) -> Self {
        self.range_start = Some(start);
        self.range_end = Some(end);
        self
    }

    pub fn with_gateway(mut self, gateway: IpAddr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_dns(mut self, dns: IpAddr) -> Self {
        self.dns = Some(dns);
        self
    }
}

/// Allocate an address, optionally a specific one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocateRequest {
    pub subnet: String,
    #[serde(rename = "requestedIp", default, skip_serializing_if = "Option::is_none")]
    pub requested_ip: Option<IpAddr>,
}

impl AllocateRequest {
    /// Next free address of `subnet`.
    pub fn next(subnet: impl Into<String>) -> Self {
        Self {
            subnet: subnet.into(),
            requested_ip: None,
        }
    }

    /// A specific address of `subnet`.
    pub fn explicit(subnet: impl Into<String>, address: IpAddr) -> Self {
        Self {
            subnet: subnet.into(),
            requested_ip: Some(address),
        }
    }
}

/// Release one address, given as `address/prefix` (`10.0.0.5/24`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub ip: String,
}

impl ReleaseRequest {
    pub fn new(ip: impl Into<String>) -> Self {
        Self { ip: ip.into() }
    }
}

/// A successful allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub ip: IpAddr,
    pub gateway: Option<IpAddr>,
}

/// Read model of one subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetView {
    pub subnet: String,
    #[serde(rename = "range-start", skip_serializing_if = "Option::is_none")]
    pub range_start: Option<IpAddr>,
    #[serde(rename = "range-end", skip_serializing_if = "Option::is_none")]
    pub range_end: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<IpAddr>,
    pub ips: Vec<IpAddr>,
}

impl From<&Subnetwork> for SubnetView {
    fn from(subnet: &Subnetwork) -> Self {
        let definition = subnet.definition();
        Self {
            subnet: subnet.key().to_string(),
            range_start: definition.range_start,
            range_end: definition.range_end,
            gateway: definition.gateway,
            dns: definition.dns,
            ips: subnet.reserved_sorted(),
        }
    }
}

/// Error body for transport responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub kind: ErrorKind,
}

impl From<&IpamError> for ErrorResponse {
    fn from(err: &IpamError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}
