//! # Subnet Record Format
//!
//! One text record per subnet, stored in a file named after the canonical
//! key with `/` replaced by `#` (`10.0.0.0/24` -> `10.0.0.0#24`):
//!
//! ```text
//! subnet=10.0.0.0/24
//! gateway=10.0.0.1
//! rangeStart=10.0.0.10
//! rangeEnd=10.0.0.200
//!
//! 10.0.0.11
//! 10.0.0.12
//! ```
//!
//! Header keys are `subnet`, `gateway`, `dns`, `rangeStart`, `rangeEnd`;
//! unset keys are omitted. Every reserved address is written preceded by a
//! newline, so a torn append leaves a lone malformed line that never merges
//! with the next record.

use crate::domain::subnet::{parse_address, SubnetKey};
use crate::domain::subnetwork::{SubnetDefinition, Subnetwork};
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr};

/// Suffix of the scratch file used by a full rewrite.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Suffix given to the record of an archived (removed) subnet.
pub const ARCHIVE_SUFFIX: &str = ".removed";

/// Name of the data-directory lock file.
pub const LOCK_FILE_NAME: &str = "LOCK";

/// File name for a subnet key.
pub fn file_name_for(key: &SubnetKey) -> String {
    key.to_string().replace('/', "#")
}

/// Inverse of [`file_name_for`]. `None` for names that are not a canonical
/// subnet file name.
pub fn key_for_file_name(name: &str) -> Option<SubnetKey> {
    let key = SubnetKey::parse(&name.replace('#', "/")).ok()?;
    (file_name_for(&key) == name).then_some(key)
}

/// True for names the bootstrap loader should read.
pub fn is_record_file_name(name: &str) -> bool {
    name != LOCK_FILE_NAME && !name.ends_with(TEMP_SUFFIX) && !name.ends_with(ARCHIVE_SUFFIX)
}

/// Header block, one `key=value` line per set field.
pub fn encode_header(definition: &SubnetDefinition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "subnet={}", definition.subnet);
    let fields = [
        ("gateway", definition.gateway),
        ("dns", definition.dns),
        ("rangeStart", definition.range_start),
        ("rangeEnd", definition.range_end),
    ];
    for (name, value) in fields {
        if let Some(address) = value {
            let _ = writeln!(out, "{}={}", name, address);
        }
    }
    out
}

/// One appended reservation.
pub fn encode_reservation(address: IpAddr) -> String {
    format!("\n{}", address)
}

/// Full record: header then every reserved address in ascending order.
pub fn encode_record(subnet: &Subnetwork) -> String {
    let mut out = encode_header(subnet.definition());
    for address in subnet.reserved_sorted() {
        out.push_str(&encode_reservation(address));
    }
    out.push('\n');
    out
}

/// Result of parsing one record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// `None` when the record has no valid `subnet=` header.
    pub definition: Option<SubnetDefinition>,
    pub reserved: Vec<IpAddr>,
    /// Lines that are neither a header nor an address.
    pub malformed: usize,
    /// Well-formed address lines the loader does not restore (non-IPv4).
    pub unsupported: usize,
}

/// Parse a record, best effort: bad lines are counted and skipped.
///
/// Only IPv4 reservation lines are restored.
pub fn parse_record(text: &str) -> ParsedRecord {
    let mut record = ParsedRecord::default();
    let mut subnet: Option<SubnetKey> = None;
    let mut gateway = None;
    let mut dns = None;
    let mut range_start = None;
    let mut range_end = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((name, value)) = line.split_once('=') {
            let value = value.trim();
            match name.trim() {
                "subnet" => match SubnetKey::parse(value) {
                    Ok(key) => subnet = Some(key),
                    Err(_) => return ParsedRecord::default(),
                },
                "gateway" => gateway = parse_address(value).ok(),
                "dns" => dns = parse_address(value).ok(),
                "rangeStart" => range_start = parse_address(value).ok(),
                "rangeEnd" => range_end = parse_address(value).ok(),
                _ => record.malformed += 1,
            }
            continue;
        }

        match line.parse::<Ipv4Addr>() {
            Ok(v4) => record.reserved.push(IpAddr::V4(v4)),
            Err(_) if line.parse::<IpAddr>().is_ok() => record.unsupported += 1,
            Err(_) => record.malformed += 1,
        }
    }

    record.definition = subnet.map(|key| {
        SubnetDefinition::new(key)
            .with_range(range_start, range_end)
            .with_gateway(gateway)
            .with_dns(dns)
    });
    record
}
