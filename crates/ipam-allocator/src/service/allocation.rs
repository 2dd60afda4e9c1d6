//! # IPAM Service - Allocation
//!
//! `AllocationApi` implementation. Both mutations follow the same shape:
//! remember the cursor, mutate, persist, and restore the remembered state if
//! the write did not land.

use super::*;
use crate::domain::subnet::parse_address_cidr;
use crate::payloads::{AllocateRequest, Reservation, ReleaseRequest};
use crate::ports::inbound::AllocationApi;
use std::net::IpAddr;
use tracing::{debug, error};

impl<S: SubnetStore> AllocationApi for IpamService<S> {
    fn allocate(&self, request: AllocateRequest) -> Result<Reservation, IpamError> {
        let key = SubnetKey::parse(&request.subnet)?;
        let requested = request.requested_ip.map(|a| a.to_canonical());

        self.transact(&key, |subnet| {
            let previous_cursor = subnet.cursor();
            let address = subnet.reserve(requested)?;

            if let Err(e) = committed(&key, self.store.append_reservation(&key, address)) {
                subnet.rollback_reserve(address, previous_cursor);
                error!(
                    subnet = %key,
                    address = %address,
                    error = %e,
                    "[ipam] Reservation rolled back"
                );
                return Err(e.into_ipam(key));
            }

            info!(
                subnet = %key,
                address = %address,
                explicit = requested.is_some(),
                "[ipam] Address allocated"
            );
            Ok(Reservation {
                ip: address,
                gateway: subnet.gateway(),
            })
        })
    }

    fn release(&self, request: ReleaseRequest) -> Result<(), IpamError> {
        let (address, key) = parse_address_cidr(&request.ip)?;

        self.transact(&key, |subnet| {
            let previous_cursor = subnet.cursor();
            if !subnet.release(address) {
                debug!(subnet = %key, address = %address, "[ipam] Address was not reserved");
                return Ok(());
            }

            if let Err(e) = committed(&key, self.store.rewrite_subnet_file(subnet)) {
                subnet.rollback_release(address, previous_cursor);
                error!(
                    subnet = %key,
                    address = %address,
                    error = %e,
                    "[ipam] Release rolled back"
                );
                return Err(e.into_ipam(key));
            }

            info!(subnet = %key, address = %address, "[ipam] Address released");
            Ok(())
        })
    }

    fn list_reservations(&self, subnet: &str) -> Result<Vec<IpAddr>, IpamError> {
        let key = SubnetKey::parse(subnet)?;
        self.transact(&key, |entry| Ok(entry.reserved_sorted()))
    }
}
