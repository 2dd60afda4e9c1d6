//! # IPAM Service - Subnet Lifecycle
//!
//! `SubnetAdminApi` implementation.

use super::*;
use crate::domain::subnetwork::SubnetDefinition;
use crate::payloads::{RegisterSubnetRequest, SubnetView};
use crate::ports::inbound::SubnetAdminApi;
use tracing::{debug, error, warn};

impl<S: SubnetStore> SubnetAdminApi for IpamService<S> {
    fn register_subnet(&self, request: RegisterSubnetRequest) -> Result<SubnetView, IpamError> {
        let key = SubnetKey::parse(&request.subnet)?;
        let definition = SubnetDefinition::new(key)
            .with_range(
                request.range_start.map(|a| a.to_canonical()),
                request.range_end.map(|a| a.to_canonical()),
            )
            .with_gateway(request.gateway.map(|a| a.to_canonical()))
            .with_dns(request.dns.map(|a| a.to_canonical()));
        let subnet = Subnetwork::new(definition)?;

        if self.registry.has(&key) {
            return Err(IpamError::SubnetAlreadyExists {
                subnet: key.to_string(),
            });
        }

        // the exclusive create is what decides between racing registrations
        committed(&key, self.store.create_subnet_file(&subnet)).map_err(|e| e.into_ipam(key))?;

        let view = SubnetView::from(&subnet);
        let range = subnet.effective_range();
        if self.registry.insert_if_absent(key, subnet).is_err() {
            warn!(subnet = %key, "[ipam] Subnet registered concurrently without a record");
            return Err(IpamError::SubnetAlreadyExists {
                subnet: key.to_string(),
            });
        }

        info!(
            subnet = %key,
            range = %range,
            addresses = range.size(),
            "[ipam] Subnet registered"
        );
        Ok(view)
    }

    fn remove_subnet(&self, subnet: &str) -> Result<(), IpamError> {
        let key = SubnetKey::parse(subnet)?;
        let policy = self.config.removal_policy;

        self.transact(&key, |_| {
            if let Err(e) = committed(&key, self.store.remove_subnet_file(&key, policy)) {
                error!(subnet = %key, error = %e, "[ipam] Failed to remove subnet record");
                return Err(e.into_ipam(key));
            }
            self.registry.remove(&key);
            Ok(())
        })?;

        info!(subnet = %key, policy = %policy, "[ipam] Subnet removed");
        Ok(())
    }

    fn get_subnet(&self, subnet: &str) -> Result<SubnetView, IpamError> {
        let key = SubnetKey::parse(subnet)?;
        self.transact(&key, |entry| Ok(SubnetView::from(&*entry)))
    }

    fn list_subnets(&self) -> Vec<SubnetView> {
        let views: Vec<SubnetView> = self
            .registry
            .entries()
            .iter()
            .map(|(_, subnet)| SubnetView::from(subnet))
            .collect();
        debug!(count = views.len(), "[ipam] Listed subnets");
        views
    }
}
