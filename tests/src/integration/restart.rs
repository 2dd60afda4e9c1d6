//! # Restart Durability
//!
//! Every committed reservation and release must be visible after the
//! service is rebuilt from its data directory, including after a crash in
//! the middle of an append or a rewrite.
//!
//! ## Flows Tested:
//!
//! 1. **Register → allocate → release → restart**: state and headers survive
//! 2. **Torn append**: a partial trailing line is dropped, later appends stay readable
//! 3. **Interrupted rewrite**: a leftover temp file is ignored
//! 4. **Removal**: archived and deleted subnets stay gone
//! 5. **Unsyncable directory**: a release that renamed but could not sync the
//!    directory is reported and reloaded the same way

#[cfg(test)]
mod tests {
    use ipam_allocator::{
        AllocateRequest, AllocationApi, FileSubnetStore, IpamService, RegisterSubnetRequest,
        ReleaseRequest, RemovalPolicy, StorageConfig, SubnetAdminApi,
    };
    use rand::seq::SliceRandom;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::net::IpAddr;
    use std::path::Path;
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn storage(dir: &Path) -> StorageConfig {
        StorageConfig::new().with_data_dir(dir)
    }

    /// Build a service from whatever is on disk, as a fresh process would.
    fn boot(config: StorageConfig) -> IpamService<FileSubnetStore> {
        let store = FileSubnetStore::open(&config).unwrap();
        IpamService::bootstrap(store, config).unwrap()
    }

    fn allocate(service: &IpamService<FileSubnetStore>, subnet: &str) -> IpAddr {
        service.allocate(AllocateRequest::next(subnet)).unwrap().ip
    }

    // =============================================================================
    // RESTART FLOWS
    // =============================================================================

    #[test]
    fn test_state_survives_restart() {
        let dir = TempDir::new().unwrap();

        let service = boot(storage(dir.path()));
        service
            .register_subnet(
                RegisterSubnetRequest::new("192.168.10.0/24")
                    .with_range(ip("192.168.10.100"), ip("192.168.10.199"))
                    .with_gateway(ip("192.168.10.1"))
                    .with_dns(ip("192.168.10.2")),
            )
            .unwrap();
        for _ in 0..10 {
            allocate(&service, "192.168.10.0/24");
        }
        service
            .allocate(AllocateRequest::explicit("192.168.10.0/24", ip("192.168.10.5")))
            .unwrap();
        service
            .release(ReleaseRequest::new("192.168.10.103/24"))
            .unwrap();
        let before = service.get_subnet("192.168.10.0/24").unwrap();
        drop(service);

        let service = boot(storage(dir.path()));
        let after = service.get_subnet("192.168.10.0/24").unwrap();
        assert_eq!(after, before);
        assert_eq!(after.range_start, Some(ip("192.168.10.100")));
        assert_eq!(after.dns, Some(ip("192.168.10.2")));
        assert_eq!(after.ips.len(), 10);
        assert!(after.ips.contains(&ip("192.168.10.5")));
        assert!(!after.ips.contains(&ip("192.168.10.103")));

        // the cursor restarts at the range start and skips what is taken
        assert_eq!(allocate(&service, "192.168.10.0/24"), ip("192.168.10.103"));
    }

    #[test]
    fn test_shuffled_releases_survive_restart() {
        let dir = TempDir::new().unwrap();
        let service = boot(storage(dir.path()));
        service
            .register_subnet(RegisterSubnetRequest::new("10.20.0.0/26"))
            .unwrap();

        let mut addresses: Vec<IpAddr> = (0..40).map(|_| allocate(&service, "10.20.0.0/26")).collect();
        addresses.shuffle(&mut rand::thread_rng());
        let (released, kept) = addresses.split_at(25);
        for address in released {
            service
                .release(ReleaseRequest::new(format!("{}/26", address)))
                .unwrap();
        }
        drop(service);

        let service = boot(storage(dir.path()));
        let mut expected = kept.to_vec();
        expected.sort();
        assert_eq!(service.list_reservations("10.20.0.0/26").unwrap(), expected);
    }

    #[test]
    fn test_torn_append_is_dropped() {
        let dir = TempDir::new().unwrap();
        let service = boot(storage(dir.path()));
        service
            .register_subnet(RegisterSubnetRequest::new("10.0.0.0/24"))
            .unwrap();
        allocate(&service, "10.0.0.0/24");
        allocate(&service, "10.0.0.0/24");
        drop(service);

        // crash half way through the third append
        let path = dir.path().join("10.0.0.0#24");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"\n10.0.").unwrap();
        drop(file);

        let service = boot(storage(dir.path()));
        assert_eq!(
            service.list_reservations("10.0.0.0/24").unwrap(),
            vec![ip("10.0.0.1"), ip("10.0.0.2")]
        );
        let next = allocate(&service, "10.0.0.0/24");
        assert_eq!(next, ip("10.0.0.3"));
        drop(service);

        let service = boot(storage(dir.path()));
        assert_eq!(service.list_reservations("10.0.0.0/24").unwrap().len(), 3);
    }

    #[test]
    fn test_interrupted_rewrite_keeps_old_record() {
        let dir = TempDir::new().unwrap();
        let service = boot(storage(dir.path()));
        service
            .register_subnet(RegisterSubnetRequest::new("10.0.0.0/24"))
            .unwrap();
        allocate(&service, "10.0.0.0/24");
        drop(service);

        // a rewrite that died before its rename
        fs::write(
            dir.path().join("10.0.0.0#24.tmp"),
            "subnet=10.0.0.0/24\n\n10.0.0.200\n",
        )
        .unwrap();

        let service = boot(storage(dir.path()));
        assert_eq!(service.registry().len(), 1);
        assert_eq!(
            service.list_reservations("10.0.0.0/24").unwrap(),
            vec![ip("10.0.0.1")]
        );

        // the next rewrite replaces the stale temp file
        service.release(ReleaseRequest::new("10.0.0.1/24")).unwrap();
        assert!(!dir.path().join("10.0.0.0#24.tmp").exists());
    }

    #[test]
    fn test_archived_subnet_is_not_resurrected() {
        let dir = TempDir::new().unwrap();
        let service = boot(storage(dir.path()));
        service
            .register_subnet(RegisterSubnetRequest::new("10.0.0.0/24"))
            .unwrap();
        allocate(&service, "10.0.0.0/24");
        service.remove_subnet("10.0.0.0/24").unwrap();
        drop(service);

        assert!(dir.path().join("10.0.0.0#24.removed").is_file());
        let service = boot(storage(dir.path()));
        assert!(service.registry().is_empty());
    }

    #[test]
    fn test_deleted_subnet_is_not_resurrected() {
        let dir = TempDir::new().unwrap();
        let config = storage(dir.path()).with_removal_policy(RemovalPolicy::Delete);
        let service = boot(config.clone());
        service
            .register_subnet(RegisterSubnetRequest::new("10.0.0.0/24"))
            .unwrap();
        service.remove_subnet("10.0.0.0/24").unwrap();
        drop(service);

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        let service = boot(config);
        assert!(service.registry().is_empty());
    }

    #[test]
    fn test_ipv6_subnet_header_survives_restart() {
        let dir = TempDir::new().unwrap();
        let service = boot(storage(dir.path()));
        service
            .register_subnet(RegisterSubnetRequest::new("fd00:10::/120").with_gateway(ip("fd00:10::1")))
            .unwrap();
        assert_eq!(allocate(&service, "fd00:10::/120"), ip("fd00:10::1"));
        drop(service);

        // only IPv4 reservations are read back
        let service = boot(storage(dir.path()));
        let view = service.get_subnet("fd00:10::/120").unwrap();
        assert_eq!(view.gateway, Some(ip("fd00:10::1")));
        assert!(view.ips.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_release_with_unreadable_data_dir_matches_disk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let service = boot(storage(dir.path()));
        service
            .register_subnet(RegisterSubnetRequest::new("10.0.0.0/24"))
            .unwrap();
        assert_eq!(allocate(&service, "10.0.0.0/24"), ip("10.0.0.1"));

        // files can still be created and renamed, the directory cannot be
        // opened for its sync
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o300)).unwrap();
        let result = service.release(ReleaseRequest::new("10.0.0.1/24"));
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700)).unwrap();

        assert!(result.is_ok(), "{:?}", result);
        let in_memory = service.list_reservations("10.0.0.0/24").unwrap();
        assert!(in_memory.is_empty());
        drop(service);

        let service = boot(storage(dir.path()));
        assert_eq!(service.list_reservations("10.0.0.0/24").unwrap(), in_memory);
    }
}
