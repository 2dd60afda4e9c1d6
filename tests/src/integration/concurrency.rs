//! # Concurrent Transactions
//!
//! Transactions on one subnet key are serialised by its registry entry;
//! different keys proceed independently.
//!
//! ## Properties Tested:
//!
//! 1. Concurrent allocations on one subnet never hand out an address twice
//! 2. Mixed allocate/release across subnets leaves disk and memory in agreement
//! 3. Racing registrations of one key produce exactly one subnet
//! 4. Allocations racing a removal either commit before it or see `SubnetNotFound`

#[cfg(test)]
mod tests {
    use ipam_allocator::{
        AllocateRequest, AllocationApi, ErrorKind, FileSubnetStore, IpamService,
        RegisterSubnetRequest, ReleaseRequest, StorageConfig, SubnetAdminApi, SubnetStore,
    };
    use rand::Rng;
    use std::collections::HashSet;
    use std::net::IpAddr;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn boot(dir: &TempDir) -> Arc<IpamService<FileSubnetStore>> {
        let config = StorageConfig::new()
            .with_data_dir(dir.path())
            .with_sync_appends(false);
        let store = FileSubnetStore::open(&config).unwrap();
        Arc::new(IpamService::bootstrap(store, config).unwrap())
    }

    // =============================================================================
    // PROPERTIES
    // =============================================================================

    #[test]
    fn test_concurrent_allocations_on_one_subnet_are_distinct() {
        let dir = TempDir::new().unwrap();
        let service = boot(&dir);
        service
            .register_subnet(RegisterSubnetRequest::new("10.0.0.0/22"))
            .unwrap();

        let allocated: Vec<IpAddr> = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let service = Arc::clone(&service);
                    scope.spawn(move || {
                        (0..50)
                            .map(|_| {
                                service
                                    .allocate(AllocateRequest::next("10.0.0.0/22"))
                                    .unwrap()
                                    .ip
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let unique: HashSet<IpAddr> = allocated.iter().copied().collect();
        assert_eq!(unique.len(), 800);

        let reloaded = service.store().load_all().unwrap();
        let handle = reloaded.get(&"10.0.0.0/22".parse().unwrap()).unwrap();
        let on_disk: HashSet<IpAddr> = handle.lock().reserved_sorted().into_iter().collect();
        assert_eq!(on_disk, unique);
    }

    #[test]
    fn test_mixed_traffic_keeps_disk_and_memory_in_agreement() {
        let dir = TempDir::new().unwrap();
        let service = boot(&dir);
        let subnets = ["172.16.0.0/24", "172.16.1.0/24", "172.16.2.0/24", "172.16.3.0/24"];
        for subnet in subnets {
            service
                .register_subnet(RegisterSubnetRequest::new(subnet))
                .unwrap();
        }

        thread::scope(|scope| {
            for subnet in subnets.iter().cycle().take(8) {
                let service = Arc::clone(&service);
                scope.spawn(move || {
                    let mut rng = rand::thread_rng();
                    let mut mine = Vec::new();
                    for _ in 0..60 {
                        if !mine.is_empty() && rng.gen_bool(0.3) {
                            let address: IpAddr = mine.swap_remove(rng.gen_range(0..mine.len()));
                            service
                                .release(ReleaseRequest::new(format!("{}/24", address)))
                                .unwrap();
                        } else {
                            let reservation = service
                                .allocate(AllocateRequest::next(*subnet))
                                .unwrap();
                            mine.push(reservation.ip);
                        }
                    }
                });
            }
        });

        let reloaded = boot(&dir);
        for subnet in subnets {
            assert_eq!(
                reloaded.list_reservations(subnet).unwrap(),
                service.list_reservations(subnet).unwrap(),
                "{} differs after restart",
                subnet
            );
        }
    }

    #[test]
    fn test_racing_registrations_produce_one_subnet() {
        let dir = TempDir::new().unwrap();
        let service = boot(&dir);

        let outcomes: Vec<Result<(), ErrorKind>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let service = Arc::clone(&service);
                    scope.spawn(move || {
                        service
                            .register_subnet(RegisterSubnetRequest::new("10.5.0.0/24"))
                            .map(|_| ())
                            .map_err(|e| e.kind())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .filter_map(|o| o.err())
            .all(|kind| kind == ErrorKind::AlreadyExists));
        assert_eq!(service.registry().len(), 1);
    }

    #[test]
    fn test_allocations_racing_removal() {
        let dir = TempDir::new().unwrap();
        let service = boot(&dir);
        service
            .register_subnet(RegisterSubnetRequest::new("10.9.0.0/24"))
            .unwrap();

        let committed: Vec<IpAddr> = thread::scope(|scope| {
            let allocators = (0..4)
                .map(|_| {
                    let service = Arc::clone(&service);
                    scope.spawn(move || {
                        let mut committed = Vec::new();
                        for _ in 0..40 {
                            match service.allocate(AllocateRequest::next("10.9.0.0/24")) {
                                Ok(reservation) => committed.push(reservation.ip),
                                Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
                            }
                        }
                        committed
                    })
                });
            let allocators: Vec<_> = allocators.collect();

            let remover = Arc::clone(&service);
            scope.spawn(move || remover.remove_subnet("10.9.0.0/24").unwrap());

            allocators
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        assert!(!service.registry().has(&"10.9.0.0/24".parse().unwrap()));

        // everything committed before the removal went into the archive
        let archived = std::fs::read_to_string(dir.path().join("10.9.0.0#24.removed")).unwrap();
        let archived: HashSet<&str> = archived.lines().map(str::trim).collect();
        for address in committed {
            assert!(archived.contains(address.to_string().as_str()));
        }
    }
}
