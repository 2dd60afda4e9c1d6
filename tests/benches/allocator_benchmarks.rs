//! # IPAM Allocator Benchmarks
//!
//! | Operation | Expectation |
//! |-----------|-------------|
//! | NextFree, empty /16 | constant, one step past the cursor |
//! | NextFree, nearly full /16 | linear in the range, single cycle |
//! | allocate + release through the service | dominated by the store write |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ipam_allocator::{
    AllocateRequest, AllocationApi, InMemorySubnetStore, IpamService, RegisterSubnetRequest,
    ReleaseRequest, StorageConfig, SubnetDefinition, SubnetKey, SubnetAdminApi, SubnetRegistry,
    Subnetwork,
};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

fn subnetwork(cidr: &str) -> Subnetwork {
    let key: SubnetKey = cidr.parse().expect("valid cidr");
    Subnetwork::new(SubnetDefinition::new(key)).expect("usable subnet")
}

/// A /16 with every usable address reserved except `free`, cursor at the
/// top of the range so the search wraps and walks up to `free`.
fn nearly_full_slash16(free: Ipv4Addr) -> Subnetwork {
    let mut subnet = subnetwork("10.0.0.0/16");
    let base = u32::from(Ipv4Addr::new(10, 0, 0, 0));
    for offset in 0..0xFFFF_u32 {
        let address = Ipv4Addr::from(base + offset);
        if address != free {
            subnet
                .reserve(Some(IpAddr::V4(address)))
                .expect("address inside subnet");
        }
    }
    subnet
}

fn bench_next_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("ipam-next-free");
    group.measurement_time(Duration::from_secs(10));

    let empty = subnetwork("10.0.0.0/16");
    group.bench_function("empty_slash16", |b| {
        b.iter(|| black_box(empty.next_free().expect("free address")))
    });

    for free in [
        Ipv4Addr::new(10, 0, 0, 200),
        Ipv4Addr::new(10, 0, 128, 0),
        Ipv4Addr::new(10, 0, 255, 200),
    ] {
        let subnet = nearly_full_slash16(free);
        group.bench_with_input(
            BenchmarkId::new("nearly_full_slash16", free),
            &subnet,
            |b, subnet| b.iter(|| black_box(subnet.next_free().expect("one free address"))),
        );
    }

    group.finish();
}

fn bench_service_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ipam-service");

    let service = IpamService::new(
        InMemorySubnetStore::new(),
        SubnetRegistry::new(),
        StorageConfig::default(),
    );
    service
        .register_subnet(RegisterSubnetRequest::new("10.1.0.0/16"))
        .expect("registered");

    group.bench_function("allocate_release", |b| {
        b.iter(|| {
            let reservation = service
                .allocate(AllocateRequest::next("10.1.0.0/16"))
                .expect("allocated");
            service
                .release(ReleaseRequest::new(format!("{}/16", reservation.ip)))
                .expect("released");
        })
    });

    group.finish();
}

criterion_group!(benches, bench_next_free, bench_service_round_trip);
criterion_main!(benches);
