use std::net::Ipv4Addr;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use bart_store::{Prefix, Table};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TABLE_SIZE: usize = 100_000;

fn random_pfxs(count: usize, seed: u64) -> Vec<Prefix> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len: u8 = rng.random_range(8..=28);
            let bits = rng.random::<u32>() & (!0_u32 << (32 - len));
            Prefix::new(Ipv4Addr::from(bits).into(), len).unwrap()
        })
        .collect()
}

fn full_table(pfxs: &[Prefix]) -> Table<u32> {
    let mut table = Table::new();
    for (i, p) in pfxs.iter().enumerate() {
        table.insert(p, i as u32);
    }
    table
}

fn bench_insert(c: &mut Criterion) {
    let pfxs = random_pfxs(TABLE_SIZE, 1);

    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(TABLE_SIZE as u64));
    group.sample_size(20);
    group.bench_function("random_pfxs", |b| {
        b.iter(|| full_table(&pfxs))
    });
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let table = full_table(&random_pfxs(TABLE_SIZE, 1));
    let mut rng = StdRng::seed_from_u64(2);
    let addrs: Vec<std::net::IpAddr> = (0..1024)
        .map(|_| Ipv4Addr::from(rng.random::<u32>()).into())
        .collect();

    let mut group = c.benchmark_group("query");
    group.throughput(Throughput::Elements(addrs.len() as u64));
    group.bench_function("lookup", |b| {
        b.iter(|| {
            addrs
                .iter()
                .filter(|addr| table.lookup(**addr).is_some())
                .count()
        })
    });
    group.bench_function("contains", |b| {
        b.iter(|| {
            addrs.iter().filter(|addr| table.contains(**addr)).count()
        })
    });
    group.finish();
}

fn bench_persist(c: &mut Criterion) {
    let table = full_table(&random_pfxs(TABLE_SIZE, 1));
    let fresh = random_pfxs(1024, 3);

    let mut group = c.benchmark_group("persist");
    group.throughput(Throughput::Elements(fresh.len() as u64));
    group.sample_size(20);
    group.bench_function("insert_persist", |b| {
        b.iter(|| {
            let mut current = table.clone();
            for (i, p) in fresh.iter().enumerate() {
                current = current.insert_persist(p, i as u32).0;
            }
            current
        })
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_persist);
criterion_main!(benches);
