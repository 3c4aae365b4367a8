use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use mesh_halo::algs::communicator::ThreadComm;
use mesh_halo::algs::decomposition::Decomposition;
use mesh_halo::algs::partition::{GlobalDomain, owner_of, partition_all};
use mesh_halo::config::DecompositionConfig;

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_all");
    for &p in &[4usize, 64, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(p), &p, |b, &p| {
            b.iter(|| partition_all(black_box(GlobalDomain::new(1_000_003)), p).unwrap())
        });
    }
    group.finish();

    c.bench_function("owner_of", |b| {
        let domain = GlobalDomain::new(1_000_003);
        b.iter(|| {
            (0..1_000_003)
                .step_by(997)
                .map(|g| owner_of(domain, 37, black_box(g)).unwrap())
                .sum::<usize>()
        })
    });
}

fn bench_exchange(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_exchange");
    for &hw in &[1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(hw), &hw, |b, &hw| {
            let cfg = DecompositionConfig {
                global_length: 4 * 4096,
                halo_width: hw,
                ..Default::default()
            };
            b.iter(|| {
                ThreadComm::run(4, |comm| {
                    let d = Decomposition::new(&comm, &cfg).unwrap();
                    let mut f = d.allocate_field::<f64>().unwrap();
                    f.fill_owned_with(|g| g as f64);
                    for _ in 0..16 {
                        d.exchange(&mut f).unwrap();
                    }
                    f.low_halo()[0]
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_partition, bench_exchange);
criterion_main!(benches);
