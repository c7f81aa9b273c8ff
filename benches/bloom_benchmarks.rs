use criterion::{
    BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main,
};
use rand::Rng;
use rotating_bloom_rs::{
    BloomFilter, FilterOps, InMemoryBitmap, NewFilterFn, Rotator,
    RotatorConfig, optimal_bits, optimal_hashes,
};
use std::{sync::Arc, time::Duration};

fn generate_test_data(count: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| (0..32).map(|_| rng.random::<u8>()).collect())
        .collect()
}

fn create_filter(capacity: u64) -> BloomFilter {
    let bits = optimal_bits(capacity, 0.01);
    let hashes = optimal_hashes(capacity, bits);
    BloomFilter::new(Box::new(InMemoryBitmap::new(bits)), bits, hashes)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_operations");

    for capacity in [100u64, 1_000, 10_000] {
        let test_data = generate_test_data(capacity as usize);

        group.bench_with_input(
            BenchmarkId::new("inmemory", capacity),
            &test_data,
            |b, data| {
                b.iter_batched(
                    || create_filter(capacity),
                    |filter| {
                        for item in data {
                            filter.add(item).unwrap();
                        }
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_operations");

    for capacity in [100u64, 1_000, 10_000] {
        let test_data = generate_test_data(capacity as usize);
        let filter = create_filter(capacity);
        for item in &test_data {
            filter.add(item).unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("inmemory", capacity),
            &test_data,
            |b, data| {
                b.iter(|| {
                    for item in data {
                        assert!(filter.exist(item).unwrap());
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_rotator_add(c: &mut Criterion) {
    let new_filter: NewFilterFn = Arc::new(|_| {
        Ok(Box::new(create_filter(10_000)) as Box<dyn rotating_bloom_rs::Filter>)
    });
    let rotator = Rotator::new(
        RotatorConfig {
            enabled: true,
            period: Duration::from_secs(3600),
            grace_period: Duration::from_secs(60),
            ..RotatorConfig::default()
        },
        new_filter,
    )
    .expect("Failed to create rotator");

    let test_data = generate_test_data(1_000);
    c.bench_function("rotator_dual_write", |b| {
        b.iter(|| {
            for item in &test_data {
                rotator.add(item).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_insert, bench_query, bench_rotator_add);
criterion_main!(benches);
