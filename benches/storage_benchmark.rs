use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use readlog::{Span, TimeIndexedStore};
use std::hint::black_box;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()
}

fn populated(size: i64) -> TimeIndexedStore {
    let store = TimeIndexedStore::new();
    // Interleave timestamps so inserts do not arrive in time order.
    for i in 0..size {
        let offset = (i * 7919) % size;
        store.remember(base() + Duration::minutes(offset), format!("k{}", i), format!("payload {}", i));
    }
    store
}

fn storage_benchmarks(c: &mut Criterion) {
    // Benchmark: Remember single record
    c.bench_function("remember_single", |b| {
        let store = TimeIndexedStore::new();
        let mut i = 0i64;
        b.iter(|| {
            i += 1;
            store.remember(base() + Duration::seconds(i % 10_000), black_box("key"), "payload");
        });
    });

    // Benchmark: Remember into stores of different sizes
    let mut group = c.benchmark_group("remember_into");
    for size in [100i64, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let store = populated(size);
            let mut i = 0i64;
            b.iter(|| {
                i += 1;
                store.remember(
                    base() + Duration::minutes(i % size),
                    format!("k{}", i % size),
                    "overwritten",
                );
            });
        });
    }
    group.finish();

    // Benchmark: Period query over different store sizes
    let mut group = c.benchmark_group("get_in_period");
    for size in [100i64, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let store = populated(size);
            let span = Span::new(base() + Duration::minutes(size / 2), Duration::minutes(60));
            b.iter(|| black_box(store.get_in_period(black_box(&span))));
        });
    }
    group.finish();

    // Benchmark: Forget and remember again
    c.bench_function("forget_and_remember_1000", |b| {
        let store = populated(1_000);
        let mut i = 0i64;
        b.iter(|| {
            i += 1;
            let key = format!("k{}", i % 1_000);
            store.forget(&key);
            store.remember(base() + Duration::minutes(i % 1_000), key, "again");
        });
    });
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
