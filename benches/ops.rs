//! Micro-operation benchmarks for the stores and cache facades.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency for lookups through each layer (store,
//! manual cache, async value view, loading cache) and for bulk loads.

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use loadkit::builder::CacheBuilder;
use loadkit::loader::loader_fn;
use loadkit::map::ConcurrentMap;
use loadkit::pending::Pending;
use loadkit::store::ShardedHashMapStore;
use loadkit::traits::{Cache, LoadingCache};
use loadkit::view::AsyncValueView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ENTRIES: u64 = 16_384;
const OPS: u64 = 100_000;

// ============================================================================
// Get Hit Latency (ns/op)
// ============================================================================

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("store", |b| {
        let store: ShardedHashMapStore<u64, u64> = ShardedHashMapStore::new(16);
        for i in 0..ENTRIES {
            store.put(i, i);
        }
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(store.get(&(i % ENTRIES)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("manual_recording_stats", |b| {
        let cache = CacheBuilder::<u64, u64>::new().record_stats(true).build();
        cache.put_all((0..ENTRIES).map(|i| (i, i)));
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.get_if_present(&(i % ENTRIES)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("async_view", |b| {
        let store: Arc<ShardedHashMapStore<u64, Pending<u64>>> =
            Arc::new(ShardedHashMapStore::new(16));
        let view = AsyncValueView::new(store);
        for i in 0..ENTRIES {
            view.put(i, i);
        }
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(view.get(&(i % ENTRIES)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("loading", |b| {
        let cache = CacheBuilder::<u64, u64>::new().build_loading(loader_fn(|k: &u64| Ok(Some(*k))));
        b.iter_custom(|iters| {
            for i in 0..ENTRIES {
                let _ = cache.get(&i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.get(&(i % ENTRIES)).ok());
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Mixed Load Latency
// ============================================================================

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_ns");
    group.throughput(Throughput::Elements(OPS));

    // 80% hits on a warm key range, 20% loads of fresh keys.
    group.bench_function("loading_get", |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::ZERO;
            let mut rng = StdRng::seed_from_u64(42);
            for _ in 0..iters {
                let cache =
                    CacheBuilder::<u64, u64>::new().build_loading(loader_fn(|k: &u64| Ok(Some(*k))));
                for i in 0..ENTRIES {
                    let _ = cache.get(&i);
                }
                let start = Instant::now();
                for i in 0..OPS {
                    let key = if rng.gen_ratio(1, 5) {
                        ENTRIES + i
                    } else {
                        rng.gen_range(0..ENTRIES)
                    };
                    black_box(cache.get(&key).ok());
                }
                total += start.elapsed();
            }
            total
        })
    });

    group.bench_function("get_all_64", |b| {
        let cache = CacheBuilder::<u64, u64>::new().build_loading(loader_fn(|k: &u64| Ok(Some(*k))));
        let mut rng = StdRng::seed_from_u64(7);
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..OPS / 64 {
                    let keys: Vec<u64> = (0..64).map(|_| rng.gen_range(0..ENTRIES * 2)).collect();
                    black_box(cache.get_all(&keys).ok());
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_mixed);
criterion_main!(benches);
