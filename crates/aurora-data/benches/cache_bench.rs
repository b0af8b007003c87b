use aurora_core::config::CacheLimits;
use aurora_core::resource::Disposable;
use aurora_data::LruCache;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Instant;

struct Handle(u32);

impl Disposable for Handle {
    fn dispose(&mut self) {
        black_box(self.0);
    }
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("LRU Cache");

    group.bench_function("Hot lookups (100 entries)", |b| {
        let mut cache = LruCache::new("bench", CacheLimits::new(100, usize::MAX));
        let now = Instant::now();
        for i in 0..100 {
            cache.set_at(format!("k{i}"), Handle(i), 1024, now);
        }
        let keys: Vec<String> = (0..100).map(|i| format!("k{i}")).collect();
        b.iter(|| {
            for key in &keys {
                black_box(cache.get_at(key, now).map(|h| h.0));
            }
        });
    });

    group.bench_function("Inserts under count pressure", |b| {
        let mut cache = LruCache::new("bench", CacheLimits::new(100, usize::MAX));
        let now = Instant::now();
        let mut i = 0u32;
        b.iter(|| {
            // Every insert past 100 evicts the least recently used entry.
            cache.set_at(format!("k{}", i % 400), Handle(i), 1024, now);
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("Inserts under byte pressure", |b| {
        let mut cache = LruCache::new("bench", CacheLimits::new(10_000, 64 * 1024));
        let now = Instant::now();
        let mut i = 0u32;
        b.iter(|| {
            cache.set_at(format!("k{i}"), Handle(i), 4096, now);
            i = i.wrapping_add(1);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cache);
criterion_main!(benches);
