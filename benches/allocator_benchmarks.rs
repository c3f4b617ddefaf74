//! Allocator benchmarks
//!
//! Compares the pool and arena against the system allocator across the
//! workloads they are built for.

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use fixed_alloc::arena::ArenaAllocator;
use fixed_alloc::pool::{PoolAllocator, PoolConfig};
use std::alloc::Layout;
use std::hint::black_box;

/// Benchmark single allocation/deallocation cycle
fn bench_single_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_allocation");

    // Pool allocator: steady-state block recycling
    group.bench_function("pool_8b", |b| {
        let pool = PoolAllocator::<u64, 1024>::with_config(PoolConfig::production());
        pool.try_init().unwrap();

        b.iter(|| {
            let block = pool.allocate().unwrap();
            // SAFETY: block came from allocate and is freed exactly once
            unsafe { pool.deallocate(block.as_ptr()) };
            black_box(block);
        });
    });

    // System allocator (baseline)
    group.bench_function("system_8b", |b| {
        let layout = Layout::new::<u64>();

        b.iter(|| unsafe {
            let ptr = std::alloc::alloc(layout);
            std::alloc::dealloc(ptr, layout);
            black_box(ptr);
        });
    });

    group.finish();
}

/// Benchmark batch allocations
fn bench_batch_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_allocations");
    group.throughput(Throughput::Elements(100));

    // Pool allocator
    group.bench_function("pool_100x8b", |b| {
        let pool = PoolAllocator::<u64, 1024>::with_config(PoolConfig::production());
        pool.try_init().unwrap();

        b.iter(|| {
            let blocks: Vec<_> = (0..100).map(|_| pool.allocate().unwrap()).collect();
            for block in blocks {
                // SAFETY: freed exactly once
                unsafe { pool.deallocate(block.as_ptr()) };
            }
        });
    });

    // Arena allocator: the arena never recycles, so each batch gets a
    // fresh arena outside the timing loop
    group.bench_function("arena_100x8b", |b| {
        let layout = Layout::from_size_align(8, 8).unwrap();

        b.iter_batched(
            || {
                let arena = ArenaAllocator::<4096>::new();
                arena.try_init().unwrap();
                arena
            },
            |arena| {
                for _ in 0..100 {
                    black_box(arena.allocate(layout).unwrap());
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark contended recycling: the pool's reason to exist
fn bench_contended_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_pool");
    group.sample_size(20);

    group.bench_function("pool_8threads_churn", |b| {
        let pool = PoolAllocator::<u64, 256>::with_config(PoolConfig::production());
        pool.try_init().unwrap();

        b.iter(|| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let pool = pool.clone();
                    std::thread::spawn(move || {
                        for _ in 0..1_000 {
                            let block = pool.allocate().unwrap();
                            // SAFETY: freed exactly once per iteration
                            unsafe { pool.deallocate(block.as_ptr()) };
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_allocation,
    bench_batch_allocations,
    bench_contended_pool
);

criterion_main!(benches);
