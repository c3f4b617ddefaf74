//! Concurrency and contract tests for the bump arena allocator.

use fixed_alloc::arena::{ArenaAllocator, ArenaConfig};
use fixed_alloc::utils::is_aligned;
use std::alloc::Layout;
use std::sync::mpsc;
use std::thread;

fn layout(size: usize, align: usize) -> Layout {
    Layout::from_size_align(size, align).unwrap()
}

#[test]
fn sixteen_bytes_sixteen_grants_then_none() {
    let arena = ArenaAllocator::<16>::new();
    for _ in 0..16 {
        assert!(arena.allocate(layout(1, 1)).is_some());
    }
    assert!(arena.allocate(layout(1, 1)).is_none());
    assert_eq!(arena.used(), 16);
    assert_eq!(arena.remaining(), 0);
}

#[test]
fn alignment_scenario_1_4_8_on_sixteen_bytes() {
    let arena = ArenaAllocator::<16>::new();

    let p0 = arena.allocate(layout(1, 1)).unwrap().as_ptr() as usize;
    let p1 = arena.allocate(layout(4, 4)).unwrap().as_ptr() as usize;
    let p2 = arena.allocate(layout(8, 8)).unwrap().as_ptr() as usize;

    // The first align-1 grant starts at the buffer base.
    assert!(is_aligned(p1 - p0, 4));
    assert!(is_aligned(p2 - p0, 8));
    assert!(p2 + 8 - p0 <= 16);
    assert_eq!(arena.used(), 16);
}

#[test]
fn concurrent_grants_are_disjoint_and_aligned() {
    const SIZE: usize = 4096;
    const THREADS: usize = 8;
    const PER_THREAD: usize = 24;
    const SHAPES: [(usize, usize); 4] = [(1, 1), (4, 4), (8, 8), (16, 16)];

    let arena = ArenaAllocator::<SIZE>::new();
    let (tx, rx) = mpsc::channel::<(usize, usize)>();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let arena = arena.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    let (size, align) = SHAPES[fastrand::usize(..SHAPES.len())];
                    if let Some(p) = arena.allocate(layout(size, align)) {
                        let addr = p.as_ptr() as usize;
                        assert!(is_aligned(addr, align), "under-aligned grant");
                        tx.send((addr, size)).unwrap();
                    }
                }
            })
        })
        .collect();
    drop(tx);
    for handle in handles {
        handle.join().unwrap();
    }

    let mut ranges: Vec<(usize, usize)> = rx.into_iter().collect();
    ranges.sort_unstable_by_key(|&(addr, _)| addr);
    for pair in ranges.windows(2) {
        let (addr_a, size_a) = pair[0];
        let (addr_b, _) = pair[1];
        assert!(addr_a + size_a <= addr_b, "overlapping grants");
    }

    // Granted bytes plus padding never exceed the capacity.
    let granted: usize = ranges.iter().map(|&(_, size)| size).sum();
    assert!(granted <= arena.used());
    assert!(arena.used() <= SIZE);
}

#[test]
fn interleaved_char_int_long_values_survive() {
    // Port of the original harness: each thread interleaves 1-, 4- and
    // 8-byte grants and re-checks every value after the dust settles.
    const THREADS: usize = 8;
    const ROUNDS: u64 = 16;

    let arena = ArenaAllocator::<4096>::new();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let arena = arena.clone();
            thread::spawn(move || {
                let mut grants: Vec<(*mut u64, *mut u32, *mut u8, u64)> = Vec::new();
                for j in 0..ROUNDS {
                    let byte = arena.allocate(layout(1, 1)).unwrap().as_ptr();
                    let word = arena.allocate(layout(4, 4)).unwrap().as_ptr().cast::<u32>();
                    let long = arena.allocate(layout(8, 8)).unwrap().as_ptr().cast::<u64>();
                    // SAFETY: each range is exclusively ours and correctly
                    // aligned for the type written into it
                    unsafe {
                        long.write(j + 97);
                        word.write(4 + j as u32);
                        byte.write(b'c');
                        assert_eq!(byte.read(), b'c');
                        assert_eq!(word.read(), 4 + j as u32);
                        assert_eq!(long.read(), j + 97);
                    }
                    grants.push((long, word, byte, j));
                }
                for (long, word, byte, j) in grants {
                    // SAFETY: ranges stay valid and exclusively ours for the
                    // lifetime of the arena
                    unsafe {
                        assert_eq!(byte.read(), b'c');
                        assert_eq!(word.read(), 4 + j as u32);
                        assert_eq!(long.read(), j + 97);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn deallocate_is_a_no_op() {
    let arena = ArenaAllocator::<32>::new();
    let p = arena.allocate(layout(16, 1)).unwrap();
    arena.deallocate(p.as_ptr());
    arena.deallocate(std::ptr::null_mut());
    assert_eq!(arena.used(), 16, "deallocate must not reclaim arena bytes");
}

#[test]
fn zeroed_arena_hands_out_zeroed_ranges() {
    let config = ArenaConfig {
        zero_memory: true,
        ..ArenaConfig::production()
    };
    let arena = ArenaAllocator::<64>::with_config(config);
    let p = arena.allocate(layout(8, 8)).unwrap();
    // SAFETY: exclusively owned, aligned for u64
    let value = unsafe { p.as_ptr().cast::<u64>().read() };
    assert_eq!(value, 0);
}

#[test]
fn handles_racing_first_use_share_one_buffer() {
    const THREADS: usize = 8;

    let arena = ArenaAllocator::<256>::new();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let arena = arena.clone();
            thread::spawn(move || arena.allocate(layout(8, 1)).unwrap().as_ptr() as usize)
        })
        .collect();

    let mut addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    addrs.sort_unstable();
    addrs.dedup();

    // One shared core: eight distinct ranges out of one 256-byte buffer.
    assert_eq!(addrs.len(), THREADS);
    assert!(addrs[THREADS - 1] - addrs[0] < 256);
    assert_eq!(arena.used(), THREADS * 8);
}

#[cfg(feature = "stats")]
#[test]
fn stats_reflect_grants_and_misses() {
    let config = ArenaConfig {
        track_stats: true,
        ..ArenaConfig::production()
    };
    let arena = ArenaAllocator::<16>::with_config(config);
    assert!(arena.allocate(layout(12, 1)).is_some());
    assert!(arena.allocate(layout(12, 1)).is_none());

    let stats = arena.stats().expect("core was built");
    assert_eq!(stats.allocs(), 1);
    assert_eq!(stats.bytes_allocated(), 12);
    assert_eq!(stats.failed_allocs(), 1);
}
