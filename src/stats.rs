//! Atomic allocation counters.
//!
//! Counters are recorded only when the owning allocator's config sets
//! `track_stats`; reading them is always allowed. All counters are
//! monotonic except the derived "in use" values.

use crate::sync::{AtomicU64, Ordering};

/// Counters for a pool allocator core.
#[derive(Debug)]
pub struct PoolStats {
    allocs: AtomicU64,
    failed_allocs: AtomicU64,
    deallocs: AtomicU64,
}

impl PoolStats {
    pub(crate) fn new() -> Self {
        Self {
            allocs: AtomicU64::new(0),
            failed_allocs: AtomicU64::new(0),
            deallocs: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_alloc(&self) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_alloc(&self) {
        self.failed_allocs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dealloc(&self) {
        self.deallocs.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful allocations since the core was built.
    pub fn allocs(&self) -> u64 {
        self.allocs.load(Ordering::Relaxed)
    }

    /// Allocations that found the free list exhausted.
    pub fn failed_allocs(&self) -> u64 {
        self.failed_allocs.load(Ordering::Relaxed)
    }

    /// Deallocations since the core was built.
    pub fn deallocs(&self) -> u64 {
        self.deallocs.load(Ordering::Relaxed)
    }

    /// Blocks currently handed out.
    pub fn in_use(&self) -> u64 {
        self.allocs().saturating_sub(self.deallocs())
    }
}

/// Counters for an arena allocator core.
#[derive(Debug)]
pub struct ArenaStats {
    allocs: AtomicU64,
    failed_allocs: AtomicU64,
    bytes_allocated: AtomicU64,
}

impl ArenaStats {
    pub(crate) fn new() -> Self {
        Self {
            allocs: AtomicU64::new(0),
            failed_allocs: AtomicU64::new(0),
            bytes_allocated: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_alloc(&self, size: usize) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_alloc(&self) {
        self.failed_allocs.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful allocations since the core was built.
    pub fn allocs(&self) -> u64 {
        self.allocs.load(Ordering::Relaxed)
    }

    /// Allocations rejected for insufficient remaining capacity.
    pub fn failed_allocs(&self) -> u64 {
        self.failed_allocs.load(Ordering::Relaxed)
    }

    /// Total bytes handed out, excluding alignment padding.
    pub fn bytes_allocated(&self) -> u64 {
        self.bytes_allocated.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_counters() {
        let stats = PoolStats::new();
        stats.record_alloc();
        stats.record_alloc();
        stats.record_dealloc();
        stats.record_failed_alloc();

        assert_eq!(stats.allocs(), 2);
        assert_eq!(stats.deallocs(), 1);
        assert_eq!(stats.failed_allocs(), 1);
        assert_eq!(stats.in_use(), 1);
    }

    #[test]
    fn arena_counters() {
        let stats = ArenaStats::new();
        stats.record_alloc(16);
        stats.record_alloc(8);
        stats.record_failed_alloc();

        assert_eq!(stats.allocs(), 2);
        assert_eq!(stats.bytes_allocated(), 24);
        assert_eq!(stats.failed_allocs(), 1);
    }
}
