//! Lock-free bump core for the fixed-capacity arena.
//!
//! # Safety
//!
//! This module implements the shared state behind every copy of an
//! [`ArenaAllocator`](super::ArenaAllocator):
//! - One contiguous `SIZE`-byte buffer, cache-line aligned, allocated when
//!   the core is built and freed in `Drop`
//! - An atomic byte-offset cursor that only ever advances
//!
//! ## Memory Safety
//!
//! - **Allocation**: a successful cursor CAS grants the caller exclusive
//!   ownership of `[aligned_pos, aligned_pos + size)`; concurrent callers
//!   can never receive overlapping ranges
//! - **Alignment**: the requested alignment is applied to the absolute
//!   address, so returned pointers are never under-aligned regardless of
//!   how the buffer itself is aligned
//! - **Bounds**: capacity checks are phrased as subtractions and the
//!   round-up uses a checked add, so no comparison can wrap past the end of
//!   the buffer
//! - **Reclamation**: nothing is freed until the core drops; per-allocation
//!   deallocation is a documented no-op

use core::ptr::{self, NonNull};
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};

#[cfg(not(loom))]
use crossbeam_utils::Backoff;

use super::ArenaConfig;
use crate::error::{AllocError, AllocResult};
#[cfg(feature = "stats")]
use crate::stats::ArenaStats;
use crate::sync::{AtomicUsize, Ordering};
use crate::utils::{CACHE_LINE, checked_align_up};

/// Shared core: backing buffer and bump cursor.
pub(super) struct ArenaCore<const SIZE: usize> {
    buf: NonNull<u8>,
    /// Next unallocated byte offset; `0 <= cursor <= SIZE`, monotonic.
    cursor: AtomicUsize,
    config: ArenaConfig,
    #[cfg(feature = "stats")]
    stats: ArenaStats,
}

impl<const SIZE: usize> ArenaCore<SIZE> {
    fn buffer_layout() -> Layout {
        Layout::from_size_align(SIZE, CACHE_LINE).expect("arena size exceeds isize::MAX bytes")
    }

    /// Builds the core, reporting storage-acquisition failure.
    pub(super) fn try_new(config: ArenaConfig) -> AllocResult<Self> {
        const {
            assert!(SIZE > 0, "arena capacity must be non-zero");
        }

        let layout = Self::buffer_layout();
        // SAFETY: layout has non-zero size (SIZE > 0 asserted above) and
        // CACHE_LINE alignment.
        let raw = unsafe { alloc(layout) };
        let buf = NonNull::new(raw)
            .ok_or_else(|| AllocError::allocation_failed(layout.size(), layout.align()))?;

        if config.zero_memory {
            // SAFETY: freshly allocated SIZE bytes, exclusively owned until
            // this constructor returns.
            unsafe {
                ptr::write_bytes(buf.as_ptr(), 0, SIZE);
            }
        }

        #[cfg(feature = "logging")]
        tracing::debug!(capacity = SIZE, "arena core initialized");

        Ok(Self {
            buf,
            cursor: AtomicUsize::new(0),
            config,
            #[cfg(feature = "stats")]
            stats: ArenaStats::new(),
        })
    }

    /// Infallible construction path; storage-acquisition failure takes the
    /// same route as a failed global allocation.
    pub(super) fn new(config: ArenaConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|_| handle_alloc_error(Self::buffer_layout()))
    }

    /// Bumps the cursor past an aligned range of `layout.size()` bytes, or
    /// returns `None` when the remaining capacity cannot fit it.
    ///
    /// `layout.size()` must be non-zero (debug-asserted contract). A `None`
    /// return leaves the cursor untouched.
    pub(super) fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let size = layout.size();
        let align = layout.align();
        debug_assert!(size > 0, "zero-size arena allocations violate the contract");

        let base = self.buf.as_ptr() as usize;

        #[cfg(not(loom))]
        let backoff = Backoff::new();

        let mut current = self.cursor.load(Ordering::Relaxed);
        loop {
            // Align the absolute address, then convert back to an offset.
            // The checked add keeps a pathological `align` from wrapping.
            let Some(aligned_addr) = checked_align_up(base + current, align) else {
                #[cfg(feature = "stats")]
                if self.config.track_stats {
                    self.stats.record_failed_alloc();
                }
                return None;
            };
            let aligned_pos = aligned_addr - base;

            // Subtraction form: neither comparison can overflow.
            if aligned_pos > SIZE || size > SIZE - aligned_pos {
                #[cfg(feature = "stats")]
                if self.config.track_stats {
                    self.stats.record_failed_alloc();
                }
                return None;
            }

            match self.cursor.compare_exchange_weak(
                current,
                aligned_pos + size,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    #[cfg(feature = "stats")]
                    if self.config.track_stats {
                        self.stats.record_alloc(size);
                    }
                    // SAFETY: aligned_pos + size <= SIZE, and the successful
                    // CAS granted exclusive ownership of that range.
                    return Some(unsafe {
                        NonNull::new_unchecked(self.buf.as_ptr().add(aligned_pos))
                    });
                }
                Err(actual) => {
                    current = actual;
                    #[cfg(not(loom))]
                    if self.config.use_backoff {
                        backoff.spin();
                    }
                }
            }
        }
    }

    /// Bytes consumed so far, alignment padding included.
    pub(super) fn used(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    #[cfg(feature = "stats")]
    pub(super) fn stats(&self) -> &ArenaStats {
        &self.stats
    }
}

impl<const SIZE: usize> Drop for ArenaCore<SIZE> {
    fn drop(&mut self) {
        // SAFETY: `buf` was allocated in `try_new` with exactly this layout,
        // and Drop runs once, after the last handle released the core.
        unsafe {
            dealloc(self.buf.as_ptr(), Self::buffer_layout());
        }
    }
}

// SAFETY: ArenaCore is Send.
// - buf points to untyped memory exclusively owned by the core
// - cursor is an atomic primitive; config and stats carry no thread affinity
unsafe impl<const SIZE: usize> Send for ArenaCore<SIZE> {}

// SAFETY: ArenaCore is Sync.
// - The only shared mutable state is the cursor, mutated exclusively by CAS
// - Each successful CAS hands out a disjoint range, so concurrent callers
//   never alias; buf and config are immutable after construction
unsafe impl<const SIZE: usize> Sync for ArenaCore<SIZE> {}
