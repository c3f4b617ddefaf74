//! Lock-free free-list core for the fixed-block pool.
//!
//! # Safety
//!
//! This module implements the shared state behind every copy of a
//! [`PoolAllocator`](super::PoolAllocator):
//! - One contiguous storage buffer of `NBLOCK * size_of::<T>()` bytes,
//!   allocated when the core is built and freed in `Drop`
//! - A parallel slot array forming an intrusive free list of block indices
//! - A single packed `{tag, index}` head word, mutated only by
//!   compare-exchange
//!
//! ## Memory Safety
//!
//! - **Allocation**: a successful pop CAS transfers exclusive ownership of
//!   the popped block to the caller; no two live pointers ever alias
//! - **Deallocation**: the push CAS releases the block with `Release`
//!   ordering, so the next owner's `Acquire` pop observes every write the
//!   previous owner made
//! - **ABA**: the head tag increments on every successful update, so a CAS
//!   armed with a stale `{index, next}` observation cannot succeed after the
//!   slot has been popped and pushed back in between
//! - **Reclamation**: blocks are never returned to the system individually;
//!   the whole buffer lives until the core drops

use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};
use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};

#[cfg(not(loom))]
use crossbeam_utils::Backoff;

use super::PoolConfig;
use crate::error::{AllocError, AllocResult};
#[cfg(feature = "stats")]
use crate::stats::PoolStats;
use crate::sync::{AtomicU32, AtomicU64, Ordering};

/// End-of-list sentinel for slot indices.
const NIL: u32 = u32::MAX;

/// One free-list entry: the index of the next free slot, or [`NIL`].
///
/// A slot's storage address is computed from its index, so the next link is
/// the only state a slot carries. The link is written only while the slot is
/// off the list (during initialization or by the deallocating owner), and
/// published by the release CAS that pushes the slot.
struct Slot {
    next: AtomicU32,
}

#[inline(always)]
fn pack(index: u32, tag: u32) -> u64 {
    (u64::from(tag) << 32) | u64::from(index)
}

#[inline(always)]
fn head_index(word: u64) -> u32 {
    word as u32
}

#[inline(always)]
fn head_tag(word: u64) -> u32 {
    (word >> 32) as u32
}

/// Shared core: backing buffer, slot array and free-list head.
pub(super) struct PoolCore<T, const NBLOCK: usize> {
    /// Packed `{tag, index}` head of the free list.
    head: AtomicU64,
    /// Free-list entries, one per block.
    slots: Box<[Slot]>,
    /// Base of the block storage, `NBLOCK * size_of::<T>()` bytes.
    storage: NonNull<u8>,
    config: PoolConfig,
    #[cfg(feature = "stats")]
    stats: PoolStats,
    _marker: PhantomData<T>,
}

impl<T, const NBLOCK: usize> PoolCore<T, NBLOCK> {
    fn storage_layout() -> Layout {
        Layout::array::<T>(NBLOCK).expect("pool storage exceeds isize::MAX bytes")
    }

    /// Builds the core, reporting storage-acquisition failure.
    pub(super) fn try_new(config: PoolConfig) -> AllocResult<Self> {
        const {
            assert!(NBLOCK > 0, "pool capacity must be non-zero");
            assert!(NBLOCK < u32::MAX as usize, "pool capacity must fit a u32 index");
            assert!(mem::size_of::<T>() > 0, "zero-sized block types are not supported");
        }

        let layout = Self::storage_layout();
        // SAFETY: layout has non-zero size (NBLOCK > 0 and size_of::<T>() > 0
        // are asserted above) and the alignment of T.
        let raw = unsafe { alloc(layout) };
        let storage = NonNull::new(raw)
            .ok_or_else(|| AllocError::allocation_failed(layout.size(), layout.align()))?;

        // Link slot i to slot i + 1; the last slot terminates the list.
        let slots: Box<[Slot]> = (0..NBLOCK as u32)
            .map(|i| Slot {
                next: AtomicU32::new(if i + 1 < NBLOCK as u32 { i + 1 } else { NIL }),
            })
            .collect();

        #[cfg(feature = "logging")]
        tracing::debug!(
            blocks = NBLOCK,
            block_size = mem::size_of::<T>(),
            "pool core initialized"
        );

        Ok(Self {
            head: AtomicU64::new(pack(0, 0)),
            slots,
            storage,
            config,
            #[cfg(feature = "stats")]
            stats: PoolStats::new(),
            _marker: PhantomData,
        })
    }

    /// Infallible construction path; storage-acquisition failure takes the
    /// same route as a failed global allocation.
    pub(super) fn new(config: PoolConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|_| handle_alloc_error(Self::storage_layout()))
    }

    /// Pops one free block off the list, or returns `None` when exhausted.
    ///
    /// The returned storage is uninitialized (or holds the configured debug
    /// fill pattern); the caller must construct into it before reading.
    pub(super) fn allocate(&self) -> Option<NonNull<T>> {
        #[cfg(not(loom))]
        let backoff = Backoff::new();

        let mut observed = self.head.load(Ordering::Acquire);
        loop {
            let index = head_index(observed);
            if index == NIL {
                #[cfg(feature = "stats")]
                if self.config.track_stats {
                    self.stats.record_failed_alloc();
                }
                return None;
            }

            // While `index` sits at an unchanged head, nobody writes its
            // next link; the Acquire on `observed` synchronized with the
            // release push that published it.
            let next = self.slots[index as usize].next.load(Ordering::Relaxed);
            let replacement = pack(next, head_tag(observed).wrapping_add(1));

            match self.head.compare_exchange_weak(
                observed,
                replacement,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let block = self.block_at(index);
                    if let Some(pattern) = self.config.alloc_pattern {
                        // SAFETY: the successful CAS above removed `index`
                        // from the list, so this thread owns the block
                        // exclusively until it is deallocated.
                        unsafe {
                            ptr::write_bytes(
                                block.as_ptr().cast::<u8>(),
                                pattern,
                                mem::size_of::<T>(),
                            );
                        }
                    }
                    #[cfg(feature = "stats")]
                    if self.config.track_stats {
                        self.stats.record_alloc();
                    }
                    return Some(block);
                }
                Err(actual) => {
                    observed = actual;
                    #[cfg(not(loom))]
                    if self.config.use_backoff {
                        backoff.spin();
                    }
                }
            }
        }
    }

    /// Pushes the block holding `block_ptr` back onto the free list.
    ///
    /// # Safety
    ///
    /// `block_ptr` must be null (a no-op) or a pointer previously returned
    /// by [`allocate`](Self::allocate) on this core that has not been
    /// deallocated since. Exactly one thread may deallocate a given pointer.
    pub(super) unsafe fn deallocate(&self, block_ptr: *mut T) {
        if block_ptr.is_null() {
            return;
        }

        let base = self.storage.as_ptr() as usize;
        let addr = block_ptr as usize;
        debug_assert!(
            addr >= base && addr < base + NBLOCK * mem::size_of::<T>(),
            "deallocated pointer does not belong to this pool"
        );
        debug_assert_eq!(
            (addr - base) % mem::size_of::<T>(),
            0,
            "deallocated pointer is not a block boundary"
        );
        let index = ((addr - base) / mem::size_of::<T>()) as u32;

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: per this function's contract the caller still owns the
            // block; it becomes shared only once the CAS below publishes it.
            unsafe {
                ptr::write_bytes(block_ptr.cast::<u8>(), pattern, mem::size_of::<T>());
            }
        }

        #[cfg(not(loom))]
        let backoff = Backoff::new();

        let slot = &self.slots[index as usize];
        let mut observed = self.head.load(Ordering::Relaxed);
        loop {
            // The link write is Relaxed: the Release CAS below publishes it
            // together with the caller's block contents.
            slot.next.store(head_index(observed), Ordering::Relaxed);
            let replacement = pack(index, head_tag(observed).wrapping_add(1));

            match self.head.compare_exchange_weak(
                observed,
                replacement,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    #[cfg(feature = "stats")]
                    if self.config.track_stats {
                        self.stats.record_dealloc();
                    }
                    return;
                }
                Err(actual) => {
                    observed = actual;
                    #[cfg(not(loom))]
                    if self.config.use_backoff {
                        backoff.spin();
                    }
                }
            }
        }
    }

    #[cfg(feature = "stats")]
    pub(super) fn stats(&self) -> &PoolStats {
        &self.stats
    }

    #[inline]
    fn block_at(&self, index: u32) -> NonNull<T> {
        debug_assert!((index as usize) < NBLOCK);
        // SAFETY: index < NBLOCK, so the offset stays inside the storage
        // buffer allocated with Layout::array::<T>(NBLOCK).
        unsafe { NonNull::new_unchecked(self.storage.as_ptr().cast::<T>().add(index as usize)) }
    }
}

impl<T, const NBLOCK: usize> Drop for PoolCore<T, NBLOCK> {
    fn drop(&mut self) {
        // SAFETY: `storage` was allocated in `try_new` with exactly this
        // layout, and Drop runs once, after the last handle released the
        // core. Values the caller constructed into blocks are not dropped
        // here; block lifetime management belongs to the caller.
        unsafe {
            dealloc(self.storage.as_ptr(), Self::storage_layout());
        }
    }
}

// SAFETY: PoolCore is Send if T is Send.
// - The core exclusively owns its storage and slot array
// - Blocks may carry T values across threads (allocate on one thread,
//   deallocate on another), which is exactly what T: Send permits
unsafe impl<T: Send, const NBLOCK: usize> Send for PoolCore<T, NBLOCK> {}

// SAFETY: PoolCore is Sync if T is Send.
// - All shared mutation goes through the atomic head and slot words
// - A block is reachable from at most one owner at a time: the pop CAS
//   transfers it out of the shared structure, the push CAS transfers it back
// - Release-on-push / Acquire-on-pop pairs order block contents across
//   ownership transfers
unsafe impl<T: Send, const NBLOCK: usize> Sync for PoolCore<T, NBLOCK> {}
