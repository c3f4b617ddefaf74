//! Fixed-block pool allocator.
//!
//! [`PoolAllocator<T, NBLOCK>`] hands out uninitialized blocks of exactly
//! `size_of::<T>()` bytes from a buffer of `NBLOCK` blocks allocated once.
//! Free blocks are kept on a lock-free intrusive free list; `allocate` and
//! `deallocate` are CAS retry loops and never block.
//!
//! Handles are cheap to clone and all clones operate on one shared core,
//! built exactly once on first use. Two handles compare equal iff they share
//! a core, which is the condition under which a block allocated through one
//! may be deallocated through the other.
//!
//! # Example
//!
//! ```rust
//! use fixed_alloc::pool::PoolAllocator;
//!
//! let pool = PoolAllocator::<u64, 16>::new();
//! assert_eq!(pool.capacity(), 16);
//!
//! let block = pool.allocate().expect("pool has free blocks");
//! unsafe {
//!     block.as_ptr().write(7);
//!     assert_eq!(block.as_ptr().read(), 7);
//!     pool.deallocate(block.as_ptr());
//! }
//! ```

mod config;
mod core;

pub use config::PoolConfig;

use self::core::PoolCore;
use crate::error::AllocResult;
#[cfg(feature = "stats")]
use crate::stats::PoolStats;
use ::core::fmt;
use ::core::ptr::NonNull;
use std::sync::{Arc, OnceLock};

/// Thread-safe, fixed-capacity allocator of `size_of::<T>()`-sized blocks.
///
/// The handle is a small value: a shared reference to the (lazily built)
/// core plus a by-value config. Cloning it never copies the buffer.
///
/// # Contract
///
/// - [`allocate`](Self::allocate) returns **uninitialized** storage; construct
///   into it before reading
/// - a block must be deallocated through the handle it came from or one
///   comparing equal to it, at most once, by exactly one thread
/// - exhaustion is a `None` return, never an error or a blocking wait
pub struct PoolAllocator<T, const NBLOCK: usize> {
    shared: Arc<OnceLock<PoolCore<T, NBLOCK>>>,
    config: PoolConfig,
}

impl<T, const NBLOCK: usize> PoolAllocator<T, NBLOCK> {
    /// Creates a lazy handle with the default config.
    ///
    /// No memory is allocated until the first real use (or [`try_init`]).
    ///
    /// [`try_init`]: Self::try_init
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a lazy handle with a custom config.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(OnceLock::new()),
            config,
        }
    }

    /// Eagerly builds the shared core, reporting storage-acquisition
    /// failure.
    ///
    /// Idempotent and safe to race: if another handle builds the core first,
    /// this call succeeds without side effects. After `Ok(())`, `allocate`
    /// can no longer hit the hard-failure path.
    pub fn try_init(&self) -> AllocResult<()> {
        if self.shared.get().is_some() {
            return Ok(());
        }
        let core = PoolCore::try_new(self.config.clone())?;
        // Losing the publication race is fine; the winner's core is
        // equally valid and ours frees its buffer on drop.
        let _ = self.shared.set(core);
        Ok(())
    }

    /// Removes and returns one free block, or `None` when the pool is
    /// exhausted.
    ///
    /// The block is uninitialized. Lock-free: concurrent callers retry on
    /// CAS conflicts but never wait on each other.
    pub fn allocate(&self) -> Option<NonNull<T>> {
        self.core().allocate()
    }

    /// Returns a block to the pool. Null is a no-op.
    ///
    /// # Safety
    ///
    /// `block_ptr` must be null or a pointer obtained from
    /// [`allocate`](Self::allocate) on this handle (or one comparing equal
    /// to it) that has not been deallocated since. Double frees and foreign
    /// pointers are undefined behavior; they are `debug_assert!`ed but not
    /// detected in release builds. If `T` needs dropping, drop the value in
    /// place first; the pool recycles raw storage only.
    pub unsafe fn deallocate(&self, block_ptr: *mut T) {
        if block_ptr.is_null() {
            // Don't build a core just to ignore a null pointer.
            return;
        }
        // SAFETY: forwarded contract; a non-null pointer from this pool
        // implies the core exists already.
        unsafe { self.core().deallocate(block_ptr) }
    }

    /// Fixed maximum number of simultaneously live blocks.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        NBLOCK
    }

    /// Counters of the shared core, or `None` if it has not been built yet.
    #[cfg(feature = "stats")]
    #[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
    pub fn stats(&self) -> Option<&PoolStats> {
        self.shared.get().map(PoolCore::stats)
    }

    fn core(&self) -> &PoolCore<T, NBLOCK> {
        self.shared.get_or_init(|| PoolCore::new(self.config.clone()))
    }
}

impl<T, const NBLOCK: usize> Default for PoolAllocator<T, NBLOCK> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const NBLOCK: usize> Clone for PoolAllocator<T, NBLOCK> {
    /// Clones the handle, not the pool: both handles share one core.
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

impl<T, const NBLOCK: usize> PartialEq for PoolAllocator<T, NBLOCK> {
    /// Two handles are equal iff they operate on the same backing buffer,
    /// i.e. one descends from the other by cloning.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T, const NBLOCK: usize> Eq for PoolAllocator<T, NBLOCK> {}

impl<T, const NBLOCK: usize> fmt::Debug for PoolAllocator<T, NBLOCK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("capacity", &NBLOCK)
            .field("block_size", &::core::mem::size_of::<T>())
            .field("initialized", &self.shared.get().is_some())
            .finish()
    }
}
