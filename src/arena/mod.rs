//! Fixed-capacity bump arena allocator.
//!
//! [`ArenaAllocator<SIZE>`] hands out variably-sized, variably-aligned byte
//! ranges from a `SIZE`-byte buffer allocated once. Allocation is a
//! lock-free CAS bump of an atomic cursor; individual deallocation is a
//! documented no-op, and the whole buffer is reclaimed when the last handle
//! drops.
//!
//! Handles are cheap to clone and all clones bump one shared cursor, built
//! exactly once on first use. Two handles compare equal iff they share a
//! core.
//!
//! # Example
//!
//! ```rust
//! use fixed_alloc::arena::ArenaAllocator;
//! use std::alloc::Layout;
//!
//! let arena = ArenaAllocator::<1024>::new();
//!
//! // Raw ranges...
//! let raw = arena.allocate(Layout::from_size_align(64, 16).unwrap());
//! assert!(raw.is_some());
//!
//! // ...or typed values, valid as long as the handle they came from.
//! let n = arena.alloc(42_u64).unwrap();
//! assert_eq!(*n, 42);
//! let s = arena.alloc_str("hello").unwrap();
//! assert_eq!(s, "hello");
//! ```

mod config;
mod core;

pub use config::ArenaConfig;

use self::core::ArenaCore;
use crate::error::AllocResult;
#[cfg(feature = "stats")]
use crate::stats::ArenaStats;
use ::core::fmt;
use ::core::mem;
use ::core::ptr::{self, NonNull};
use std::alloc::Layout;
use std::sync::{Arc, OnceLock};

/// Thread-safe, fixed-capacity bump allocator.
///
/// The handle is a small value: a shared reference to the (lazily built)
/// core plus a by-value config. Cloning it never copies the buffer.
///
/// # Contract
///
/// - [`allocate`](Self::allocate) requires a non-zero-size layout; concurrent
///   callers always receive disjoint ranges, each aligned exactly as
///   requested
/// - there is no per-allocation reclamation; memory returns to the system
///   only when the last handle drops
/// - exhaustion is a `None` return, never an error or a blocking wait
pub struct ArenaAllocator<const SIZE: usize> {
    shared: Arc<OnceLock<ArenaCore<SIZE>>>,
    config: ArenaConfig,
}

impl<const SIZE: usize> ArenaAllocator<SIZE> {
    /// Creates a lazy handle with the default config.
    ///
    /// No memory is allocated until the first real use (or [`try_init`]).
    ///
    /// [`try_init`]: Self::try_init
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Creates a lazy handle with a custom config.
    #[must_use]
    pub fn with_config(config: ArenaConfig) -> Self {
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
        let core = ArenaCore::try_new(self.config.clone())?;
        // Losing the publication race is fine; the winner's core is
        // equally valid and ours frees its buffer on drop.
        let _ = self.shared.set(core);
        Ok(())
    }

    /// Returns a pointer to `layout.size()` bytes aligned to
    /// `layout.align()`, or `None` when the remaining capacity cannot fit
    /// the request (in which case the arena is left untouched).
    ///
    /// `layout.size()` must be non-zero; zero-size requests violate the
    /// contract (debug-asserted). Up to `layout.align() - 1` padding bytes
    /// may be consumed in addition to the requested size.
    pub fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.core().allocate(layout)
    }

    /// Does nothing, by design.
    ///
    /// The arena supports only bulk reclamation: every range stays live
    /// until the last handle referencing this buffer drops. The method
    /// exists so generic containers can treat both allocators uniformly.
    #[allow(clippy::unused_self)]
    pub fn deallocate(&self, _block: *mut u8) {}

    /// Moves `value` into the arena and returns a reference to it, valid
    /// for as long as this handle.
    ///
    /// The value's destructor never runs; the arena reclaims raw bytes in
    /// bulk. Returns `None` when the arena cannot fit the value.
    pub fn alloc<T>(&self, value: T) -> Option<&T> {
        if mem::size_of::<T>() == 0 {
            // ZSTs occupy no storage; an aligned dangling pointer is their
            // canonical address.
            let zst = NonNull::<T>::dangling().as_ptr();
            // SAFETY: writes of size zero are valid on any aligned non-null
            // pointer; the write consumes `value` without dropping it.
            unsafe {
                zst.write(value);
                return Some(&*zst);
            }
        }

        let block = self.allocate(Layout::new::<T>())?.cast::<T>();
        // SAFETY: the block is sized and aligned for T and exclusively ours;
        // write() does not drop the uninitialized destination. The borrow is
        // tied to &self, and the core outlives every handle borrow.
        unsafe {
            block.as_ptr().write(value);
            Some(&*block.as_ptr())
        }
    }

    /// Copies `slice` into the arena. Empty slices allocate nothing.
    pub fn alloc_slice<T: Copy>(&self, slice: &[T]) -> Option<&[T]> {
        if slice.is_empty() {
            return Some(&[]);
        }

        let layout = Layout::for_value(slice);
        let block = self.allocate(layout)?.cast::<T>();
        // SAFETY: the block holds slice.len() properly aligned T slots and
        // cannot overlap `slice` (it is freshly allocated); T: Copy makes
        // the bitwise copy complete.
        unsafe {
            ptr::copy_nonoverlapping(slice.as_ptr(), block.as_ptr(), slice.len());
            Some(&*ptr::slice_from_raw_parts(block.as_ptr(), slice.len()))
        }
    }

    /// Copies `s` into the arena.
    pub fn alloc_str(&self, s: &str) -> Option<&str> {
        let bytes = self.alloc_slice(s.as_bytes())?;
        // SAFETY: exact byte-for-byte copy of valid UTF-8.
        unsafe { Some(std::str::from_utf8_unchecked(bytes)) }
    }

    /// Fixed capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        SIZE
    }

    /// Bytes consumed so far, alignment padding included. Zero before the
    /// core is built.
    #[must_use]
    pub fn used(&self) -> usize {
        self.shared.get().map_or(0, ArenaCore::used)
    }

    /// Bytes still available for the most permissive (align = 1) request.
    #[must_use]
    pub fn remaining(&self) -> usize {
        SIZE - self.used()
    }

    /// Counters of the shared core, or `None` if it has not been built yet.
    #[cfg(feature = "stats")]
    #[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
    pub fn stats(&self) -> Option<&ArenaStats> {
        self.shared.get().map(ArenaCore::stats)
    }

    fn core(&self) -> &ArenaCore<SIZE> {
        self.shared.get_or_init(|| ArenaCore::new(self.config.clone()))
    }
}

impl<const SIZE: usize> Default for ArenaAllocator<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> Clone for ArenaAllocator<SIZE> {
    /// Clones the handle, not the arena: both handles bump one cursor.
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

impl<const SIZE: usize> PartialEq for ArenaAllocator<SIZE> {
    /// Two handles are equal iff they operate on the same backing buffer,
    /// i.e. one descends from the other by cloning.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<const SIZE: usize> Eq for ArenaAllocator<SIZE> {}

impl<const SIZE: usize> fmt::Debug for ArenaAllocator<SIZE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("capacity", &SIZE)
            .field("used", &self.used())
            .field("initialized", &self.shared.get().is_some())
            .finish()
    }
}
