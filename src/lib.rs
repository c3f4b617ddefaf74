//! # fixed-alloc
//!
//! Fixed-capacity, lock-free memory allocators for pool-backed containers.
//!
//! This crate provides two thread-safe building blocks that never touch a
//! general-purpose heap after their one-time setup:
//! - [`PoolAllocator`](pool::PoolAllocator): hands out fixed-size blocks of
//!   one element type from a preallocated buffer via a lock-free intrusive
//!   free list
//! - [`ArenaAllocator`](arena::ArenaAllocator): hands out variably-sized,
//!   variably-aligned byte ranges via a lock-free bump cursor, reclaimed in
//!   bulk when the last handle drops
//!
//! Both allocators share one design: a cheap, copyable handle referencing a
//! shared core that owns the backing buffer. The core is built exactly once,
//! lazily, even when multiple handle copies race on first use. Steady-state
//! `allocate`/`deallocate` are compare-and-swap retry loops; exhaustion is a
//! `None` return, never an error and never a blocking wait.
//!
//! ## Quick Start
//!
//! ```rust
//! use fixed_alloc::prelude::*;
//! use std::alloc::Layout;
//!
//! // A pool of 128 u64 blocks. Blocks come back uninitialized.
//! let pool = PoolAllocator::<u64, 128>::new();
//! let block = pool.allocate().expect("pool has free blocks");
//! unsafe {
//!     block.as_ptr().write(42);
//!     assert_eq!(block.as_ptr().read(), 42);
//!     pool.deallocate(block.as_ptr());
//! }
//!
//! // A 4 KiB arena. Individual deallocation is a no-op by design.
//! let arena = ArenaAllocator::<4096>::new();
//! let bytes = arena.allocate(Layout::from_size_align(16, 8).unwrap());
//! assert!(bytes.is_some());
//! let greeting = arena.alloc_str("hello").unwrap();
//! assert_eq!(greeting, "hello");
//! ```
//!
//! ## Features
//!
//! - `std` (default): standard library support (required)
//! - `logging` (default): one `tracing` debug event when a core is built
//! - `stats`: atomic allocation counters, recorded when the allocator's
//!   config asks for them
//!
//! ## Concurrency model checking
//!
//! The lock-free cores carry [loom](https://docs.rs/loom) models; run them
//! with `RUSTFLAGS="--cfg loom" cargo test --release`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// inline(always) on small alignment helpers is intentional for hot paths
#![allow(clippy::inline_always)]
// Cast truncation in the packed head word is reviewed per-site
#![allow(clippy::cast_possible_truncation)]

// Error types
pub mod error;

// Core modules
pub mod arena;
pub mod pool;
#[cfg(feature = "stats")]
#[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
pub mod stats;
pub mod utils;

pub(crate) mod sync;

// Re-export core types for convenience
pub use crate::error::{AllocError, AllocResult};

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::arena::{ArenaAllocator, ArenaConfig};
    pub use crate::error::{AllocError, AllocResult};
    pub use crate::pool::{PoolAllocator, PoolConfig};

    #[cfg(feature = "stats")]
    pub use crate::stats::{ArenaStats, PoolStats};
}
