//! Atomics facade for the lock-free cores.
//!
//! Under `--cfg loom` the cores run on loom's modeled atomics so their CAS
//! protocols can be exhaustively checked; everywhere else this is a plain
//! re-export of `core::sync::atomic`.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
