//! Error types for fixed-alloc
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.
//!
//! Errors here cover the one hard-failure point of the crate: acquiring the
//! backing storage when an allocator core is built. Running out of pool
//! blocks or arena bytes is *not* an error: `allocate` reports exhaustion
//! by returning `None`, and callers are expected to check it.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::error;

/// Allocator construction errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("backing storage allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    #[error("initialization failed: {reason}")]
    InitializationFailed { reason: String },
}

impl AllocError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "ALLOC:STORAGE:FAILED",
            Self::InitializationFailed { .. } => "ALLOC:INIT:FAILED",
        }
    }

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "backing storage allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create initialization failed error
    pub fn initialization_failed(reason: &str) -> Self {
        Self::InitializationFailed {
            reason: reason.to_string(),
        }
    }
}

/// Result type for allocator construction
pub type AllocResult<T> = core::result::Result<T, AllocError>;
