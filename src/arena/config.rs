//! Arena allocator configuration

/// Configuration for the arena allocator
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Zero the buffer when the core is built
    pub zero_memory: bool,

    /// Use exponential backoff for CAS retries
    pub use_backoff: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            zero_memory: false,
            use_backoff: true,
        }
    }
}

impl ArenaConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: false,
            zero_memory: false,
            use_backoff: true,
        }
    }

    /// Debug configuration - zeroed buffer, counters on
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            zero_memory: true,
            use_backoff: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_disables_debug_aids() {
        let config = ArenaConfig::production();
        assert!(!config.track_stats);
        assert!(!config.zero_memory);
    }

    #[test]
    fn debug_zeroes_memory() {
        assert!(ArenaConfig::debug().zero_memory);
    }
}
