//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Data operations never
//! fail: misses are reported as `None`/`false`. Only the reaper lifecycle can
//! produce an error.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The reaper thread or its timer runtime could not be created
    #[error("Failed to start reaper: {0}")]
    ReaperSpawn(#[from] std::io::Error),

    /// The reaper thread panicked before it could be joined
    #[error("Reaper thread panicked")]
    ReaperPanicked,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
