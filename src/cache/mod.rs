//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, tag invalidation and
//! memoization.

mod entry;
mod erased;
mod flight;
mod handle;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{Entry, Ttl};
pub use erased::{AnyCache, AnyValue};
pub use handle::Cache;
pub use store::CacheStore;
