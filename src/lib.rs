//! Tagged Cache - An in-process, thread-safe TTL cache
//!
//! Stores values behind string keys with per-entry time-to-live, removes
//! expired entries with a background reaper, and invalidates groups of
//! entries by tag.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{AnyCache, AnyValue, Cache, Ttl};
pub use config::{Config, Settings};
pub use error::CacheError;
