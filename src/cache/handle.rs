//! Cache Handle Module
//!
//! The public entry point: a cloneable handle owning a store and its reaper.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheStore, Ttl};
use crate::config::{Config, Settings};
use crate::error::Result;
use crate::tasks::{spawn_reaper, ReaperHandle};

// == Cache ==
/// Thread-safe TTL cache with tag invalidation.
///
/// Cloning is cheap and every clone shares the same entries. The background
/// reaper stops when [`shutdown`](Self::shutdown) is called or when the last
/// clone is dropped.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tagged_cache::{Cache, Config};
///
/// let cache: Cache<u64> = Cache::new(Config::default()).unwrap();
/// cache.set("answer", 42, Duration::from_secs(30), &["numbers"]);
/// assert_eq!(cache.get("answer"), Some(42));
///
/// cache.flush_tag("numbers");
/// assert_eq!(cache.get("answer"), None);
/// ```
pub struct Cache<V> {
    store: Arc<CacheStore<V>>,
    reaper: Arc<ReaperHandle>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reaper: Arc::clone(&self.reaper),
        }
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("reaper", &self.reaper)
            .finish_non_exhaustive()
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache and starts its reaper.
    ///
    /// Non-positive durations in `config` are replaced by the fallbacks
    /// (one week TTL, five minute sweep interval).
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(CacheStore::new(config.settings()));
        let reaper = spawn_reaper(&store)?;
        Ok(Self {
            store,
            reaper: Arc::new(reaper),
        })
    }

    /// Creates a cache with [`Config::default`] (two hour TTL, ten minute sweeps).
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Applies new durations to the live cache.
    ///
    /// Stored entries and the running reaper are kept; later default-TTL
    /// sets and the next sweep use the new values.
    pub fn reconfigure(&self, config: Config) {
        self.store.apply_settings(config.settings());
    }

    /// Returns the current validated settings.
    pub fn settings(&self) -> Settings {
        self.store.settings()
    }

    /// Stores `value` under `key`, replacing any previous entry entirely.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>, tags: &[&str]) {
        self.store.set(key, value, ttl, tags);
    }

    /// Returns the value for `key` unless it is absent or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.get(key)
    }

    /// Returns the cached value, or computes and caches it on a miss.
    ///
    /// See [`CacheStore::get_or_compute`] for the single-flight guarantee.
    pub fn get_or_compute<F>(&self, key: &str, compute: F, ttl: impl Into<Ttl>, tags: &[&str]) -> V
    where
        F: FnOnce() -> V,
    {
        self.store.get_or_compute(key, compute, ttl, tags)
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but nothing is cached
    /// when `compute` fails.
    pub fn get_or_try_compute<F, E>(
        &self,
        key: &str,
        compute: F,
        ttl: impl Into<Ttl>,
        tags: &[&str],
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        self.store.get_or_try_compute(key, compute, ttl, tags)
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.store.delete(key)
    }

    /// Removes every entry.
    pub fn flush_all(&self) {
        self.store.flush_all();
    }

    /// Removes every entry tagged `tag`, returning how many were removed.
    pub fn flush_tag(&self, tag: &str) -> usize {
        self.store.flush_tag(tag)
    }

    /// Runs one sweep now instead of waiting for the reaper.
    pub fn sweep_expired(&self) -> usize {
        self.store.sweep_expired()
    }

    /// Number of stored entries, counting expired entries not yet swept.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Stops the reaper and waits for it to exit.
    ///
    /// The cache stays usable; expired entries are simply no longer swept in
    /// the background.
    pub fn shutdown(&self) -> Result<()> {
        self.reaper.shutdown()
    }

    /// Returns true while the reaper is running.
    pub fn is_reaping(&self) -> bool {
        self.reaper.is_running()
    }
}
