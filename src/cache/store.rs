//! Cache Store Module
//!
//! Main cache engine: a HashMap of entries behind one reader/writer lock,
//! with TTL expiration, tag invalidation and single-flight memoization.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Instant;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tokio::sync::watch;
use tracing::debug;

use crate::cache::flight::{FlightTable, Landing, Role};
use crate::cache::{Entry, Ttl};
use crate::config::Settings;

// == Cache Store ==
/// Thread-safe storage shared by every [`Cache`](crate::cache::Cache) handle
/// and the reaper.
///
/// Reads take the lock in shared mode; writes take it exclusively. Expired
/// entries are hidden from reads immediately but stay in the map until
/// [`sweep_expired`](Self::sweep_expired) removes them.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: RwLock<HashMap<String, Entry<V>>>,
    /// Current settings snapshot, also observed by the reaper
    settings: watch::Sender<Settings>,
    /// Computations in progress for `get_or_compute`
    flights: FlightTable<V>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store using `settings`.
    pub fn new(settings: Settings) -> Self {
        let (settings, _) = watch::channel(settings);
        Self {
            entries: RwLock::new(HashMap::new()),
            settings,
            flights: FlightTable::new(),
        }
    }

    // == Settings ==
    /// Returns the current settings snapshot.
    pub fn settings(&self) -> Settings {
        *self.settings.borrow()
    }

    /// Replaces the settings snapshot. Stored entries keep the expiration
    /// they were given.
    pub fn apply_settings(&self, settings: Settings) {
        let previous = self.settings.send_replace(settings);
        debug!(?previous, current = ?settings, "Cache settings replaced");
    }

    /// Subscribes to settings changes. The channel closes when the store is dropped.
    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.settings.subscribe()
    }

    // == Set ==
    /// Stores a value, replacing any previous entry for the key entirely
    /// (value, expiration and tags).
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Requested lifetime; a zero duration selects the default TTL
    /// * `tags` - Labels used by [`flush_tag`](Self::flush_tag)
    pub fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>, tags: &[&str]) {
        let default_ttl = self.settings().default_ttl();
        let expires_at = ttl.into().expires_at(Instant::now(), default_ttl);
        let entry = Entry::new(value, expires_at, tags);

        self.entries.write().insert(key.into(), entry);
    }

    // == Get ==
    /// Retrieves a clone of the value for `key`.
    ///
    /// Returns None if the key is absent or its entry has expired. The entry
    /// is left in place either way.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value.clone())
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, or computes, stores and returns it.
    ///
    /// Concurrent misses on the same key run `compute` once: the first caller
    /// computes while the others block and receive its value. `compute` runs
    /// without holding the map lock, but must not ask this store for the same
    /// key.
    pub fn get_or_compute<F>(&self, key: &str, compute: F, ttl: impl Into<Ttl>, tags: &[&str]) -> V
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_compute(key, || Ok::<V, Infallible>(compute()), ttl, tags) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_or_compute`](Self::get_or_compute).
    ///
    /// On `Err` nothing is stored and the error is returned as is; callers
    /// waiting on this computation retry and one of them computes again.
    pub fn get_or_try_compute<F, E>(
        &self,
        key: &str,
        compute: F,
        ttl: impl Into<Ttl>,
        tags: &[&str],
    ) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let ttl = ttl.into();
        loop {
            if let Some(value) = self.get(key) {
                return Ok(value);
            }

            match self.flights.join(key) {
                Role::Follower(flight) => match flight.wait() {
                    Landing::Ready(value) => return Ok(value),
                    Landing::Abandoned => continue,
                },
                Role::Leader(leader) => {
                    // A previous leader may have stored the value since our lookup.
                    if let Some(value) = self.get(key) {
                        leader.complete(value.clone());
                        return Ok(value);
                    }

                    let value = compute()?;
                    self.set(key, value.clone(), ttl, tags);
                    leader.complete(value.clone());
                    return Ok(value);
                }
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `key`.
    ///
    /// Returns true if an entry was present, expired or not.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    // == Flush All ==
    /// Removes every entry.
    pub fn flush_all(&self) {
        let previous = std::mem::take(&mut *self.entries.write());
        debug!("Flushed all {} entries", previous.len());
    }

    // == Flush Tag ==
    /// Removes every entry carrying `tag` in one exclusive critical section.
    ///
    /// Returns the number of entries removed.
    pub fn flush_tag(&self, tag: &str) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.has_tag(tag));
            before - entries.len()
        };

        debug!("Flushed {} entries tagged {:?}", removed, tag);
        removed
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the store.
    ///
    /// The scan shares the lock with readers; the exclusive lock is only taken
    /// when something has expired. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.upgradable_read();
        let expired_keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        if expired_keys.is_empty() {
            return 0;
        }

        let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
        for key in &expired_keys {
            entries.remove(key);
        }
        expired_keys.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired entries not
    /// yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
