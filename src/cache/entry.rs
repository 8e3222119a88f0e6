//! Cache Entry Module
//!
//! Defines individual cache entries and how their lifetime is requested.

use std::time::{Duration, Instant};

use chrono::TimeDelta;

// == Ttl ==
/// Requested lifetime of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the store's current default TTL
    #[default]
    Default,
    /// Expire this long after the entry is stored
    After(Duration),
    /// Never expire
    Never,
}

impl Ttl {
    /// Resolves the absolute expiration instant for an entry stored at `now`.
    ///
    /// Returns `None` for entries that never expire, including durations too
    /// large to be represented as an instant.
    pub fn expires_at(self, now: Instant, default_ttl: Duration) -> Option<Instant> {
        match self {
            Ttl::Default => now.checked_add(default_ttl),
            Ttl::After(duration) => now.checked_add(duration),
            Ttl::Never => None,
        }
    }
}

/// A zero duration selects the default TTL.
impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Ttl::Default
        } else {
            Ttl::After(duration)
        }
    }
}

/// Zero selects the default TTL, a negative delta never expires.
impl From<TimeDelta> for Ttl {
    fn from(delta: TimeDelta) -> Self {
        if delta.is_zero() {
            return Ttl::Default;
        }
        match delta.to_std() {
            Ok(duration) => Ttl::After(duration),
            Err(_) => Ttl::Never,
        }
    }
}

// == Cache Entry ==
/// A single stored value with its expiration and tags.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Tags attached at store time, in caller order
    pub tags: Vec<String>,
}

impl<V> Entry<V> {
    /// Creates an entry expiring at `expires_at`.
    pub fn new(value: V, expires_at: Option<Instant>, tags: &[&str]) -> Self {
        Self {
            value,
            expires_at,
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is expired only once `now` is strictly past its expiration
    /// instant. Entries without an expiration never expire.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    /// Returns true if the entry carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
