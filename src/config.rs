//! Configuration Module
//!
//! Handles loading and validating the two cache durations: the default TTL
//! applied to entries stored without an explicit lifetime, and the interval
//! between background sweeps.

use std::env;
use std::time::Duration;

use chrono::TimeDelta;
use tracing::warn;

/// Fallback TTL used when the configured default is not positive (one week).
pub const FALLBACK_DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Fallback sweep interval used when the configured one is not positive (five minutes).
pub const FALLBACK_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cache configuration parameters.
///
/// Durations are signed so that zero and negative values can be expressed;
/// both are replaced by fallbacks when the configuration is validated into
/// [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// TTL for entries stored with [`Ttl::Default`](crate::cache::Ttl::Default)
    pub default_ttl: TimeDelta,
    /// Interval between background sweeps of expired entries
    pub sweep_interval: TimeDelta,
}

impl Config {
    /// Creates a Config from explicit durations.
    pub fn new(default_ttl: TimeDelta, sweep_interval: TimeDelta) -> Self {
        Self {
            default_ttl,
            sweep_interval,
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 7200)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 600)
    ///
    /// Values may be zero or negative, in which case the validation fallbacks
    /// apply. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: seconds_from_env("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            sweep_interval: seconds_from_env("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: TimeDelta) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: TimeDelta) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Validates the configuration, replacing non-positive durations with
    /// [`FALLBACK_DEFAULT_TTL`] and [`FALLBACK_SWEEP_INTERVAL`].
    pub fn settings(&self) -> Settings {
        Settings {
            default_ttl: positive_or(self.default_ttl, FALLBACK_DEFAULT_TTL),
            sweep_interval: positive_or(self.sweep_interval, FALLBACK_SWEEP_INTERVAL),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: TimeDelta::hours(2),
            sweep_interval: TimeDelta::minutes(10),
        }
    }
}

// == Settings ==
/// A validated, immutable snapshot of the cache durations.
///
/// Both durations are strictly positive: zero durations are replaced by the
/// fallbacks on construction. The store swaps the whole snapshot at once, so
/// readers never observe one field updated without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    default_ttl: Duration,
    sweep_interval: Duration,
}

impl Settings {
    /// Creates a snapshot, replacing zero durations with
    /// [`FALLBACK_DEFAULT_TTL`] and [`FALLBACK_SWEEP_INTERVAL`].
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            default_ttl: nonzero_or(default_ttl, FALLBACK_DEFAULT_TTL),
            sweep_interval: nonzero_or(sweep_interval, FALLBACK_SWEEP_INTERVAL),
        }
    }

    /// TTL applied when an entry is stored with the default lifetime.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Interval between background sweeps.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().settings()
    }
}

fn positive_or(delta: TimeDelta, fallback: Duration) -> Duration {
    delta.to_std().map_or(fallback, |duration| nonzero_or(duration, fallback))
}

fn nonzero_or(duration: Duration, fallback: Duration) -> Duration {
    if duration.is_zero() {
        fallback
    } else {
        duration
    }
}

fn seconds_from_env(name: &str) -> Option<TimeDelta> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<i64>().ok().and_then(TimeDelta::try_seconds) {
        Some(delta) => Some(delta),
        None => {
            warn!("Ignoring malformed {}={:?}, expected integer seconds", name, raw);
            None
        }
    }
}
