//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Reaper: Removes expired cache entries at the configured sweep interval

mod reaper;

pub use reaper::{spawn_reaper, ReaperHandle, REAPER_THREAD_NAME};
