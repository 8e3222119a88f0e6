//! TTL Reaper
//!
//! Background thread that periodically removes expired cache entries.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::Settings;
use crate::error::{CacheError, Result};

/// Name given to reaper threads.
pub const REAPER_THREAD_NAME: &str = "cache-reaper";

// == Reaper Handle ==
/// Owner's side of a running reaper.
///
/// Dropping the handle stops the reaper and waits for its thread to exit.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown: watch::Sender<bool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ReaperHandle {
    /// Signals the reaper to stop and joins its thread.
    ///
    /// Calling this more than once is a no-op. Returns an error if the
    /// reaper thread panicked.
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown.send_replace(true);
        let Some(thread) = self.thread.lock().take() else {
            return Ok(());
        };
        thread.join().map_err(|_| CacheError::ReaperPanicked)
    }

    /// Returns true while the reaper thread is alive.
    pub fn is_running(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("{}", err);
        }
    }
}

/// Spawns the reaper for `store` on a dedicated thread.
///
/// The thread sleeps for the store's current sweep interval between sweeps
/// and picks up interval changes without restarting. It holds only a weak
/// reference to the store and exits once the store is dropped or the
/// returned handle signals shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::<String>::new(Settings::default()));
/// let reaper = spawn_reaper(&store)?;
/// // Later, during shutdown:
/// reaper.shutdown()?;
/// ```
pub fn spawn_reaper<V>(store: &Arc<CacheStore<V>>) -> Result<ReaperHandle>
where
    V: Clone + Send + Sync + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let settings = store.subscribe_settings();
    let store = Arc::downgrade(store);

    let thread = thread::Builder::new()
        .name(REAPER_THREAD_NAME.to_string())
        .spawn(move || runtime.block_on(run_reaper(store, settings, shutdown_rx)))?;

    Ok(ReaperHandle {
        shutdown: shutdown_tx,
        thread: Mutex::new(Some(thread)),
    })
}

async fn run_reaper<V: Clone>(
    store: Weak<CacheStore<V>>,
    mut settings: watch::Receiver<Settings>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = settings.borrow_and_update().sweep_interval();
    let mut last_sweep = Instant::now();
    info!("Starting reaper with sweep interval of {:?}", interval);

    loop {
        tokio::select! {
            _ = sleep_until(last_sweep + interval) => {}
            changed = settings.changed() => {
                // The store was dropped.
                if changed.is_err() {
                    break;
                }
                interval = settings.borrow_and_update().sweep_interval();
                debug!("Reaper sweep interval is now {:?}", interval);
                continue;
            }
            _ = shutdown.changed() => break,
        }

        let Some(store) = store.upgrade() else {
            break;
        };
        let removed = store.sweep_expired();
        drop(store);
        last_sweep = Instant::now();

        if removed > 0 {
            info!("Reaper sweep: removed {} expired entries", removed);
        } else {
            debug!("Reaper sweep: no expired entries found");
        }
    }

    info!("Reaper stopped");
}
