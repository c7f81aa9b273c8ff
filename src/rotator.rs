//! Rotation engine turning a static Bloom filter into a sliding-window one.
//!
//! The rotator keeps two filter generations alive, `current` and `next`.
//! Every period it retires `current`, promotes `next` and builds a fresh
//! empty `next` through an injected factory closure. Elements are written
//! into both generations so an insert close to a rotation boundary stays
//! visible right after the swap; lookups are answered from `current` only,
//! since `next` is still warming up and does not yet represent a full
//! window.
//!
//! A lookup therefore reports "seen within roughly the last one to two
//! periods". After two rotations an element that was never re-added is gone
//! from both generations, and backends with the expiry capability reclaim
//! the retired bitmap on their own.

use crate::config::RotatorConfig;
use crate::error::{FilterError, Result};
use crate::filter::{Filter, FilterOps};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Role a freshly built filter is about to play. Handed to the factory
/// closure so backends with named storage can derive the right key for the
/// generation (the current window or the one after it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    Current,
    Next,
}

/// Factory producing a fresh, fully wired filter generation. Called twice at
/// startup and once per rotation; must be safe to call repeatedly and
/// concurrently with operations on previously returned filters.
pub type NewFilterFn =
    Arc<dyn Fn(Generation) -> Result<Box<dyn Filter>> + Send + Sync>;

struct Generations {
    current: Box<dyn Filter>,
    next: Box<dyn Filter>,
}

struct Shared {
    generations: RwLock<Generations>,
    new_filter: NewFilterFn,
    period: Duration,
    grace_period: Duration,
}

impl Shared {
    fn read_generations(&self) -> Result<RwLockReadGuard<'_, Generations>> {
        self.generations.read().map_err(|e| {
            FilterError::StorageError(format!("rotator lock poisoned: {e}"))
        })
    }

    fn write_generations(&self) -> Result<RwLockWriteGuard<'_, Generations>> {
        self.generations.write().map_err(|e| {
            FilterError::StorageError(format!("rotator lock poisoned: {e}"))
        })
    }

    fn rotate(&self) -> Result<()> {
        // Build and expire the fresh generation before taking the write
        // lock; readers only ever wait on the pointer swap. If construction
        // fails the existing pair stays untouched.
        let fresh = (self.new_filter)(Generation::Next)?;
        set_expiry(fresh.as_ref(), self.period * 2 + self.grace_period)?;

        let mut generations = self.write_generations()?;
        generations.current = std::mem::replace(&mut generations.next, fresh);
        debug!("rotated filter generations");
        Ok(())
    }
}

/// Sets the backend TTL if the generation's bitmap supports expiry.
fn set_expiry(filter: &dyn Filter, ttl: Duration) -> Result<()> {
    match filter.bitmap().as_expiring() {
        Some(bitmap) => bitmap.set_expiry(ttl),
        None => Ok(()),
    }
}

/// Concurrency-safe filter rotator.
///
/// `add` and `exist` take the shared side of a reader/writer lock and may
/// run from any number of threads; the background tick takes the exclusive
/// side only for the pointer swap. Dropping the rotator stops the
/// background thread; the filters themselves hold no unmanaged resources.
pub struct Rotator {
    shared: Arc<Shared>,
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Rotator {
    pub fn new(cfg: RotatorConfig, new_filter: NewFilterFn) -> Result<Self> {
        let current = (new_filter)(Generation::Current)?;
        let next = (new_filter)(Generation::Next)?;
        // Staggered reclamation: the first current lives one more period,
        // the first next two.
        set_expiry(current.as_ref(), cfg.period + cfg.grace_period)?;
        set_expiry(next.as_ref(), cfg.period * 2 + cfg.grace_period)?;

        let shared = Arc::new(Shared {
            generations: RwLock::new(Generations { current, next }),
            new_filter,
            period: cfg.period,
            grace_period: cfg.grace_period,
        });

        let (tx, rx) = mpsc::channel();
        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || run_rotation(&shared, &rx))
        };
        info!(period = ?cfg.period, "rotator started");

        Ok(Self {
            shared,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Forces one rotation outside the timer schedule: retires `current`,
    /// promotes `next` and installs a fresh empty `next`.
    pub fn rotate(&self) -> Result<()> {
        self.shared.rotate()
    }

    /// Stops the background rotation thread and waits for it to exit.
    /// In-flight `add`/`exist` calls complete normally; no further ticks
    /// occur. Also runs on drop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_rotation(shared: &Shared, shutdown: &Receiver<()>) {
    loop {
        match shutdown.recv_timeout(shared.period) {
            Err(RecvTimeoutError::Timeout) => {
                // A failed tick keeps the old pair serving and is retried
                // on the next one.
                if let Err(err) = shared.rotate() {
                    warn!(error = %err, "rotation failed, keeping previous generations");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("rotator stopped");
                return;
            }
        }
    }
}

impl FilterOps for Rotator {
    /// Best-effort dual write into both generations, `current` first.
    ///
    /// Fails fast on the first failing generation: on error the element may
    /// be present in neither, one or both generations. Retrying the whole
    /// call is safe because insertion is idempotent.
    fn add(&self, data: &[u8]) -> Result<()> {
        let generations = self.shared.read_generations()?;
        generations.current.add(data)?;
        generations.next.add(data)
    }

    /// Answers from `current` only; `next` has not yet earned visibility in
    /// the reported window.
    fn exist(&self, data: &[u8]) -> Result<bool> {
        let generations = self.shared.read_generations()?;
        generations.current.exist(data)
    }
}

impl Drop for Rotator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
