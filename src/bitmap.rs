//! Bit-addressable set abstraction backing the Bloom filters.
//!
//! A [`Bitmap`] is the only thing a filter knows about its storage: a batch
//! test and a batch set over bit locations, with locations reduced modulo the
//! bitmap size. Backends that support time-based reclamation additionally
//! expose the [`ExpiringBitmap`] capability, which the rotator probes at
//! runtime.

use crate::error::Result;
use std::time::Duration;

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::InMemoryBitmap;
#[cfg(feature = "redis")]
pub use self::redis::RedisBitmap;

pub trait Bitmap: Send + Sync {
    /// Returns true iff every location (taken modulo the bitmap size) is set.
    ///
    /// Never mutates state. On error the boolean result is meaningless and
    /// must not be interpreted as a membership answer.
    fn check_bits(&self, locations: &[u64]) -> Result<bool>;

    /// Sets every location (taken modulo the bitmap size).
    ///
    /// Idempotent: setting an already-set bit is a no-op. Partial
    /// application on error is backend-defined but always reported.
    fn set_bits(&self, locations: &[u64]) -> Result<()>;

    /// Probe for the expiry capability. Backends without time-based
    /// reclamation keep the default.
    fn as_expiring(&self) -> Option<&dyn ExpiringBitmap> {
        None
    }
}

/// Optional capability for backends that can reclaim a whole bitmap after a
/// TTL (e.g. redis `EXPIRE`).
pub trait ExpiringBitmap {
    fn set_expiry(&self, ttl: Duration) -> Result<()>;
}
