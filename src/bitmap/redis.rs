use super::{Bitmap, ExpiringBitmap};
use crate::error::{FilterError, Result};
use redis::{Client, Connection};
use std::sync::Mutex;
use std::time::Duration;

/// Remote bitmap stored as a redis string, one bit per location.
///
/// Location accesses are pipelined (`GETBIT`/`SETBIT`) so a batch costs one
/// round trip; batching does not change the observable semantics. Supports
/// the expiry capability via `PEXPIRE`, which the rotator uses to reclaim
/// retired generations.
pub struct RedisBitmap {
    conn: Mutex<Connection>,
    key: String,
    size: u64,
}

impl RedisBitmap {
    /// Opens a connection and eagerly creates the key with an empty bitmap.
    ///
    /// The key must exist before `set_expiry` is called; `PEXPIRE` on a
    /// missing key is a silent no-op and the generation would never be
    /// reclaimed.
    pub fn open(
        url: &str,
        key: &str,
        size: u64,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        debug_assert!(size > 0, "bitmap size must be > 0");
        let client = Client::open(url)?;
        let mut conn = client.get_connection()?;
        if let Some(timeout) = timeout {
            conn.set_read_timeout(Some(timeout))?;
            conn.set_write_timeout(Some(timeout))?;
        }

        let _: i64 = redis::cmd("SETBIT")
            .arg(key)
            .arg(0)
            .arg(0)
            .query(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            key: key.to_string(),
            size,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FilterError::StorageError(format!("redis lock poisoned: {e}")))
    }
}

impl Bitmap for RedisBitmap {
    fn check_bits(&self, locations: &[u64]) -> Result<bool> {
        let mut pipe = redis::pipe();
        for &loc in locations {
            pipe.cmd("GETBIT").arg(&self.key).arg(loc % self.size);
        }

        let mut conn = self.lock_conn()?;
        let bits: Vec<bool> = pipe.query(&mut *conn)?;
        Ok(bits.into_iter().all(|bit| bit))
    }

    fn set_bits(&self, locations: &[u64]) -> Result<()> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for &loc in locations {
            pipe.cmd("SETBIT").arg(&self.key).arg(loc % self.size).arg(1);
        }

        let mut conn = self.lock_conn()?;
        let _: Vec<bool> = pipe.query(&mut *conn)?;
        Ok(())
    }

    fn as_expiring(&self) -> Option<&dyn ExpiringBitmap> {
        Some(self)
    }
}

impl ExpiringBitmap for RedisBitmap {
    /// Sets the TTL with millisecond resolution. Sub-millisecond values are
    /// rounded up to 1ms; a TTL of zero would delete the key immediately.
    fn set_expiry(&self, ttl: Duration) -> Result<()> {
        let millis = ttl.as_millis().max(1) as u64;
        let mut conn = self.lock_conn()?;
        let _: i64 = redis::cmd("PEXPIRE")
            .arg(&self.key)
            .arg(millis)
            .query(&mut *conn)?;
        Ok(())
    }
}
