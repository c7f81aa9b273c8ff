//! Configuration-driven construction of bitmaps and filters.
//!
//! Two layers, mirroring the data flow: a [`BitmapFactory`] picks and wires
//! the storage backend, a [`FilterFactory`] builds the filter on top of it
//! and wraps it in a [`Rotator`] when rotation is enabled.

use crate::bitmap::{Bitmap, InMemoryBitmap};
use crate::config::{BitmapBackend, FactoryConfig};
use crate::error::Result;
use crate::filter::{BloomFilter, Filter, FilterOps};
use crate::rotator::{Generation, NewFilterFn, Rotator};
use std::sync::Arc;

#[cfg(feature = "redis")]
use crate::bitmap::{ExpiringBitmap, RedisBitmap};
#[cfg(feature = "redis")]
use crate::config::RotatorMode;
#[cfg(feature = "redis")]
use crate::error::FilterError;
#[cfg(feature = "redis")]
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait BitmapFactory: Send + Sync {
    /// Builds a fresh bitmap with the configured backend for the given
    /// generation role. Safe to call repeatedly; every call yields an
    /// independent bit array.
    fn new_bitmap(&self, generation: Generation) -> Result<Box<dyn Bitmap>>;
}

pub struct InMemoryBitmapFactory {
    cfg: FactoryConfig,
}

impl BitmapFactory for InMemoryBitmapFactory {
    fn new_bitmap(&self, _generation: Generation) -> Result<Box<dyn Bitmap>> {
        Ok(Box::new(InMemoryBitmap::new(self.cfg.filter.bits)))
    }
}

/// Derives the redis key for one filter generation.
///
/// The `next` generation is stamped one period ahead of `current`. In
/// [`RotatorMode::PlainTimestamp`] the stamp is the raw construction time,
/// unique to this process. In [`RotatorMode::TruncatedTime`] the stamp is
/// truncated down to a period boundary first, so every instance with the
/// same base key and period lands on the same key for the same window.
#[cfg(feature = "redis")]
fn generation_key(
    base: &str,
    mode: RotatorMode,
    generation: Generation,
    period: Duration,
    now: SystemTime,
) -> Result<String> {
    let mut stamp = now.duration_since(UNIX_EPOCH)?;
    if generation == Generation::Next {
        stamp += period;
    }
    let nanos = match mode {
        RotatorMode::PlainTimestamp => stamp.as_nanos(),
        RotatorMode::TruncatedTime => {
            stamp.as_nanos() - stamp.as_nanos() % period.as_nanos()
        }
    };
    Ok(format!("{base}_{nanos}"))
}

#[cfg(feature = "redis")]
pub struct RedisBitmapFactory {
    cfg: FactoryConfig,
}

#[cfg(feature = "redis")]
impl BitmapFactory for RedisBitmapFactory {
    /// With rotation enabled every bitmap gets a timestamp-suffixed key
    /// (see [`generation_key`]) and a TTL of two periods plus the grace
    /// margin, so a retired generation is reclaimed by redis on its own but
    /// never before the rotator stops referencing it.
    fn new_bitmap(&self, generation: Generation) -> Result<Box<dyn Bitmap>> {
        let redis = self.cfg.redis.as_ref().ok_or_else(|| {
            FilterError::InvalidConfig("missing redis config".into())
        })?;

        let key = if self.cfg.rotator.enabled {
            generation_key(
                &redis.key,
                self.cfg.rotator.mode,
                generation,
                self.cfg.rotator.period,
                SystemTime::now(),
            )?
        } else {
            redis.key.clone()
        };

        let bitmap = RedisBitmap::open(
            &redis.url,
            &key,
            self.cfg.filter.bits,
            redis.timeout,
        )?;
        if self.cfg.rotator.enabled {
            bitmap.set_expiry(
                self.cfg.rotator.period * 2 + self.cfg.rotator.grace_period,
            )?;
        }
        Ok(Box::new(bitmap))
    }
}

/// Validates the config and returns the backend-specific bitmap factory.
pub fn new_bitmap_factory(cfg: FactoryConfig) -> Result<Box<dyn BitmapFactory>> {
    cfg.validate()?;
    match cfg.backend {
        BitmapBackend::InMemory => Ok(Box::new(InMemoryBitmapFactory { cfg })),
        #[cfg(feature = "redis")]
        BitmapBackend::Redis => Ok(Box::new(RedisBitmapFactory { cfg })),
    }
}

pub trait FilterFactory: Send + Sync {
    /// Builds a ready-to-use filter handle according to the configuration.
    fn new_filter(&self) -> Result<Box<dyn FilterOps>>;
}

pub struct BloomFilterFactory {
    cfg: FactoryConfig,
    bitmaps: Box<dyn BitmapFactory>,
}

impl BloomFilterFactory {
    pub fn new(cfg: FactoryConfig) -> Result<Self> {
        let bitmaps = new_bitmap_factory(cfg.clone())?;
        Ok(Self { cfg, bitmaps })
    }

    /// Builds one filter generation; the rotator calls this through the
    /// factory closure.
    pub fn build(&self, generation: Generation) -> Result<Box<dyn Filter>> {
        let bitmap = self.bitmaps.new_bitmap(generation)?;
        Ok(Box::new(BloomFilter::with_locations(
            bitmap,
            self.cfg.filter.bits,
            self.cfg.filter.hashes,
            self.cfg.filter.locations,
        )))
    }
}

impl FilterFactory for BloomFilterFactory {
    fn new_filter(&self) -> Result<Box<dyn FilterOps>> {
        let bitmap = self.bitmaps.new_bitmap(Generation::Current)?;
        Ok(Box::new(BloomFilter::with_locations(
            bitmap,
            self.cfg.filter.bits,
            self.cfg.filter.hashes,
            self.cfg.filter.locations,
        )))
    }
}

pub struct RotatorFactory {
    cfg: FactoryConfig,
    base: Arc<BloomFilterFactory>,
}

impl FilterFactory for RotatorFactory {
    fn new_filter(&self) -> Result<Box<dyn FilterOps>> {
        let base = Arc::clone(&self.base);
        let new_filter: NewFilterFn =
            Arc::new(move |generation| base.build(generation));
        Ok(Box::new(Rotator::new(self.cfg.rotator.clone(), new_filter)?))
    }
}

/// Validates the config and returns the matching filter factory:
/// [`RotatorFactory`] when rotation is enabled, plain
/// [`BloomFilterFactory`] otherwise.
pub fn new_filter_factory(cfg: FactoryConfig) -> Result<Box<dyn FilterFactory>> {
    cfg.validate()?;
    if cfg.rotator.enabled {
        let base = Arc::new(BloomFilterFactory::new(cfg.clone())?);
        Ok(Box::new(RotatorFactory { cfg, base }))
    } else {
        Ok(Box::new(BloomFilterFactory::new(cfg)?))
    }
}
