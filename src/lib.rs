//! Rotating Bloom filter with pluggable bitmap backends.
//!
//! A plain Bloom filter answers "has this item ever been added". This crate
//! adds a rotation engine on top that bounds the answer to a sliding time
//! window ("has this item been seen within roughly the last N minutes")
//! without taking the filter offline and without unbounded storage growth.
//!
//! How it works:
//!   * Generations: the rotator keeps two filters alive, `current` and
//!     `next`. Adds go into both, lookups are answered from `current` only.
//!   * Rotation: every period `current` is retired, `next` is promoted and
//!     a fresh empty `next` is created. An element added just before the
//!     swap is therefore still visible right after it.
//!   * Backends: filters talk to storage through the [`Bitmap`] trait. The
//!     in-memory backend is a plain bit vector; the redis backend (feature
//!     `redis`) stores bits remotely and additionally supports TTL-based
//!     reclamation of retired generations.
//!
//! ```no_run
//! use rotating_bloom_rs::{
//!     FactoryConfigBuilder, FilterOps, RotatorConfigBuilder, new_filter_factory,
//! };
//! use std::time::Duration;
//!
//! # fn main() -> rotating_bloom_rs::Result<()> {
//! let config = FactoryConfigBuilder::default()
//!     .rotator(
//!         RotatorConfigBuilder::default()
//!             .enabled(true)
//!             .period(Duration::from_secs(600))
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let filter = new_filter_factory(config)?.new_filter()?;
//! filter.add(b"hello")?;
//! assert!(filter.exist(b"hello")?);
//! # Ok(())
//! # }
//! ```
//!
//! Error semantics: every operation returns a [`Result`]; an error means the
//! membership answer is indeterminate, never "absent". The rotator's dual
//! write is best effort; see [`Rotator`].

pub mod bitmap;
mod config;
mod error;
pub mod factory;
mod filter;
mod hash;
mod rotator;

pub use bitmap::{Bitmap, ExpiringBitmap, InMemoryBitmap};
#[cfg(feature = "redis")]
pub use bitmap::RedisBitmap;
pub use config::{
    BitmapBackend, DEFAULT_BITS, DEFAULT_GRACE_PERIOD, DEFAULT_HASHES,
    FactoryConfig, FactoryConfigBuilder, FactoryConfigBuilderError,
    FilterConfig, FilterConfigBuilder, RedisConfig, RedisConfigBuilder,
    RotatorConfig, RotatorConfigBuilder, RotatorMode,
};
pub use error::{FilterError, Result};
pub use factory::{
    BitmapFactory, BloomFilterFactory, FilterFactory, new_bitmap_factory,
    new_filter_factory,
};
pub use filter::{BloomFilter, Filter, FilterOps};
pub use hash::{LocationFn, default_locations, optimal_bits, optimal_hashes};
pub use rotator::{Generation, NewFilterFn, Rotator};
