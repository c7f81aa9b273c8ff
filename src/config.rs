use crate::error::{FilterError, Result};
use crate::hash::{LocationFn, default_locations};
use derive_builder::Builder;
use std::time::Duration;

/// Default bit array size, 256Mi bits (32MiB of backing memory).
pub const DEFAULT_BITS: u64 = 256 * 1024 * 1024;

/// Default number of hash locations per element.
pub const DEFAULT_HASHES: u64 = 3;

/// Safety margin added on top of backend TTLs so a generation is never
/// reclaimed by the backend before the rotator itself retires it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(60);

/// Storage backend selection for the bitmap behind each filter generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BitmapBackend {
    #[default]
    InMemory,
    #[cfg(feature = "redis")]
    Redis,
}

/// Parameters of a single Bloom filter.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct FilterConfig {
    /// Number of bits in the filter
    #[builder(default = "DEFAULT_BITS")]
    pub bits: u64,

    /// Number of hash locations per element
    #[builder(default = "DEFAULT_HASHES")]
    pub hashes: u64,

    /// Location function mapping an element to its bit locations
    #[builder(default = "default_locations")]
    pub locations: LocationFn,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            bits: DEFAULT_BITS,
            hashes: DEFAULT_HASHES,
            locations: default_locations,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bits == 0 {
            return Err(FilterError::InvalidConfig("bits must be > 0".into()));
        }
        if self.hashes == 0 {
            return Err(FilterError::InvalidConfig("hashes must be > 0".into()));
        }
        Ok(())
    }
}

/// Key derivation scheme for generation bitmaps on backends with named
/// storage (redis).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RotatorMode {
    /// Suffix each generation key with the construction timestamp. Keys are
    /// unique per process, so every instance rotates its own bitmaps.
    #[default]
    PlainTimestamp,
    /// Truncate the timestamp to the rotation period before suffixing.
    /// Instances sharing a backend and a period then derive identical keys
    /// for the same window and share generation bitmaps.
    TruncatedTime,
}

/// Rotation schedule. When disabled the factory produces a plain filter.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct RotatorConfig {
    #[builder(default = "false")]
    pub enabled: bool,

    /// Duration of one rotation window
    #[builder(default = "Duration::from_secs(3600)")]
    pub period: Duration,

    /// Margin added to backend TTLs, see [`DEFAULT_GRACE_PERIOD`]
    #[builder(default = "DEFAULT_GRACE_PERIOD")]
    pub grace_period: Duration,

    /// How generation keys are derived on named-storage backends
    #[builder(default)]
    pub mode: RotatorMode,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: Duration::from_secs(3600),
            grace_period: DEFAULT_GRACE_PERIOD,
            mode: RotatorMode::default(),
        }
    }
}

impl RotatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.period.is_zero() {
            return Err(FilterError::InvalidConfig(
                "rotation period must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Connection parameters for the redis bitmap backend.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct RedisConfig {
    pub url: String,

    /// Key the bitmap is stored under. With rotation enabled each
    /// generation gets a timestamp suffix appended to this key; the
    /// suffix scheme is chosen by [`RotatorMode`].
    pub key: String,

    /// Read/write timeout for the connection
    #[builder(default)]
    pub timeout: Option<Duration>,
}

impl RedisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(FilterError::InvalidConfig("empty redis url".into()));
        }
        if self.key.is_empty() {
            return Err(FilterError::InvalidConfig("empty redis key".into()));
        }
        Ok(())
    }
}

/// Everything the factory needs to build a filter, rotating or not.
#[derive(Clone, Debug, Builder, Default)]
#[builder(pattern = "owned")]
pub struct FactoryConfig {
    #[builder(default)]
    pub filter: FilterConfig,

    #[builder(default)]
    pub backend: BitmapBackend,

    #[builder(default)]
    pub redis: Option<RedisConfig>,

    #[builder(default)]
    pub rotator: RotatorConfig,
}

impl FactoryConfig {
    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.rotator.validate()?;
        #[cfg(feature = "redis")]
        if self.backend == BitmapBackend::Redis {
            match &self.redis {
                Some(redis) => redis.validate()?,
                None => {
                    return Err(FilterError::InvalidConfig(
                        "redis backend selected but no redis config given".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}
