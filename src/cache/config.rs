//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_TTL_SECONDS: u64 = 300;
pub const DEFAULT_CAPACITY: usize = 256;
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 250;
/// Longest accepted entry lifetime (30 days).
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Redis,
}

impl CacheBackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false every lookup is a miss and nothing is stored.
    pub enabled: bool,
    pub backend: CacheBackendKind,
    /// Required for the redis backend.
    pub redis_url: Option<String>,
    /// Per-entry time-to-live.
    pub ttl_seconds: u64,
    /// Maximum entries held by the memory backend.
    pub capacity: usize,
    /// Upper bound for a single backend round trip.
    pub operation_timeout_ms: u64,
    /// Compute and store the unfiltered snapshot at startup.
    pub warm_on_startup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackendKind::Memory,
            redis_url: None,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            capacity: DEFAULT_CAPACITY,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            warm_on_startup: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            ttl_seconds: settings.ttl_seconds,
            capacity: settings.capacity,
            operation_timeout_ms: settings.operation_timeout_ms,
            warm_on_startup: settings.warm_on_startup,
        }
    }
}

impl CacheConfig {
    /// Capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Entry lifetime, capped at [`MAX_TTL_SECONDS`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.min(MAX_TTL_SECONDS))
    }

    /// Operation timeout, at least one millisecond.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms.max(1))
    }
}
