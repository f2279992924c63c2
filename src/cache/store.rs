//! Cache backends.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache {op} timed out after {timeout_ms}ms")]
    Timeout { op: &'static str, timeout_ms: u64 },
}

impl CacheError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Byte-oriented key/value store with per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn put(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;
}

struct MemoryEntry {
    value: Bytes,
    /// `None` when the TTL does not fit in an `Instant`.
    expires_at: Option<Instant>,
}

/// In-process LRU bounded by entry count.
pub struct MemoryBackend {
    entries: RwLock<LruCache<String, MemoryEntry>>,
}

impl MemoryBackend {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "memory_get");
        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at.is_none_or(|at| Instant::now() < at) => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }
        entries.pop(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        rw_write(&self.entries, SOURCE, "memory_put").put(key.to_string(), entry);
        Ok(())
    }
}
