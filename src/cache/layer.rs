//! Fail-open wrapper around a [`CacheBackend`].
//!
//! Backend errors, timeouts and undecodable entries are logged and counted
//! but never returned: the caller sees a miss and recomputes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use eesa_api_types::Envelope;
use metrics::counter;
use tracing::{debug, warn};

use super::config::{CacheBackendKind, CacheConfig};
use super::keys::SnapshotKey;
use super::remote::RedisBackend;
use super::store::{CacheBackend, CacheError, MemoryBackend};

const METRIC_CACHE_HIT: &str = "catalog_snapshot_cache_hit_total";
const METRIC_CACHE_MISS: &str = "catalog_snapshot_cache_miss_total";
const METRIC_CACHE_DEGRADED: &str = "catalog_snapshot_cache_degraded_total";

#[derive(Clone)]
pub struct SnapshotCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    operation_timeout: Duration,
}

impl SnapshotCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend: Some(backend),
            ttl: config.ttl(),
            operation_timeout: config.operation_timeout(),
        }
    }

    /// A cache that never hits and never stores.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::ZERO,
            operation_timeout: Duration::ZERO,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        let backend: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new(config)),
            CacheBackendKind::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    CacheError::Unavailable("redis backend requires `cache.redis_url`".to_string())
                })?;
                Arc::new(RedisBackend::new(url)?)
            }
        };
        Ok(Self::new(backend, config))
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend
            .as_ref()
            .map_or("disabled", |backend| backend.name())
    }

    pub async fn lookup(&self, key: &SnapshotKey) -> Option<Envelope> {
        let Some(backend) = &self.backend else {
            counter!(METRIC_CACHE_MISS).increment(1);
            return None;
        };

        let bytes = match self.bounded("get", backend.get(key.as_str())).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                debug!(key = %key, "Snapshot cache miss");
                return None;
            }
            Err(err) => {
                self.degraded("get", &err);
                counter!(METRIC_CACHE_MISS).increment(1);
                return None;
            }
        };

        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(envelope) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(key = %key, "Snapshot cache hit");
                Some(envelope)
            }
            Err(err) => {
                warn!(
                    key = %key,
                    error = %err,
                    "Discarding undecodable snapshot cache entry"
                );
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    pub async fn store(&self, key: &SnapshotKey, envelope: &Envelope) {
        let Some(backend) = &self.backend else {
            return;
        };

        let bytes = match serde_json::to_vec(envelope) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to encode snapshot for caching");
                return;
            }
        };

        if let Err(err) = self
            .bounded("put", backend.put(key.as_str(), bytes, self.ttl))
            .await
        {
            self.degraded("put", &err);
        }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(CacheError::Timeout {
                    op,
                    timeout_ms: u64::try_from(self.operation_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                })
            })
    }

    fn degraded(&self, op: &'static str, err: &CacheError) {
        counter!(METRIC_CACHE_DEGRADED).increment(1);
        warn!(
            op,
            backend = self.backend_name(),
            error = %err,
            result = "degraded",
            "Snapshot cache unavailable, recomputing"
        );
    }
}
