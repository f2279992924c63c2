//! Snapshot cache.
//!
//! Assembled envelopes are stored under a key derived from the entity-set
//! version and the normalized filter. A write bumps the version, so entries
//! for older versions are never looked up again and simply age out.
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"   # or "redis"
//! ttl_seconds = 300
//! capacity = 256
//! ```

mod config;
mod keys;
mod layer;
pub(crate) mod lock;
mod remote;
mod store;

pub use config::{
    CacheBackendKind, CacheConfig, DEFAULT_CAPACITY, DEFAULT_OPERATION_TIMEOUT_MS,
    DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS,
};
pub use keys::{SNAPSHOT_KEY_PREFIX, SnapshotKey};
pub use layer::SnapshotCache;
pub use remote::RedisBackend;
pub use store::{CacheBackend, CacheError, MemoryBackend};
