//! Batch query façade.
//!
//! `get_batch_snapshot` is the single entry point for catalog pages. It keys
//! the cache by the current entity-set version and the normalized filter; on
//! a miss it reads one consistent store generation, builds the hierarchy,
//! filters, assembles and stores the envelope under the version it was read
//! at. The version read and the miss path share one deadline. Concurrent
//! misses for the same key each recompute independently.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use eesa_api_types::{BatchQuery, CacheStatus, Envelope, SnapshotMeta};
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::assembler::assemble;
use crate::application::repos::{CatalogRepo, RepoError};
use crate::cache::{SnapshotCache, SnapshotKey};
use crate::domain::error::ValidationError;
use crate::domain::filter::{SnapshotFilter, evaluate};
use crate::domain::hierarchy::CatalogHierarchy;

const METRIC_INTEGRITY_DROPPED: &str = "catalog_snapshot_integrity_dropped_total";
const METRIC_MISS_MS: &str = "catalog_snapshot_miss_ms";

pub const DEFAULT_MISS_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("catalog store unavailable")]
    StoreUnavailable(#[source] RepoError),
    #[error("snapshot exceeded its {budget_ms}ms budget")]
    Timeout { budget_ms: u64 },
}

impl From<RepoError> for SnapshotError {
    fn from(err: RepoError) -> Self {
        SnapshotError::StoreUnavailable(err)
    }
}

/// An assembled envelope plus how it was produced.
#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    pub envelope: Arc<Envelope>,
    pub meta: SnapshotMeta,
}

pub struct SnapshotService {
    store: Arc<dyn CatalogRepo>,
    cache: SnapshotCache,
    miss_timeout: Duration,
    /// Last version observed, offset by one so zero means none.
    last_version: AtomicU64,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn CatalogRepo>, cache: SnapshotCache, miss_timeout: Duration) -> Self {
        Self {
            store,
            cache,
            miss_timeout,
            last_version: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Validate raw parameters, then serve the snapshot.
    pub async fn get_batch_snapshot_for_query(
        &self,
        query: &BatchQuery,
    ) -> Result<BatchSnapshot, SnapshotError> {
        let filter = SnapshotFilter::from_query(query)?;
        self.get_batch_snapshot(&filter).await
    }

    pub async fn get_batch_snapshot(
        &self,
        filter: &SnapshotFilter,
    ) -> Result<BatchSnapshot, SnapshotError> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now().checked_add(self.miss_timeout);

        let version = match self.within(deadline, self.store.current_version()).await {
            Ok(version) => {
                self.remember(version);
                version
            }
            Err(err) => return self.serve_last_known(filter, err, started).await,
        };

        let key = SnapshotKey::new(version, filter);
        if let Some(envelope) = self.cache.lookup(&key).await {
            return Ok(finish(envelope, CacheStatus::Hit, version, started));
        }

        let (envelope, read_version) = self.within(deadline, self.compute(filter)).await?;
        self.remember(read_version);

        let key = if read_version == version {
            key
        } else {
            SnapshotKey::new(read_version, filter)
        };
        self.cache.store(&key, &envelope).await;

        let snapshot = finish(envelope, CacheStatus::Miss, read_version, started);
        histogram!(METRIC_MISS_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        debug!(
            version = read_version,
            took_ms = snapshot.meta.took_ms,
            resources = snapshot.envelope.resources.len(),
            "Assembled catalog snapshot"
        );
        Ok(snapshot)
    }

    /// Compute and cache the unfiltered snapshot.
    pub async fn warm(&self) -> Result<BatchSnapshot, SnapshotError> {
        let snapshot = self.get_batch_snapshot(&SnapshotFilter::default()).await?;
        info!(
            version = snapshot.meta.version,
            cache_status = snapshot.meta.cache_status.as_str(),
            backend = self.cache.backend_name(),
            "Warmed catalog snapshot"
        );
        Ok(snapshot)
    }

    /// Run `fut` against the call's shared deadline. A deadline too far out
    /// to represent never fires.
    async fn within<T, E>(
        &self,
        deadline: Option<tokio::time::Instant>,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, SnapshotError>
    where
        SnapshotError: From<E>,
    {
        let result = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| self.timeout())?,
            None => fut.await,
        };
        result.map_err(SnapshotError::from)
    }

    /// The store could not report its version. A snapshot cached for the
    /// last version this process saw is still a consistent answer.
    async fn serve_last_known(
        &self,
        filter: &SnapshotFilter,
        err: SnapshotError,
        started: Instant,
    ) -> Result<BatchSnapshot, SnapshotError> {
        let Some(version) = self.last_known_version() else {
            return Err(err);
        };
        let key = SnapshotKey::new(version, filter);
        match self.cache.lookup(&key).await {
            Some(envelope) => {
                warn!(
                    version,
                    error = %err,
                    "Catalog store unavailable, serving last known snapshot"
                );
                Ok(finish(envelope, CacheStatus::Hit, version, started))
            }
            None => Err(err),
        }
    }

    async fn compute(&self, filter: &SnapshotFilter) -> Result<(Envelope, u64), SnapshotError> {
        let mut reader = self.store.begin_read().await?;
        let version = reader.current_version().await?;
        let schemes = reader.fetch_schemes().await?;
        let mut subjects = reader.fetch_subjects(filter.scheme).await?;
        subjects.retain(|subject| filter.admits_subject_record(subject));

        let resources = if !filter.has_subject_predicates() {
            reader.fetch_approved_resources(None).await?
        } else if subjects.is_empty() {
            Vec::new()
        } else {
            let subject_ids: Vec<i64> = subjects.iter().map(|subject| subject.id).collect();
            reader.fetch_approved_resources(Some(&subject_ids)).await?
        };
        drop(reader);

        let build = CatalogHierarchy::build(version, schemes, subjects, resources);
        for issue in &build.issues {
            counter!(METRIC_INTEGRITY_DROPPED, "entity" => issue.entity()).increment(1);
            warn!(version, error = %issue, "Dropped catalog row failing integrity checks");
        }

        let hierarchy = build.hierarchy;
        let selection = evaluate(&hierarchy, filter);
        let envelope = assemble(&hierarchy, &selection, filter.sort);
        Ok((envelope, version))
    }

    fn remember(&self, version: u64) {
        self.last_version
            .fetch_max(version.saturating_add(1), Ordering::Relaxed);
    }

    fn last_known_version(&self) -> Option<u64> {
        self.last_version
            .load(Ordering::Relaxed)
            .checked_sub(1)
    }

    fn timeout(&self) -> SnapshotError {
        SnapshotError::Timeout {
            budget_ms: duration_ms(self.miss_timeout),
        }
    }
}

fn finish(
    envelope: Envelope,
    cache_status: CacheStatus,
    version: u64,
    started: Instant,
) -> BatchSnapshot {
    BatchSnapshot {
        envelope: Arc::new(envelope),
        meta: SnapshotMeta {
            cache_status,
            took_ms: duration_ms(started.elapsed()),
            version,
        },
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
