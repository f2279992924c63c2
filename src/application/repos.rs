//! Store read interface consumed by the snapshot façade.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ResourceRecord, SchemeRecord, SubjectRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Entry point to the catalog store, shared across requests.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Entity-set version; bumped by every write to schemes, subjects or resources.
    async fn current_version(&self) -> Result<u64, RepoError>;

    /// Open a reader bound to one consistent store generation.
    async fn begin_read(&self) -> Result<Box<dyn CatalogReader>, RepoError>;

    async fn ping(&self) -> Result<(), RepoError>;
}

/// Reads from one store generation. Owned by a single miss-path execution.
#[async_trait]
pub trait CatalogReader: Send {
    async fn current_version(&mut self) -> Result<u64, RepoError>;

    async fn fetch_schemes(&mut self) -> Result<Vec<SchemeRecord>, RepoError>;

    /// All subjects, or those of one scheme.
    async fn fetch_subjects(
        &mut self,
        scheme_id: Option<i64>,
    ) -> Result<Vec<SubjectRecord>, RepoError>;

    /// Approved resources, optionally restricted to a batch of subjects.
    async fn fetch_approved_resources(
        &mut self,
        subject_ids: Option<&[i64]>,
    ) -> Result<Vec<ResourceRecord>, RepoError>;
}
