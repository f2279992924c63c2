//! In-process catalog store.
//!
//! Every write clones the current generation, applies the change and swaps
//! in a new `Arc` with the version incremented. Readers hold the generation
//! they started with, so a reader never observes a write made after it began.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::application::repos::{CatalogReader, CatalogRepo, RepoError};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{ResourceRecord, SchemeRecord, SubjectRecord};

const SOURCE: &str = "infra::memory";

#[derive(Debug, Clone, Default)]
pub struct CatalogData {
    pub schemes: Vec<SchemeRecord>,
    pub subjects: Vec<SubjectRecord>,
    pub resources: Vec<ResourceRecord>,
}

#[derive(Debug)]
struct Generation {
    version: u64,
    data: CatalogData,
}

pub struct InMemoryCatalog {
    current: RwLock<Arc<Generation>>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(CatalogData::default())
    }
}

impl InMemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation { version: 1, data })),
        }
    }

    fn snapshot(&self) -> Arc<Generation> {
        Arc::clone(&rw_read(&self.current, SOURCE, "snapshot"))
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Apply a write and publish it as a new generation. Returns the new version.
    pub fn mutate(&self, apply: impl FnOnce(&mut CatalogData)) -> u64 {
        let mut current = rw_write(&self.current, SOURCE, "mutate");
        let mut data = current.data.clone();
        apply(&mut data);
        let version = current.version + 1;
        *current = Arc::new(Generation { version, data });
        version
    }

    pub fn replace(&self, data: CatalogData) -> u64 {
        self.mutate(|current| *current = data)
    }

    /// Invalidate without changing data.
    pub fn bump_version(&self) -> u64 {
        self.mutate(|_| {})
    }

    pub fn upsert_scheme(&self, scheme: SchemeRecord) -> u64 {
        self.mutate(|data| upsert(&mut data.schemes, scheme, |s| s.id))
    }

    pub fn upsert_subject(&self, subject: SubjectRecord) -> u64 {
        self.mutate(|data| upsert(&mut data.subjects, subject, |s| s.id))
    }

    pub fn upsert_resource(&self, resource: ResourceRecord) -> u64 {
        self.mutate(|data| upsert(&mut data.resources, resource, |r| r.id))
    }

    pub fn remove_resource(&self, id: i64) -> u64 {
        self.mutate(|data| data.resources.retain(|resource| resource.id != id))
    }

    pub fn set_approval(&self, id: i64, approved: bool) -> u64 {
        self.mutate(|data| {
            if let Some(resource) = data.resources.iter_mut().find(|resource| resource.id == id) {
                resource.is_approved = approved;
            }
        })
    }
}

fn upsert<T>(rows: &mut Vec<T>, row: T, id: impl Fn(&T) -> i64) {
    let row_id = id(&row);
    match rows.iter_mut().find(|existing| id(existing) == row_id) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

#[async_trait]
impl CatalogRepo for InMemoryCatalog {
    async fn current_version(&self) -> Result<u64, RepoError> {
        Ok(self.version())
    }

    async fn begin_read(&self) -> Result<Box<dyn CatalogReader>, RepoError> {
        Ok(Box::new(MemoryReader {
            generation: self.snapshot(),
        }))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

struct MemoryReader {
    generation: Arc<Generation>,
}

#[async_trait]
impl CatalogReader for MemoryReader {
    async fn current_version(&mut self) -> Result<u64, RepoError> {
        Ok(self.generation.version)
    }

    async fn fetch_schemes(&mut self) -> Result<Vec<SchemeRecord>, RepoError> {
        Ok(self.generation.data.schemes.clone())
    }

    async fn fetch_subjects(
        &mut self,
        scheme_id: Option<i64>,
    ) -> Result<Vec<SubjectRecord>, RepoError> {
        Ok(self
            .generation
            .data
            .subjects
            .iter()
            .filter(|subject| scheme_id.is_none_or(|id| subject.scheme_id == id))
            .cloned()
            .collect())
    }

    async fn fetch_approved_resources(
        &mut self,
        subject_ids: Option<&[i64]>,
    ) -> Result<Vec<ResourceRecord>, RepoError> {
        let wanted: Option<HashSet<i64>> = subject_ids.map(|ids| ids.iter().copied().collect());
        Ok(self
            .generation
            .data
            .resources
            .iter()
            .filter(|resource| resource.is_approved)
            .filter(|resource| {
                wanted
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&resource.subject_id))
            })
            .cloned()
            .collect())
    }
}
