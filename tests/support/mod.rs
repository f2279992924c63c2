#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eesa_catalog::application::repos::{CatalogReader, CatalogRepo, RepoError};
use eesa_catalog::application::snapshot::SnapshotService;
use eesa_catalog::cache::{CacheConfig, MemoryBackend, SnapshotCache};
use eesa_catalog::domain::entities::{ResourceRecord, SchemeRecord, SubjectRecord};
use eesa_catalog::domain::types::ResourceCategory;
use eesa_catalog::infra::memory::{CatalogData, InMemoryCatalog};
use time::OffsetDateTime;

pub const MISS_TIMEOUT: Duration = Duration::from_secs(5);

fn at(offset_minutes: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000 + offset_minutes * 60)
        .expect("fixture timestamp in range")
}

fn scheme(id: i64, year: i32) -> SchemeRecord {
    SchemeRecord {
        id,
        year,
        name: format!("{year} Scheme"),
        is_active: year >= 2019,
        created_at: at(id),
    }
}

fn subject(id: i64, code: &str, name: &str, semester: i16, department: &str) -> SubjectRecord {
    SubjectRecord {
        id,
        code: code.to_string(),
        name: name.to_string(),
        scheme_id: id / 10,
        semester,
        department: department.to_string(),
        credits: 4,
        created_at: at(id),
    }
}

/// Five resources per subject, ids `subject * 10 + 1..=5`; the fifth is unapproved.
fn resources_for(subject: &SubjectRecord) -> Vec<ResourceRecord> {
    (1..=5)
        .map(|n| {
            let id = subject.id * 10 + n;
            let category = match n {
                1 | 2 | 5 => ResourceCategory::Notes,
                3 => ResourceCategory::Pyq,
                _ => ResourceCategory::Textbook,
            };
            ResourceRecord {
                id,
                title: format!("{} Part {n}", subject.name),
                description: String::new(),
                category,
                subject_id: subject.id,
                file_url: Some(format!("https://files.example/{id}.pdf")),
                file_size: Some(1_048_576 * n),
                module_number: if category == ResourceCategory::Notes { n as i16 } else { 0 },
                is_approved: n != 5,
                created_at: at(id),
                like_count: id % 7,
                download_count: id % 11,
            }
        })
        .collect()
}

/// Three schemes, two subjects each, five resources per subject (four approved).
///
/// Subject 11 carries the code `CS301-Algorithms` and resource 211 is titled
/// `Algorithms Notes`; nothing else mentions algorithms.
pub fn catalog_data() -> CatalogData {
    let schemes = vec![scheme(1, 2019), scheme(2, 2015), scheme(3, 2024)];
    let subjects = vec![
        subject(11, "CS301-Algorithms", "Design and Analysis", 5, "CS"),
        subject(12, "EC201", "Signals and Systems", 3, "ECE"),
        subject(21, "CS302", "Database Management", 5, "CS"),
        subject(22, "ME101", "Engineering Mechanics", 1, "ME"),
        subject(31, "CS401", "Compiler Design", 7, "CS"),
        subject(32, "EE202", "Electric Circuits", 3, "EEE"),
    ];
    let mut resources: Vec<ResourceRecord> = subjects.iter().flat_map(resources_for).collect();
    if let Some(resource) = resources.iter_mut().find(|resource| resource.id == 211) {
        resource.title = "Algorithms Notes".to_string();
    }
    CatalogData {
        schemes,
        subjects,
        resources,
    }
}

pub fn memory_cache() -> SnapshotCache {
    let config = CacheConfig::default();
    SnapshotCache::new(Arc::new(MemoryBackend::new(&config)), &config)
}

pub fn service(store: Arc<dyn CatalogRepo>, cache: SnapshotCache) -> SnapshotService {
    SnapshotService::new(store, cache, MISS_TIMEOUT)
}

pub fn seeded() -> (Arc<InMemoryCatalog>, SnapshotService) {
    let catalog = Arc::new(InMemoryCatalog::new(catalog_data()));
    let store: Arc<dyn CatalogRepo> = catalog.clone();
    (catalog, service(store, memory_cache()))
}

/// Store wrapper that can fail version reads or stall readers on demand.
pub struct FlakyStore {
    inner: InMemoryCatalog,
    failing: AtomicBool,
    read_delay: Option<Duration>,
    version_delay: Option<Duration>,
}

impl FlakyStore {
    pub fn new(read_delay: Option<Duration>) -> Self {
        Self {
            inner: InMemoryCatalog::new(catalog_data()),
            failing: AtomicBool::new(false),
            read_delay,
            version_delay: None,
        }
    }

    /// Also stall every version read by `delay`.
    pub fn with_version_delay(mut self, delay: Duration) -> Self {
        self.version_delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepo for FlakyStore {
    async fn current_version(&self) -> Result<u64, RepoError> {
        self.check()?;
        if let Some(delay) = self.version_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.current_version().await
    }

    async fn begin_read(&self) -> Result<Box<dyn CatalogReader>, RepoError> {
        self.check()?;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.begin_read().await
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.check()
    }
}
