use async_trait::async_trait;
use sqlx::{Postgres, Transaction, query, query_as, query_scalar};
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    application::repos::{CatalogReader, CatalogRepo, RepoError},
    domain::entities::{ResourceRecord, SchemeRecord, SubjectRecord},
    domain::types::ResourceCategory,
};

use super::{PostgresRepositories, map_sqlx_error, version_from_db};

const CURRENT_VERSION_SQL: &str = "SELECT version FROM catalog_version WHERE id = 1";

#[derive(sqlx::FromRow)]
struct SchemeRow {
    id: i64,
    year: i32,
    name: String,
    is_active: bool,
    created_at: OffsetDateTime,
}

impl From<SchemeRow> for SchemeRecord {
    fn from(row: SchemeRow) -> Self {
        Self {
            id: row.id,
            year: row.year,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubjectRow {
    id: i64,
    code: String,
    name: String,
    scheme_id: i64,
    semester: i16,
    department: String,
    credits: i32,
    created_at: OffsetDateTime,
}

impl From<SubjectRow> for SubjectRecord {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            scheme_id: row.scheme_id,
            semester: row.semester,
            department: row.department,
            credits: row.credits,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ResourceRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    subject_id: i64,
    file_url: Option<String>,
    file_size: Option<i64>,
    module_number: i16,
    is_approved: bool,
    created_at: OffsetDateTime,
    like_count: i64,
    download_count: i64,
}

impl From<ResourceRow> for ResourceRecord {
    fn from(row: ResourceRow) -> Self {
        let category = row.category.parse().unwrap_or_else(|_| {
            warn!(
                resource_id = row.id,
                category = %row.category,
                "Unknown resource category, treating as other"
            );
            ResourceCategory::Other
        });
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category,
            subject_id: row.subject_id,
            file_url: row.file_url,
            file_size: row.file_size,
            module_number: row.module_number,
            is_approved: row.is_approved,
            created_at: row.created_at,
            like_count: row.like_count,
            download_count: row.download_count,
        }
    }
}

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn current_version(&self) -> Result<u64, RepoError> {
        let version: i64 = query_scalar(CURRENT_VERSION_SQL)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        version_from_db(version)
    }

    async fn begin_read(&self) -> Result<Box<dyn CatalogReader>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;
        query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Box::new(PgCatalogReader { tx }))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

/// Reads inside one `REPEATABLE READ` transaction, so every query sees the
/// same database snapshot. The transaction rolls back when dropped.
struct PgCatalogReader {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogReader for PgCatalogReader {
    async fn current_version(&mut self) -> Result<u64, RepoError> {
        let version: i64 = query_scalar(CURRENT_VERSION_SQL)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        version_from_db(version)
    }

    async fn fetch_schemes(&mut self) -> Result<Vec<SchemeRecord>, RepoError> {
        let rows = query_as::<_, SchemeRow>(
            r#"
            SELECT id, year, name, is_active, created_at
            FROM schemes
            ORDER BY year DESC, id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SchemeRecord::from).collect())
    }

    async fn fetch_subjects(
        &mut self,
        scheme_id: Option<i64>,
    ) -> Result<Vec<SubjectRecord>, RepoError> {
        let rows = query_as::<_, SubjectRow>(
            r#"
            SELECT id, code, name, scheme_id, semester, department, credits, created_at
            FROM subjects
            WHERE ($1::BIGINT IS NULL OR scheme_id = $1)
            ORDER BY scheme_id, semester, name, id
            "#,
        )
        .bind(scheme_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubjectRecord::from).collect())
    }

    async fn fetch_approved_resources(
        &mut self,
        subject_ids: Option<&[i64]>,
    ) -> Result<Vec<ResourceRecord>, RepoError> {
        let rows = query_as::<_, ResourceRow>(
            r#"
            SELECT id, title, description, category, subject_id, file_url, file_size,
                   module_number, is_approved, created_at, like_count, download_count
            FROM academic_resources
            WHERE is_approved
              AND ($1::BIGINT[] IS NULL OR subject_id = ANY($1))
            ORDER BY subject_id, created_at DESC, id DESC
            "#,
        )
        .bind(subject_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ResourceRecord::from).collect())
    }
}
