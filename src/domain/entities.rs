//! Catalog rows as read from the relational store.

use time::OffsetDateTime;

use crate::domain::types::ResourceCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeRecord {
    pub id: i64,
    pub year: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub scheme_id: i64,
    pub semester: i16,
    pub department: String,
    pub credits: i32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    pub subject_id: i64,
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    /// 0 means general/complete; only meaningful for notes.
    pub module_number: i16,
    pub is_approved: bool,
    pub created_at: OffsetDateTime,
    pub like_count: i64,
    pub download_count: i64,
}
