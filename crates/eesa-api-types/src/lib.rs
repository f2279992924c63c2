//! Wire types for the academic catalog batch API.
//!
//! The server builds these directly from its in-memory projection so the
//! cached representation and the HTTP body are the same bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Kind of academic resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Notes,
    Textbook,
    Pyq,
    Regulations,
    Syllabus,
    Other,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 6] = [
        ResourceCategory::Notes,
        ResourceCategory::Textbook,
        ResourceCategory::Pyq,
        ResourceCategory::Regulations,
        ResourceCategory::Syllabus,
        ResourceCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceCategory::Notes => "notes",
            ResourceCategory::Textbook => "textbook",
            ResourceCategory::Pyq => "pyq",
            ResourceCategory::Regulations => "regulations",
            ResourceCategory::Syllabus => "syllabus",
            ResourceCategory::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceCategory::Notes => "Notes",
            ResourceCategory::Textbook => "Textbooks",
            ResourceCategory::Pyq => "Previous Year Questions",
            ResourceCategory::Regulations => "Regulations",
            ResourceCategory::Syllabus => "Syllabus",
            ResourceCategory::Other => "Other",
        }
    }
}

impl FromStr for ResourceCategory {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ResourceCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "category",
                value: value.to_string(),
            })
    }
}

/// Ordering applied to the filtered resource list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Recency,
    Popularity,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Recency => "recency",
            SortOrder::Popularity => "popularity",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recency" => Ok(SortOrder::Recency),
            "popularity" => Ok(SortOrder::Popularity),
            _ => Err(ParseEnumError {
                kind: "sort",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }

    /// Value used for the `X-Cache-Status` response header.
    pub fn header_value(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Raw query parameters accepted by the batch endpoint.
///
/// Every field is optional and loosely typed; the server validates them into
/// a typed filter before evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchQuery {
    pub scheme: Option<String>,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeEntry {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeRef {
    pub id: i64,
    pub name: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub value: ResourceCategory,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentEntry {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterEntry {
    pub value: u8,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub semester: u8,
    pub department: String,
    pub credits: i32,
    pub scheme: SchemeRef,
}

/// Parent chain denormalized onto every resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSubject {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub department: String,
    pub semester: u8,
    pub scheme: SchemeRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    pub module_number: Option<i16>,
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    pub file_size_mb: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub like_count: i64,
    pub download_count: i64,
    pub subject: ResourceSubject,
}

/// Everything a catalog page needs in one payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub schemes: Vec<SchemeEntry>,
    pub categories: Vec<CategoryEntry>,
    pub departments: Vec<DepartmentEntry>,
    pub semesters: Vec<SemesterEntry>,
    pub subjects: Vec<SubjectEntry>,
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub cache_status: CacheStatus,
    pub took_ms: u64,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub meta: SnapshotMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("PYQ".parse::<ResourceCategory>(), Ok(ResourceCategory::Pyq));
        assert_eq!(
            " notes ".parse::<ResourceCategory>(),
            Ok(ResourceCategory::Notes)
        );
        assert!("slides".parse::<ResourceCategory>().is_err());
    }

    #[test]
    fn sort_defaults_to_recency() {
        assert_eq!(SortOrder::default(), SortOrder::Recency);
        assert_eq!("Popularity".parse::<SortOrder>(), Ok(SortOrder::Popularity));
    }

    #[test]
    fn meta_uses_camel_case_fields() {
        let meta = SnapshotMeta {
            cache_status: CacheStatus::Hit,
            took_ms: 3,
            version: 9,
        };
        let json = serde_json::to_value(&meta).expect("meta serializes");
        assert_eq!(json["cacheStatus"], "hit");
        assert_eq!(json["tookMs"], 3);
    }

    #[test]
    fn error_body_omits_absent_field() {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: "timeout".to_string(),
                message: "Snapshot timed out".to_string(),
                field: None,
                hint: None,
            },
        };
        let json = serde_json::to_string(&body).expect("body serializes");
        assert!(!json.contains("field"));
    }
}
