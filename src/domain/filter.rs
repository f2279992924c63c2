//! Typed request filter and its evaluation against a hierarchy.

use eesa_api_types::BatchQuery;

use crate::domain::entities::{ResourceRecord, SubjectRecord};
use crate::domain::error::ValidationError;
use crate::domain::hierarchy::{CatalogHierarchy, SubjectNode};
use crate::domain::types::{ResourceCategory, Semester, SortOrder, canonical_department};

pub const MAX_SEARCH_CHARS: usize = 200;

/// Whitespace-separated, lowercased search tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    tokens: Vec<String>,
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Option<Self>, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() > MAX_SEARCH_CHARS {
            return Err(ValidationError::new(
                "search",
                format!("must be at most {MAX_SEARCH_CHARS} characters"),
            ));
        }
        let tokens: Vec<String> = trimmed
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self { tokens }))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Canonical spelling used in cache keys.
    pub fn canonical(&self) -> String {
        self.tokens.join(" ")
    }

    /// True when every token occurs in at least one of the fields.
    pub fn matches(&self, fields: &[&str]) -> bool {
        let lowered: Vec<String> = fields.iter().map(|field| field.to_lowercase()).collect();
        self.tokens
            .iter()
            .all(|token| lowered.iter().any(|field| field.contains(token.as_str())))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFilter {
    pub scheme: Option<i64>,
    pub subject: Option<i64>,
    pub semester: Option<Semester>,
    pub department: Option<&'static str>,
    pub category: Option<ResourceCategory>,
    pub search: Option<SearchQuery>,
    pub sort: SortOrder,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn positive_id(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<i64>, ValidationError> {
    present(value)
        .map(|raw| {
            raw.parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| ValidationError::new(field, "must be a positive integer"))
        })
        .transpose()
}

impl SnapshotFilter {
    /// Validate raw request parameters. Blank parameters count as absent.
    pub fn from_query(query: &BatchQuery) -> Result<Self, ValidationError> {
        let scheme = positive_id("scheme", &query.scheme)?;
        let subject = positive_id("subject", &query.subject)?;

        let semester = present(&query.semester)
            .map(|raw| {
                raw.parse::<i64>()
                    .ok()
                    .and_then(Semester::new)
                    .ok_or_else(|| {
                        ValidationError::new(
                            "semester",
                            format!(
                                "must be an integer between {} and {}",
                                Semester::MIN,
                                Semester::MAX
                            ),
                        )
                    })
            })
            .transpose()?;

        let department = present(&query.department)
            .map(|raw| {
                canonical_department(raw).ok_or_else(|| {
                    ValidationError::new("department", format!("unknown department `{raw}`"))
                })
            })
            .transpose()?;

        let category = present(&query.category)
            .map(|raw| {
                raw.parse::<ResourceCategory>()
                    .map_err(|err| ValidationError::new("category", err.to_string()))
            })
            .transpose()?;

        let search = match query.search.as_deref() {
            Some(raw) => SearchQuery::parse(raw)?,
            None => None,
        };

        let sort = present(&query.sort)
            .map(|raw| {
                raw.parse::<SortOrder>()
                    .map_err(|err| ValidationError::new("sort", err.to_string()))
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            scheme,
            subject,
            semester,
            department,
            category,
            search,
            sort,
        })
    }

    /// Normalized parameters sorted by name. Absent filters are omitted; sort
    /// is always present.
    pub fn canonical_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(7);
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_string()));
        }
        if let Some(department) = self.department {
            pairs.push(("department", department.to_string()));
        }
        if let Some(scheme) = self.scheme {
            pairs.push(("scheme", scheme.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.canonical()));
        }
        if let Some(semester) = self.semester {
            pairs.push(("semester", semester.to_string()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        if let Some(subject) = self.subject {
            pairs.push(("subject", subject.to_string()));
        }
        pairs.sort_by_key(|(name, _)| *name);
        pairs
    }

    pub fn has_subject_predicates(&self) -> bool {
        self.scheme.is_some()
            || self.subject.is_some()
            || self.semester.is_some()
            || self.department.is_some()
    }

    /// Scheme, subject, semester and department predicates.
    pub fn matches_subject(&self, subject: &SubjectNode) -> bool {
        self.scheme.is_none_or(|id| subject.scheme_id() == id)
            && self.subject.is_none_or(|id| subject.id() == id)
            && self.semester.is_none_or(|semester| subject.semester == semester)
            && self
                .department
                .is_none_or(|department| subject.record.department.eq_ignore_ascii_case(department))
    }

    /// Subject predicates applied to a raw row, used to narrow store reads
    /// before the hierarchy is built.
    pub fn admits_subject_record(&self, subject: &SubjectRecord) -> bool {
        self.scheme.is_none_or(|id| subject.scheme_id == id)
            && self.subject.is_none_or(|id| subject.id == id)
            && self
                .semester
                .is_none_or(|semester| subject.semester == i16::from(semester.get()))
            && self
                .department
                .is_none_or(|department| subject.department.eq_ignore_ascii_case(department))
    }

    fn search_matches_subject(&self, subject: &SubjectNode) -> bool {
        self.search.as_ref().is_none_or(|search| {
            search.matches(&[subject.record.name.as_str(), subject.record.code.as_str()])
        })
    }

    fn search_matches_resource(&self, resource: &ResourceRecord, subject: &SubjectNode) -> bool {
        self.search.as_ref().is_none_or(|search| {
            search.matches(&[
                resource.title.as_str(),
                resource.description.as_str(),
                subject.record.name.as_str(),
                subject.record.code.as_str(),
            ])
        })
    }
}

/// Subjects and resources that satisfy a filter, in hierarchy order.
#[derive(Debug, Default)]
pub struct Selection<'a> {
    pub subjects: Vec<&'a SubjectNode>,
    pub resources: Vec<&'a ResourceRecord>,
}

/// Apply the filter: subject predicates first, then category, then search on
/// the already narrowed resources.
pub fn evaluate<'a>(hierarchy: &'a CatalogHierarchy, filter: &SnapshotFilter) -> Selection<'a> {
    let candidates: Box<dyn Iterator<Item = &'a SubjectNode> + 'a> = match filter.scheme {
        Some(scheme_id) => Box::new(hierarchy.subjects_under(scheme_id)),
        None => Box::new(hierarchy.subjects().iter()),
    };

    let mut selection = Selection::default();
    for subject in candidates.filter(|subject| filter.matches_subject(subject)) {
        let mut subject_hit = filter.search_matches_subject(subject);
        for resource in hierarchy.resources_under(subject.id()) {
            if !filter.search_matches_resource(resource, subject) {
                continue;
            }
            subject_hit = true;
            if filter
                .category
                .is_none_or(|category| resource.category == category)
            {
                selection.resources.push(resource);
            }
        }
        if subject_hit {
            selection.subjects.push(subject);
        }
    }
    selection
}
