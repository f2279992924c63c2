//! Builds the response envelope from a filtered selection.

use std::cmp::Reverse;

use eesa_api_types::{
    CategoryEntry, DepartmentEntry, Envelope, ResourceEntry, ResourceSubject, SchemeEntry,
    SchemeRef, SemesterEntry, SubjectEntry,
};

use crate::domain::entities::{ResourceRecord, SchemeRecord};
use crate::domain::filter::Selection;
use crate::domain::hierarchy::{CatalogHierarchy, SubjectNode};
use crate::domain::types::{DEPARTMENTS, ResourceCategory, Semester, SortOrder};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn scheme_entries(hierarchy: &CatalogHierarchy) -> Vec<SchemeEntry> {
    hierarchy
        .schemes()
        .iter()
        .map(|scheme| SchemeEntry {
            id: scheme.id,
            name: scheme.name.clone(),
            year: scheme.year,
            is_active: scheme.is_active,
        })
        .collect()
}

pub fn category_entries() -> Vec<CategoryEntry> {
    ResourceCategory::ALL
        .into_iter()
        .map(|category| CategoryEntry {
            value: category,
            label: category.label().to_string(),
        })
        .collect()
}

pub fn department_entries() -> Vec<DepartmentEntry> {
    DEPARTMENTS
        .iter()
        .map(|(code, label)| DepartmentEntry {
            code: (*code).to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

pub fn semester_entries() -> Vec<SemesterEntry> {
    Semester::all()
        .map(|semester| SemesterEntry {
            value: semester.get(),
            label: semester.label(),
        })
        .collect()
}

/// Merge a selection with the unfiltered reference lists.
///
/// Resources are denormalized with their parent chain and ordered by `sort`:
/// recency keeps subject grouping and puts the newest first within each
/// subject; popularity orders globally by likes then downloads.
pub fn assemble(
    hierarchy: &CatalogHierarchy,
    selection: &Selection<'_>,
    sort: SortOrder,
) -> Envelope {
    let subjects = selection
        .subjects
        .iter()
        .filter_map(|subject| {
            let scheme = hierarchy.scheme(subject.scheme_id())?;
            Some(subject_entry(subject, scheme))
        })
        .collect();

    let mut resources: Vec<&ResourceRecord> = selection.resources.clone();
    match sort {
        SortOrder::Recency => resources.sort_by_key(|resource| {
            (
                hierarchy.subject_position(resource.subject_id),
                Reverse(resource.created_at),
                Reverse(resource.id),
            )
        }),
        SortOrder::Popularity => resources.sort_by_key(|resource| {
            (
                Reverse(resource.like_count),
                Reverse(resource.download_count),
                Reverse(resource.created_at),
                Reverse(resource.id),
            )
        }),
    }

    let resources = resources
        .into_iter()
        .filter_map(|resource| {
            let (subject, scheme) = hierarchy.lineage(resource)?;
            Some(resource_entry(resource, subject, scheme))
        })
        .collect();

    Envelope {
        schemes: scheme_entries(hierarchy),
        categories: category_entries(),
        departments: department_entries(),
        semesters: semester_entries(),
        subjects,
        resources,
    }
}

fn scheme_ref(scheme: &SchemeRecord) -> SchemeRef {
    SchemeRef {
        id: scheme.id,
        name: scheme.name.clone(),
        year: scheme.year,
    }
}

fn subject_entry(subject: &SubjectNode, scheme: &SchemeRecord) -> SubjectEntry {
    SubjectEntry {
        id: subject.id(),
        code: subject.record.code.clone(),
        name: subject.record.name.clone(),
        semester: subject.semester.get(),
        department: subject.record.department.clone(),
        credits: subject.record.credits,
        scheme: scheme_ref(scheme),
    }
}

fn resource_entry(
    resource: &ResourceRecord,
    subject: &SubjectNode,
    scheme: &SchemeRecord,
) -> ResourceEntry {
    ResourceEntry {
        id: resource.id,
        title: resource.title.clone(),
        description: resource.description.clone(),
        category: resource.category,
        module_number: (resource.category == ResourceCategory::Notes)
            .then_some(resource.module_number),
        file_url: resource.file_url.clone(),
        file_size: resource.file_size,
        file_size_mb: file_size_mb(resource.file_size),
        created_at: resource.created_at,
        like_count: resource.like_count,
        download_count: resource.download_count,
        subject: ResourceSubject {
            id: subject.id(),
            code: subject.record.code.clone(),
            name: subject.record.name.clone(),
            department: subject.record.department.clone(),
            semester: subject.semester.get(),
            scheme: scheme_ref(scheme),
        },
    }
}

fn file_size_mb(bytes: Option<i64>) -> f64 {
    match bytes {
        Some(bytes) if bytes > 0 => (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::SubjectRecord;
    use crate::domain::filter::{SnapshotFilter, evaluate};

    fn hierarchy() -> CatalogHierarchy {
        let scheme = SchemeRecord {
            id: 1,
            year: 2019,
            name: "Scheme 2019".to_string(),
            is_active: true,
            created_at: datetime!(2019-06-01 00:00 UTC),
        };
        let subjects = [(10, "CS201", 3), (11, "CS301", 5)]
            .into_iter()
            .map(|(id, code, semester)| SubjectRecord {
                id,
                code: code.to_string(),
                name: format!("Subject {code}"),
                scheme_id: 1,
                semester,
                department: "CS".to_string(),
                credits: 4,
                created_at: datetime!(2019-06-01 00:00 UTC),
            })
            .collect();
        let resources = vec![
            resource(100, 11, ResourceCategory::Notes, 5, datetime!(2024-01-03 00:00 UTC)),
            resource(101, 10, ResourceCategory::Pyq, 9, datetime!(2024-01-01 00:00 UTC)),
            resource(102, 10, ResourceCategory::Notes, 1, datetime!(2024-01-02 00:00 UTC)),
            resource(103, 11, ResourceCategory::Textbook, 9, datetime!(2024-01-01 00:00 UTC)),
        ];
        CatalogHierarchy::build(1, vec![scheme], subjects, resources).hierarchy
    }

    fn resource(
        id: i64,
        subject_id: i64,
        category: ResourceCategory,
        likes: i64,
        created_at: time::OffsetDateTime,
    ) -> ResourceRecord {
        ResourceRecord {
            id,
            title: format!("Resource {id}"),
            description: String::new(),
            category,
            subject_id,
            file_url: Some(format!("/media/{id}.pdf")),
            file_size: Some(1_572_864),
            module_number: 2,
            is_approved: true,
            created_at,
            like_count: likes,
            download_count: 0,
        }
    }

    #[test]
    fn recency_groups_by_subject_then_newest_first() {
        let hierarchy = hierarchy();
        let selection = evaluate(&hierarchy, &SnapshotFilter::default());
        let envelope = assemble(&hierarchy, &selection, SortOrder::Recency);

        let ids: Vec<i64> = envelope.resources.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![102, 101, 100, 103]);
    }

    #[test]
    fn popularity_sorts_globally() {
        let hierarchy = hierarchy();
        let selection = evaluate(&hierarchy, &SnapshotFilter::default());
        let envelope = assemble(&hierarchy, &selection, SortOrder::Popularity);

        let ids: Vec<i64> = envelope.resources.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![103, 101, 100, 102]);
    }

    #[test]
    fn reference_lists_are_complete() {
        let hierarchy = hierarchy();
        let envelope = assemble(&hierarchy, &Selection::default(), SortOrder::Recency);

        assert_eq!(envelope.schemes.len(), 1);
        assert_eq!(envelope.categories.len(), ResourceCategory::ALL.len());
        assert_eq!(envelope.departments.len(), DEPARTMENTS.len());
        assert_eq!(envelope.semesters.len(), 8);
        assert_eq!(envelope.semesters[0].label, "Semester 1");
        assert!(envelope.subjects.is_empty());
        assert!(envelope.resources.is_empty());
    }

    #[test]
    fn module_number_only_for_notes() {
        let hierarchy = hierarchy();
        let selection = evaluate(&hierarchy, &SnapshotFilter::default());
        let envelope = assemble(&hierarchy, &selection, SortOrder::Recency);

        for entry in &envelope.resources {
            match entry.category {
                ResourceCategory::Notes => assert_eq!(entry.module_number, Some(2)),
                _ => assert_eq!(entry.module_number, None),
            }
            assert_eq!(entry.file_size_mb, 1.5);
            assert_eq!(entry.subject.scheme.year, 2019);
        }
    }
}
