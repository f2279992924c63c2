//! Immutable projection of one catalog generation.
//!
//! Rows are validated once on construction; anything that cannot be placed
//! under a live parent is dropped and reported back as an [`IntegrityError`]
//! so the caller can log it. After construction the projection only offers
//! read-only traversal.

use std::collections::{HashMap, HashSet};

use crate::domain::entities::{ResourceRecord, SchemeRecord, SubjectRecord};
use crate::domain::error::IntegrityError;
use crate::domain::types::{ResourceCategory, Semester};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectNode {
    pub record: SubjectRecord,
    pub semester: Semester,
}

impl SubjectNode {
    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn scheme_id(&self) -> i64 {
        self.record.scheme_id
    }
}

#[derive(Debug, Clone)]
pub struct CatalogHierarchy {
    version: u64,
    schemes: Vec<SchemeRecord>,
    subjects: Vec<SubjectNode>,
    resources: Vec<ResourceRecord>,
    scheme_index: HashMap<i64, usize>,
    subject_index: HashMap<i64, usize>,
    subjects_by_scheme: HashMap<i64, Vec<usize>>,
    resources_by_subject: HashMap<i64, Vec<usize>>,
}

/// Result of [`CatalogHierarchy::build`]: the projection plus every dropped row.
#[derive(Debug)]
pub struct HierarchyBuild {
    pub hierarchy: CatalogHierarchy,
    pub issues: Vec<IntegrityError>,
}

impl CatalogHierarchy {
    pub fn build(
        version: u64,
        mut schemes: Vec<SchemeRecord>,
        mut subjects: Vec<SubjectRecord>,
        mut resources: Vec<ResourceRecord>,
    ) -> HierarchyBuild {
        let mut issues = Vec::new();

        schemes.sort_by_key(|scheme| scheme.id);
        let mut seen = HashSet::new();
        schemes.retain(|scheme| {
            let fresh = seen.insert(scheme.id);
            if !fresh {
                issues.push(IntegrityError::DuplicateId {
                    entity: "scheme",
                    id: scheme.id,
                });
            }
            fresh
        });
        schemes.sort_by(|a, b| b.year.cmp(&a.year).then(a.id.cmp(&b.id)));
        let scheme_index: HashMap<i64, usize> = schemes
            .iter()
            .enumerate()
            .map(|(position, scheme)| (scheme.id, position))
            .collect();

        subjects.sort_by_key(|subject| subject.id);
        let mut seen = HashSet::new();
        let mut codes = HashSet::new();
        let mut nodes = Vec::with_capacity(subjects.len());
        for record in subjects {
            if !seen.insert(record.id) {
                issues.push(IntegrityError::DuplicateId {
                    entity: "subject",
                    id: record.id,
                });
                continue;
            }
            if !scheme_index.contains_key(&record.scheme_id) {
                issues.push(IntegrityError::OrphanSubject {
                    subject_id: record.id,
                    scheme_id: record.scheme_id,
                });
                continue;
            }
            let Some(semester) = Semester::new(i64::from(record.semester)) else {
                issues.push(IntegrityError::SemesterOutOfRange {
                    subject_id: record.id,
                    semester: record.semester,
                });
                continue;
            };
            if !codes.insert((record.scheme_id, record.code.clone())) {
                issues.push(IntegrityError::DuplicateSubjectCode {
                    subject_id: record.id,
                    scheme_id: record.scheme_id,
                    code: record.code.clone(),
                });
                continue;
            }
            nodes.push(SubjectNode { record, semester });
        }
        nodes.sort_by(|a, b| {
            let a_scheme = scheme_index.get(&a.scheme_id());
            let b_scheme = scheme_index.get(&b.scheme_id());
            a_scheme
                .cmp(&b_scheme)
                .then(a.semester.cmp(&b.semester))
                .then_with(|| a.record.name.cmp(&b.record.name))
                .then(a.id().cmp(&b.id()))
        });

        let mut subject_index = HashMap::with_capacity(nodes.len());
        let mut subjects_by_scheme: HashMap<i64, Vec<usize>> = HashMap::new();
        for (position, node) in nodes.iter().enumerate() {
            subject_index.insert(node.id(), position);
            subjects_by_scheme
                .entry(node.scheme_id())
                .or_default()
                .push(position);
        }

        resources.sort_by_key(|resource| resource.id);
        let mut seen = HashSet::new();
        resources.retain(|resource| {
            if !seen.insert(resource.id) {
                issues.push(IntegrityError::DuplicateId {
                    entity: "resource",
                    id: resource.id,
                });
                return false;
            }
            if !resource.is_approved {
                issues.push(IntegrityError::UnapprovedResource {
                    resource_id: resource.id,
                });
                return false;
            }
            if !subject_index.contains_key(&resource.subject_id) {
                issues.push(IntegrityError::OrphanResource {
                    resource_id: resource.id,
                    subject_id: resource.subject_id,
                });
                return false;
            }
            true
        });
        resources.sort_by(|a, b| {
            subject_index
                .get(&a.subject_id)
                .cmp(&subject_index.get(&b.subject_id))
                .then(a.id.cmp(&b.id))
        });

        let mut resources_by_subject: HashMap<i64, Vec<usize>> = HashMap::new();
        for (position, resource) in resources.iter().enumerate() {
            resources_by_subject
                .entry(resource.subject_id)
                .or_default()
                .push(position);
        }

        HierarchyBuild {
            hierarchy: CatalogHierarchy {
                version,
                schemes,
                subjects: nodes,
                resources,
                scheme_index,
                subject_index,
                subjects_by_scheme,
                resources_by_subject,
            },
            issues,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// All schemes, newest year first.
    pub fn schemes(&self) -> &[SchemeRecord] {
        &self.schemes
    }

    pub fn scheme(&self, id: i64) -> Option<&SchemeRecord> {
        self.scheme_index.get(&id).map(|&position| &self.schemes[position])
    }

    /// All subjects in presentation order.
    pub fn subjects(&self) -> &[SubjectNode] {
        &self.subjects
    }

    pub fn subject(&self, id: i64) -> Option<&SubjectNode> {
        self.subject_index
            .get(&id)
            .map(|&position| &self.subjects[position])
    }

    /// Position of a subject in presentation order.
    pub fn subject_position(&self, id: i64) -> Option<usize> {
        self.subject_index.get(&id).copied()
    }

    pub fn subjects_under(&self, scheme_id: i64) -> impl Iterator<Item = &SubjectNode> + '_ {
        self.subjects_by_scheme
            .get(&scheme_id)
            .into_iter()
            .flatten()
            .map(|&position| &self.subjects[position])
    }

    /// All approved resources, grouped by subject in presentation order.
    pub fn resources(&self) -> &[ResourceRecord] {
        &self.resources
    }

    pub fn resources_under(&self, subject_id: i64) -> impl Iterator<Item = &ResourceRecord> + '_ {
        self.resources_by_subject
            .get(&subject_id)
            .into_iter()
            .flatten()
            .map(|&position| &self.resources[position])
    }

    pub fn resources_in_category(
        &self,
        category: ResourceCategory,
    ) -> impl Iterator<Item = &ResourceRecord> + '_ {
        self.resources
            .iter()
            .filter(move |resource| resource.category == category)
    }

    /// Parent subject and scheme of a resource.
    pub fn lineage(&self, resource: &ResourceRecord) -> Option<(&SubjectNode, &SchemeRecord)> {
        let subject = self.subject(resource.subject_id)?;
        let scheme = self.scheme(subject.scheme_id())?;
        Some((subject, scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn scheme(id: i64, year: i32) -> SchemeRecord {
        SchemeRecord {
            id,
            year,
            name: format!("Scheme {year}"),
            is_active: true,
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    fn subject(id: i64, scheme_id: i64, code: &str, semester: i16) -> SubjectRecord {
        SubjectRecord {
            id,
            code: code.to_string(),
            name: format!("Subject {id}"),
            scheme_id,
            semester,
            department: "CS".to_string(),
            credits: 3,
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    fn resource(id: i64, subject_id: i64, approved: bool) -> ResourceRecord {
        ResourceRecord {
            id,
            title: format!("Resource {id}"),
            description: String::new(),
            category: ResourceCategory::Notes,
            subject_id,
            file_url: None,
            file_size: None,
            module_number: 0,
            is_approved: approved,
            created_at: datetime!(2024-02-01 00:00 UTC),
            like_count: 0,
            download_count: 0,
        }
    }

    #[test]
    fn orphans_are_dropped_and_reported() {
        let build = CatalogHierarchy::build(
            1,
            vec![scheme(1, 2019)],
            vec![subject(10, 1, "CS301", 3), subject(11, 42, "CS302", 3)],
            vec![resource(100, 10, true), resource(101, 11, true)],
        );

        assert_eq!(build.hierarchy.subjects().len(), 1);
        assert_eq!(build.hierarchy.resources().len(), 1);
        assert_eq!(
            build.issues,
            vec![
                IntegrityError::OrphanSubject {
                    subject_id: 11,
                    scheme_id: 42
                },
                IntegrityError::OrphanResource {
                    resource_id: 101,
                    subject_id: 11
                },
            ]
        );
    }

    #[test]
    fn invalid_subject_rows_are_rejected() {
        let build = CatalogHierarchy::build(
            1,
            vec![scheme(1, 2019)],
            vec![
                subject(10, 1, "CS301", 3),
                subject(11, 1, "CS301", 4),
                subject(12, 1, "CS303", 9),
            ],
            vec![resource(100, 10, false)],
        );

        assert_eq!(build.hierarchy.subjects().len(), 1);
        assert!(build.hierarchy.resources().is_empty());
        assert_eq!(build.issues.len(), 3);
        assert!(build.issues.iter().any(|issue| matches!(
            issue,
            IntegrityError::UnapprovedResource { resource_id: 100 }
        )));
    }

    #[test]
    fn traversal_follows_parent_links() {
        let build = CatalogHierarchy::build(
            7,
            vec![scheme(1, 2019), scheme(2, 2024)],
            vec![
                subject(10, 1, "CS301", 5),
                subject(11, 1, "CS201", 3),
                subject(20, 2, "EE101", 1),
            ],
            vec![
                resource(100, 10, true),
                resource(101, 11, true),
                resource(102, 20, true),
            ],
        );
        let hierarchy = build.hierarchy;

        assert_eq!(hierarchy.version(), 7);
        let years: Vec<i32> = hierarchy.schemes().iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2024, 2019]);

        let under: Vec<i64> = hierarchy.subjects_under(1).map(SubjectNode::id).collect();
        assert_eq!(under, vec![11, 10]);
        assert_eq!(hierarchy.subjects_under(999).count(), 0);

        let ordered: Vec<i64> = hierarchy.subjects().iter().map(SubjectNode::id).collect();
        assert_eq!(ordered, vec![20, 11, 10]);

        let resource = hierarchy
            .resources_under(10)
            .next()
            .expect("resource under subject");
        let (parent, root) = hierarchy.lineage(resource).expect("lineage resolves");
        assert_eq!(parent.id(), 10);
        assert_eq!(root.id, 1);

        assert_eq!(
            hierarchy
                .resources_in_category(ResourceCategory::Notes)
                .count(),
            3
        );
        assert_eq!(
            hierarchy.resources_in_category(ResourceCategory::Pyq).count(),
            0
        );
    }
}
