use thiserror::Error;

/// A request parameter that failed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for `{field}`: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A row that cannot be placed in the catalog hierarchy. The row is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: i64 },
    #[error("subject {subject_id} references missing scheme {scheme_id}")]
    OrphanSubject { subject_id: i64, scheme_id: i64 },
    #[error("subject {subject_id} repeats code `{code}` within scheme {scheme_id}")]
    DuplicateSubjectCode {
        subject_id: i64,
        scheme_id: i64,
        code: String,
    },
    #[error("subject {subject_id} has semester {semester} outside 1..=8")]
    SemesterOutOfRange { subject_id: i64, semester: i16 },
    #[error("resource {resource_id} references missing subject {subject_id}")]
    OrphanResource { resource_id: i64, subject_id: i64 },
    #[error("resource {resource_id} is not approved")]
    UnapprovedResource { resource_id: i64 },
}

impl IntegrityError {
    pub fn entity(&self) -> &'static str {
        match self {
            IntegrityError::DuplicateId { entity, .. } => entity,
            IntegrityError::OrphanSubject { .. }
            | IntegrityError::DuplicateSubjectCode { .. }
            | IntegrityError::SemesterOutOfRange { .. } => "subject",
            IntegrityError::OrphanResource { .. } | IntegrityError::UnapprovedResource { .. } => {
                "resource"
            }
        }
    }
}
