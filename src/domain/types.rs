//! Closed vocabularies shared by the catalog: categories, departments and semesters.

use std::fmt;

pub use eesa_api_types::{ResourceCategory, SortOrder};

/// Department codes with their display labels, in presentation order.
pub const DEPARTMENTS: [(&str, &str); 7] = [
    ("EEE", "Electrical & Electronics Engineering"),
    ("ECE", "Electronics & Communication Engineering"),
    ("IT", "Information Technology Engineering"),
    ("CS", "Computer Science & Engineering"),
    ("ME", "Mechanical Engineering"),
    ("SFE", "Safety & Fire Engineering"),
    ("CE", "Civil Engineering"),
];

/// Resolve a department code case-insensitively to its canonical spelling.
pub fn canonical_department(code: &str) -> Option<&'static str> {
    let code = code.trim();
    DEPARTMENTS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(known, _)| *known)
}

/// A semester number in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Semester(u8);

impl Semester {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 8;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|value| (Self::MIN..=Self::MAX).contains(value))
            .map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Semester> {
        (Self::MIN..=Self::MAX).map(Semester)
    }

    pub fn label(self) -> String {
        format!("Semester {}", self.0)
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
