//! Snapshot cache keys.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::domain::filter::SnapshotFilter;

pub const SNAPSHOT_KEY_PREFIX: &str = "catalog:snapshot:v1:";

/// Key for one (entity-set version, filter) pair.
///
/// The digest covers the version and the normalized filter parameters, so two
/// spellings of the same filter share an entry and a version bump moves every
/// filter to a fresh key. Keys are stable across processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    pub fn new(version: u64, filter: &SnapshotFilter) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical_string(version, filter).as_bytes());
        Self(format!("{SNAPSHOT_KEY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_string(version: u64, filter: &SnapshotFilter) -> String {
    let mut canonical = format!("version={version}");
    for (name, value) in filter.canonical_pairs() {
        canonical.push('&');
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(&value);
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Semester, SortOrder};

    #[test]
    fn canonical_string_lists_sorted_parameters() {
        let filter = SnapshotFilter {
            scheme: Some(3),
            semester: Semester::new(5),
            department: Some("CS"),
            ..Default::default()
        };
        assert_eq!(
            canonical_string(12, &filter),
            "version=12&department=CS&scheme=3&semester=5&sort=recency"
        );
    }

    #[test]
    fn keys_depend_on_version_and_filter() {
        let base = SnapshotFilter::default();
        let popular = SnapshotFilter {
            sort: SortOrder::Popularity,
            ..Default::default()
        };

        let key = SnapshotKey::new(1, &base);
        assert!(key.as_str().starts_with(SNAPSHOT_KEY_PREFIX));
        assert_eq!(key.as_str().len(), SNAPSHOT_KEY_PREFIX.len() + 64);
        assert_eq!(key, SnapshotKey::new(1, &base));
        assert_ne!(key, SnapshotKey::new(2, &base));
        assert_ne!(key, SnapshotKey::new(1, &popular));
    }
}
