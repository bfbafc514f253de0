//! Manifest-vs-manifest comparison.

use crate::manifest::Manifest;
use serde::Serialize;

/// Path-level differences between two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Present only in the new manifest.
    pub added: Vec<String>,
    /// Present in both with different object ids.
    pub modified: Vec<String>,
    /// Present only in the old manifest.
    pub deleted: Vec<String>,
}

impl ManifestDiff {
    /// True when the manifests are identical.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }
}

/// Compares `old` against `new`. Every list comes out sorted.
pub fn diff_manifests(old: &Manifest, new: &Manifest) -> ManifestDiff {
    let mut diff = ManifestDiff::default();

    for (path, id) in new.iter() {
        match old.get(path) {
            None => diff.added.push(path.to_string()),
            Some(old_id) if old_id != id => diff.modified.push(path.to_string()),
            Some(_) => {}
        }
    }
    for path in old.paths() {
        if !new.contains(path) {
            diff.deleted.push(path.to_string());
        }
    }

    diff
}
