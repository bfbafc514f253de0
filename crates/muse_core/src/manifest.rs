//! Path → object-id manifests and their deterministic snapshot ids.

use crate::object_id::{ObjectId, SnapshotId};
use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered mapping of normalized relative path to object id.
///
/// Backed by a `BTreeMap`, so iteration order and therefore
/// [`Manifest::snapshot_id`] never depend on insertion order.
///
/// # Examples
///
/// ```
/// use muse_core::{Manifest, ObjectId};
///
/// let a = ObjectId::hash_bytes(b"a");
/// let b = ObjectId::hash_bytes(b"b");
///
/// let mut m1 = Manifest::new();
/// m1.insert("x.mid", a);
/// m1.insert("y.mid", b);
///
/// let mut m2 = Manifest::new();
/// m2.insert("y.mid", b);
/// m2.insert("x.mid", a);
///
/// assert_eq!(m1.snapshot_id(), m2.snapshot_id());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, ObjectId>);

impl Manifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a path.
    pub fn insert(&mut self, path: impl Into<String>, id: ObjectId) -> Option<ObjectId> {
        self.0.insert(path.into(), id)
    }

    /// Removes a path.
    pub fn remove(&mut self, path: &str) -> Option<ObjectId> {
        self.0.remove(path)
    }

    /// Looks up the object id for a path.
    pub fn get(&self, path: &str) -> Option<ObjectId> {
        self.0.get(path).copied()
    }

    /// True if the path is tracked.
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no paths are tracked.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(path, id)` in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.0.iter().map(|(p, id)| (p.as_str(), *id))
    }

    /// Iterates paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the subset of entries whose path matches `scope`.
    pub fn filter(&self, scope: &Scope) -> Manifest {
        if scope.is_empty() {
            return self.clone();
        }
        Manifest(
            self.0
                .iter()
                .filter(|(path, _)| scope.matches(path))
                .map(|(p, id)| (p.clone(), *id))
                .collect(),
        )
    }

    /// Computes the snapshot id: hash of sorted `"path:object_id"` strings.
    pub fn snapshot_id(&self) -> SnapshotId {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(path, id)| format!("{}:{}", path, id.as_hex()))
            .collect();
        ObjectId::hash_joined(&parts)
    }
}

impl FromIterator<(String, ObjectId)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, ObjectId)>>(iter: I) -> Self {
        Manifest(iter.into_iter().collect())
    }
}

impl IntoIterator for Manifest {
    type Item = (String, ObjectId);
    type IntoIter = std::collections::btree_map::IntoIter<String, ObjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A persisted manifest together with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Hash of the manifest.
    pub id: SnapshotId,
    /// Path → object id.
    pub manifest: Manifest,
}

impl Snapshot {
    /// Wraps a manifest, deriving its id.
    pub fn new(manifest: Manifest) -> Self {
        Self {
            id: manifest.snapshot_id(),
            manifest,
        }
    }
}
