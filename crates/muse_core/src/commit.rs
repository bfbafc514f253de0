//! Commit records and deterministic commit ids.

use crate::object_id::{CommitId, ObjectId, SnapshotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding a musical key annotation such as `"Eb major"`.
pub const KEY_METADATA: &str = "key";

/// Parent links of a commit.
///
/// The 0/1/2-parent invariant lives in the type rather than in a list length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parents {
    /// First commit on a line of history.
    Root,
    /// Ordinary commit.
    Single(CommitId),
    /// Merge commit: `(ours, theirs)`.
    Merge(CommitId, CommitId),
}

impl Parents {
    /// All parent ids, first parent first.
    pub fn ids(&self) -> Vec<CommitId> {
        match *self {
            Parents::Root => vec![],
            Parents::Single(p) => vec![p],
            Parents::Merge(ours, theirs) => vec![ours, theirs],
        }
    }

    /// The mainline parent, if any.
    pub fn first(&self) -> Option<CommitId> {
        match *self {
            Parents::Root => None,
            Parents::Single(p) | Parents::Merge(p, _) => Some(p),
        }
    }

    /// True for two-parent commits.
    pub fn is_merge(&self) -> bool {
        matches!(self, Parents::Merge(..))
    }
}

/// Immutable commit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Derived from parents, snapshot, message and timestamp.
    pub id: CommitId,
    /// Branch the commit was created on.
    pub branch: String,
    /// Parent links.
    pub parents: Parents,
    /// Snapshot this commit records.
    pub snapshot_id: SnapshotId,
    /// Commit message.
    pub message: String,
    /// Author name from config (may be empty).
    pub author: String,
    /// Unix seconds.
    pub timestamp: u64,
    /// Free-form annotations (key, tempo, ...). Not part of the id.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Commit {
    /// Builds a commit, deriving its id.
    pub fn new(
        branch: impl Into<String>,
        parents: Parents,
        snapshot_id: SnapshotId,
        message: impl Into<String>,
        author: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        let message = message.into();
        let id = commit_id(&parents.ids(), snapshot_id, &message, timestamp);
        Self {
            id,
            branch: branch.into(),
            parents,
            snapshot_id,
            message,
            author: author.into(),
            timestamp,
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches metadata without changing the id.
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// The key annotation, if any.
    pub fn key(&self) -> Option<&str> {
        self.metadata.get(KEY_METADATA).map(String::as_str)
    }
}

/// Derives a commit id.
///
/// Parent ids are sorted first, so the result does not depend on their order.
///
/// # Examples
///
/// ```
/// use muse_core::{commit_id, ObjectId};
///
/// let a = ObjectId::hash_bytes(b"a");
/// let b = ObjectId::hash_bytes(b"b");
/// let snap = ObjectId::hash_bytes(b"snap");
///
/// assert_eq!(
///     commit_id(&[a, b], snap, "merge", 42),
///     commit_id(&[b, a], snap, "merge", 42),
/// );
/// ```
pub fn commit_id(
    parent_ids: &[CommitId],
    snapshot_id: SnapshotId,
    message: &str,
    timestamp: u64,
) -> CommitId {
    let mut parents: Vec<String> = parent_ids.iter().map(ObjectId::as_hex).collect();
    parents.sort();

    let mut parts = parents;
    parts.push(snapshot_id.as_hex());
    parts.push(message.to_string());
    parts.push(timestamp.to_string());
    ObjectId::hash_joined(&parts)
}
