//! In-progress merge bookkeeping (`.muse/MERGE_STATE.json`).

use crate::error::{MuseError, Result};
use crate::object_id::CommitId;
use crate::refs::write_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MERGE_STATE_FILE: &str = "MERGE_STATE.json";

/// State left behind by a merge that could not complete on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeState {
    /// Common ancestor, when one was found.
    pub base_commit: Option<CommitId>,
    /// Head of the current branch when the merge started.
    pub ours_commit: CommitId,
    /// Head being merged in.
    pub theirs_commit: CommitId,
    /// Paths still awaiting resolution.
    #[serde(default)]
    pub conflict_paths: Vec<String>,
}

impl MergeState {
    /// Loads the merge state, or `None` when no merge is in progress.
    pub fn load(muse_root: &Path) -> Result<Option<Self>> {
        let path = state_path(muse_root);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| MuseError::Deserialization(format!("{}: {}", path.display(), e)))
    }

    /// Writes the merge state atomically.
    pub fn save(&self, muse_root: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| MuseError::Serialization(e.to_string()))?;
        write_atomic(&state_path(muse_root), &json)
    }

    /// Removes the merge state. A missing file is fine.
    pub fn clear(muse_root: &Path) -> Result<()> {
        match fs::remove_file(state_path(muse_root)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// True while any path is still conflicted.
    pub fn has_conflicts(&self) -> bool {
        !self.conflict_paths.is_empty()
    }
}

/// Fails with `MergeConflictsPending` while a conflicted merge is recorded.
pub(crate) fn ensure_no_conflicts(muse_root: &Path) -> Result<()> {
    match MergeState::load(muse_root)? {
        Some(state) if state.has_conflicts() => Err(MuseError::MergeConflictsPending {
            paths: state.conflict_paths,
        }),
        _ => Ok(()),
    }
}

fn state_path(muse_root: &Path) -> PathBuf {
    muse_root.join(MERGE_STATE_FILE)
}
