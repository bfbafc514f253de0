//! Stash: a shelf of working-tree manifests kept outside the commit graph.
//!
//! Entries live as JSON files under `.muse/stash/`. Index 0 is the most
//! recent entry. Content goes into the shared object store, so entries only
//! record manifests. Nothing here touches commits or refs.

use crate::error::{MuseError, Result};
use crate::manifest::Manifest;
use crate::object_store::Fetch;
use crate::refs::write_atomic;
use crate::repo::MuseRepo;
use crate::scope::Scope;
use crate::worktree::RestoreMode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

const STASH_DIR: &str = "stash";

/// One shelved set of working-tree files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    /// File stem of the entry on disk.
    pub stash_id: String,
    /// Branch that was current at push time.
    pub branch: String,
    /// Description.
    pub message: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Track filter used at push time.
    pub track: Option<String>,
    /// Section filter used at push time.
    pub section: Option<String>,
    /// Shelved paths.
    pub manifest: Manifest,
}

/// Result of [`push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashPush {
    /// A new entry was recorded at index 0.
    Saved {
        /// Id of the new entry.
        stash_id: String,
        /// Number of shelved paths.
        paths: usize,
        /// HEAD paths that could not be restored because their bytes are missing.
        missing: Vec<String>,
    },
    /// No matching path differed from HEAD.
    NothingToStash,
}

/// Result of [`apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StashApply {
    /// Id of the applied entry.
    pub stash_id: String,
    /// Paths written to the working tree.
    pub applied: Vec<String>,
    /// Paths whose bytes were unavailable; these were not written.
    pub missing: Vec<String>,
    /// True if the entry was removed.
    pub dropped: bool,
}

/// Shelves matching working-tree files and restores them to HEAD.
///
/// With an empty scope, the whole tree is restored to HEAD (files not in HEAD
/// are deleted). With a scope, only matching paths are touched.
pub fn push(repo: &MuseRepo, message: Option<&str>, scope: &Scope) -> Result<StashPush> {
    scope.validate()?;
    let _lock = repo.acquire_lock()?;

    let head = repo.head_manifest()?;
    let current = repo.worktree().scan()?.filter(scope);
    if current.is_empty() || current == head.filter(scope) {
        return Ok(StashPush::NothingToStash);
    }

    let manifest = repo.worktree().snapshot_into(repo.store(), scope)?;

    let now = Utc::now();
    let random = Uuid::new_v4().simple().to_string();
    let stash_id = format!(
        "stash-{}-{}",
        now.format("%Y%m%dT%H%M%S%6f"),
        &random[..8]
    );
    let branch = repo.head().branch.clone();
    let entry = StashEntry {
        stash_id: stash_id.clone(),
        message: message
            .map(str::to_string)
            .unwrap_or_else(|| format!("On {}: WIP", branch)),
        branch,
        created_at: now.to_rfc3339(),
        track: scope.track.clone(),
        section: scope.section.clone(),
        manifest,
    };

    let dir = stash_dir(repo);
    fs::create_dir_all(&dir)?;
    let json = serde_json::to_vec_pretty(&entry)
        .map_err(|e| MuseError::Serialization(e.to_string()))?;
    write_atomic(&entry_path(&dir, &stash_id), &json)?;

    let report = repo
        .worktree()
        .restore(&head, repo.store(), &RestoreMode::for_scope(scope))?;

    info!(stash = %stash_id, paths = entry.manifest.len(), "stash saved");
    Ok(StashPush::Saved {
        stash_id,
        paths: entry.manifest.len(),
        missing: report.missing,
    })
}

/// Writes every path of entry `index` into the working tree.
///
/// Existing files are overwritten. Paths whose bytes are unavailable are
/// reported and skipped. With `drop`, the entry is removed only if nothing
/// was missing.
pub fn apply(repo: &MuseRepo, index: usize, drop: bool) -> Result<StashApply> {
    let _lock = repo.acquire_lock()?;

    let entries = list(repo)?;
    let entry = entries.get(index).ok_or(MuseError::StashNotFound {
        index,
        len: entries.len(),
    })?;

    let mut result = StashApply {
        stash_id: entry.stash_id.clone(),
        ..Default::default()
    };
    for (path, id) in entry.manifest.iter() {
        match repo.store().fetch(id)? {
            Fetch::Found(data) => {
                repo.worktree().write_file(path, &data)?;
                result.applied.push(path.to_string());
            }
            Fetch::Missing(reason) => {
                warn!(path, object = %id, ?reason, "stashed object unavailable");
                result.missing.push(path.to_string());
            }
        }
    }

    if drop && result.missing.is_empty() {
        fs::remove_file(entry_path(&stash_dir(repo), &entry.stash_id))?;
        result.dropped = true;
    }

    info!(stash = %entry.stash_id, applied = result.applied.len(), dropped = result.dropped, "stash applied");
    Ok(result)
}

/// All entries, most recent first. Unreadable entry files are skipped.
pub fn list(repo: &MuseRepo) -> Result<Vec<StashEntry>> {
    let dir = stash_dir(repo);
    let read = match fs::read_dir(&dir) {
        Ok(r) => r,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in read {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.starts_with("stash-") && name.ends_with(".json") {
            names.push(name);
        }
    }
    // fixed-width timestamps make name order chronological
    names.sort_unstable_by(|a, b| b.cmp(a));

    let mut entries = Vec::with_capacity(names.len());
    for name in names {
        let path = dir.join(&name);
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<StashEntry>(&s).map_err(|e| e.to_string()));
        match parsed {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable stash entry"),
        }
    }
    Ok(entries)
}

/// Removes entry `index` and returns it.
pub fn drop(repo: &MuseRepo, index: usize) -> Result<StashEntry> {
    let _lock = repo.acquire_lock()?;

    let mut entries = list(repo)?;
    if index >= entries.len() {
        return Err(MuseError::StashNotFound {
            index,
            len: entries.len(),
        });
    }
    let entry = entries.remove(index);
    fs::remove_file(entry_path(&stash_dir(repo), &entry.stash_id))?;
    info!(stash = %entry.stash_id, "stash dropped");
    Ok(entry)
}

/// Removes every entry and returns how many there were.
pub fn clear(repo: &MuseRepo) -> Result<usize> {
    let _lock = repo.acquire_lock()?;

    let entries = list(repo)?;
    let dir = stash_dir(repo);
    for entry in &entries {
        fs::remove_file(entry_path(&dir, &entry.stash_id))?;
    }
    info!(count = entries.len(), "stash cleared");
    Ok(entries.len())
}

fn stash_dir(repo: &MuseRepo) -> PathBuf {
    repo.muse_dir().join(STASH_DIR)
}

fn entry_path(dir: &Path, stash_id: &str) -> PathBuf {
    dir.join(format!("{}.json", stash_id))
}
