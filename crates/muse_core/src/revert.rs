//! Undo-commit synthesis.
//!
//! Reverting commit `T` with first parent `P` produces the manifest `P`
//! recorded, either wholesale or only for paths inside a scope (the rest keep
//! HEAD's values). The result becomes a new single-parent commit on HEAD, or,
//! in no-commit mode, is written into the working tree only.

use crate::commit::Parents;
use crate::diff::{diff_manifests, ManifestDiff};
use crate::error::{MuseError, Result};
use crate::manifest::Manifest;
use crate::merge_state::ensure_no_conflicts;
use crate::object_id::CommitId;
use crate::object_store::Fetch;
use crate::repo::MuseRepo;
use crate::scope::Scope;
use crate::worktree::RestoreReport;
use serde::Serialize;
use tracing::{info, warn};

/// Inputs for [`revert`].
#[derive(Debug, Clone)]
pub struct RevertOptions {
    /// Commit to undo (branch, id or prefix).
    pub target: String,
    /// Restrict the revert to matching paths.
    pub scope: Scope,
    /// Write the working tree instead of creating a commit.
    pub no_commit: bool,
}

impl RevertOptions {
    /// Full revert of `target`, committed.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            scope: Scope::all(),
            no_commit: false,
        }
    }
}

/// Result of [`revert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevertOutcome {
    /// A revert commit was created, HEAD advanced and the working tree
    /// updated to match.
    Committed {
        /// The new commit.
        commit_id: CommitId,
        /// Paths whose entry differs from the previous HEAD.
        paths_changed: Vec<String>,
        /// Paths whose bytes were unavailable; the working tree still holds
        /// the old version.
        missing: Vec<String>,
    },
    /// The working tree was updated; nothing was committed.
    WorkingTree {
        /// Paths written.
        written: Vec<String>,
        /// Paths removed.
        deleted: Vec<String>,
        /// Paths that needed bytes not available locally.
        missing: Vec<String>,
    },
    /// HEAD already matches the reverted state.
    NoOp,
}

/// Reverts `options.target`.
///
/// # Errors
///
/// Returns `InvalidPattern` for a malformed track glob,
/// `MergeConflictsPending` while a conflicted merge is recorded,
/// `NoCommits` on an empty branch, and the usual lookup errors for the
/// target, its parent and their snapshots.
pub fn revert(repo: &mut MuseRepo, options: &RevertOptions) -> Result<RevertOutcome> {
    options.scope.validate()?;
    let _lock = repo.acquire_lock()?;
    ensure_no_conflicts(&repo.muse_dir())?;

    let head = repo
        .head_commit()?
        .ok_or_else(|| MuseError::NoCommits(repo.head().branch.clone()))?;
    let head_manifest = repo.commit_manifest(&head)?;

    let target = repo.load_commit(repo.resolve_ref(&options.target)?)?;
    let parent_manifest = match target.parents.first() {
        Some(parent) => repo.commit_manifest(&repo.load_commit(parent)?)?,
        None => Manifest::new(),
    };

    let reverted = revert_manifest(&head_manifest, &parent_manifest, &options.scope);
    let changes = diff_manifests(&head_manifest, &reverted);
    if changes.is_empty() {
        info!(target = %target.id, "revert is a no-op");
        return Ok(RevertOutcome::NoOp);
    }

    if options.no_commit {
        let applied = apply_to_worktree(repo, &changes, &reverted)?;
        return Ok(RevertOutcome::WorkingTree {
            written: applied.written,
            deleted: applied.deleted,
            missing: applied.missing,
        });
    }

    let mut paths_changed: Vec<String> = changes
        .added
        .iter()
        .chain(&changes.modified)
        .chain(&changes.deleted)
        .cloned()
        .collect();
    paths_changed.sort();

    let message = format!("Revert '{}'", target.message);
    let commit = repo.record_commit(
        Parents::Single(head.id),
        reverted.clone(),
        &message,
        head.metadata.clone(),
    )?;
    repo.advance_head(commit.id)?;
    let applied = apply_to_worktree(repo, &changes, &reverted)?;

    info!(commit = %commit.id, reverted = %target.id, "revert committed");
    Ok(RevertOutcome::Committed {
        commit_id: commit.id,
        paths_changed,
        missing: applied.missing,
    })
}

/// Writes the changed paths of `reverted` into the working tree.
///
/// Only paths in `changes` are touched; anything else on disk stays as is.
fn apply_to_worktree(
    repo: &MuseRepo,
    changes: &ManifestDiff,
    reverted: &Manifest,
) -> Result<RestoreReport> {
    let mut report = RestoreReport::default();
    for path in &changes.deleted {
        repo.worktree().remove_file(path)?;
        report.deleted.push(path.clone());
    }

    for path in changes.added.iter().chain(&changes.modified) {
        let Some(id) = reverted.get(path) else {
            continue;
        };
        match repo.store().fetch(id)? {
            Fetch::Found(data) => {
                repo.worktree().write_file(path, &data)?;
                report.written.push(path.clone());
            }
            Fetch::Missing(reason) => {
                warn!(path = %path, object = %id, ?reason, "revert cannot restore path");
                report.missing.push(path.clone());
            }
        }
    }
    report.written.sort();
    report.missing.sort();
    Ok(report)
}

/// The parent manifest (empty scope) or HEAD with scoped paths taken from the parent.
fn revert_manifest(head: &Manifest, parent: &Manifest, scope: &Scope) -> Manifest {
    if scope.is_empty() {
        return parent.clone();
    }

    let mut result = head.clone();
    for path in head.paths() {
        if scope.matches(path) && !parent.contains(path) {
            result.remove(path);
        }
    }
    for (path, id) in parent.filter(scope).iter() {
        result.insert(path, id);
    }
    result
}
