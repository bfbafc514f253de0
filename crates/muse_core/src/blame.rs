//! Per-path attribution to the commit that last changed it.
//!
//! The walk follows first parents from the start commit, newest to oldest,
//! and is bounded by a traversal limit. For every path in the start manifest,
//! adjacent `(newer, older)` pairs are scanned in order; the first pair where
//! the path is absent in `older` or has a different object id attributes the
//! path to `newer`. A path that never changes belongs to the oldest commit
//! reached.
//!
//! Display filters (path substring, track glob, section) are applied after
//! attribution and never change it.

use crate::commit::Commit;
use crate::error::{MuseError, Result};
use crate::manifest::Manifest;
use crate::object_id::CommitId;
use crate::repo::MuseRepo;
use crate::scope::Scope;
use serde::Serialize;
use tracing::{debug, warn};

/// How a path came to have its current content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The path first appeared in the attributed commit.
    Added,
    /// The attributed commit changed the path's content.
    Modified,
}

/// Inputs for [`blame`].
#[derive(Debug, Clone, Default)]
pub struct BlameOptions {
    /// Start commit (branch, id or prefix). Defaults to HEAD.
    pub start: Option<String>,
    /// Only show paths containing this substring.
    pub path: Option<String>,
    /// Only show paths matching this scope.
    pub scope: Scope,
    /// Maximum commits walked. Defaults to the configured traversal limit.
    pub limit: Option<usize>,
}

/// Attribution for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameEntry {
    /// Path in the start manifest.
    pub path: String,
    /// Commit the path is attributed to.
    pub commit_id: CommitId,
    /// That commit's message.
    pub message: String,
    /// That commit's author.
    pub author: String,
    /// That commit's timestamp (Unix seconds).
    pub timestamp: u64,
    /// Added or modified.
    pub change: ChangeKind,
}

/// Result of [`blame`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlameReport {
    /// Entries sorted by path.
    pub entries: Vec<BlameEntry>,
    /// Commits visited.
    pub commits_walked: usize,
    /// Why the walk stopped early, if it did.
    pub truncated: Option<String>,
}

/// Attributes every path in the start commit's manifest.
///
/// # Errors
///
/// Returns `InvalidPattern` for a malformed track glob, `NoCommits` on an
/// empty branch, and a lookup error if the start commit or its snapshot is
/// unreadable. Problems further down the chain
/// truncate the walk instead.
pub fn blame(repo: &MuseRepo, options: &BlameOptions) -> Result<BlameReport> {
    options.scope.validate()?;
    let start = match &options.start {
        Some(spec) => repo.resolve_ref(spec)?,
        None => repo
            .head()
            .commit
            .ok_or_else(|| MuseError::NoCommits(repo.head().branch.clone()))?,
    };
    let limit = options
        .limit
        .unwrap_or(repo.config().history.traversal_limit)
        .max(1);

    let (chain, truncated) = walk_chain(repo, start, limit)?;
    let attributed = attribute(&chain);

    let entries = attributed
        .into_iter()
        .filter(|e| match &options.path {
            Some(needle) => e.path.contains(needle.as_str()),
            None => true,
        })
        .filter(|e| options.scope.matches(&e.path))
        .collect();

    Ok(BlameReport {
        entries,
        commits_walked: chain.len(),
        truncated,
    })
}

/// Loads `(commit, manifest)` pairs newest first.
fn walk_chain(
    repo: &MuseRepo,
    start: CommitId,
    limit: usize,
) -> Result<(Vec<(Commit, Manifest)>, Option<String>)> {
    let first = repo.load_commit(start)?;
    let first_manifest = repo.commit_manifest(&first)?;
    let mut next = first.parents.first();
    let mut chain = vec![(first, first_manifest)];

    while let Some(id) = next {
        if chain.len() >= limit {
            let reason = format!("traversal limit of {} commits reached", limit);
            debug!(limit, "blame walk hit traversal limit");
            return Ok((chain, Some(reason)));
        }

        let step = repo
            .load_commit(id)
            .and_then(|c| repo.commit_manifest(&c).map(|m| (c, m)));
        match step {
            Ok((commit, manifest)) => {
                next = commit.parents.first();
                chain.push((commit, manifest));
            }
            Err(e) => {
                warn!(commit = %id, error = %e, "broken parent chain, blame truncated");
                return Ok((chain, Some(format!("commit {} unreadable: {}", id.short(), e))));
            }
        }
    }

    Ok((chain, None))
}

/// Attribution over a non-empty newest-first chain. Output is sorted by path.
fn attribute(chain: &[(Commit, Manifest)]) -> Vec<BlameEntry> {
    let Some((_, head_manifest)) = chain.first() else {
        return vec![];
    };

    head_manifest
        .iter()
        .map(|(path, _)| {
            let mut hit = None;
            for pair in chain.windows(2) {
                let (newer, newer_manifest) = &pair[0];
                let (_, older_manifest) = &pair[1];
                match (newer_manifest.get(path), older_manifest.get(path)) {
                    (Some(_), None) => {
                        hit = Some((newer, ChangeKind::Added));
                        break;
                    }
                    (Some(n), Some(o)) if n != o => {
                        hit = Some((newer, ChangeKind::Modified));
                        break;
                    }
                    _ => {}
                }
            }

            let (commit, change) = match hit {
                Some(found) => found,
                None => {
                    let (oldest, _) = &chain[chain.len() - 1];
                    (oldest, ChangeKind::Added)
                }
            };

            BlameEntry {
                path: path.to_string(),
                commit_id: commit.id,
                message: commit.message.clone(),
                author: commit.author.clone(),
                timestamp: commit.timestamp,
                change,
            }
        })
        .collect()
}
