//! Repository integrity checks.
//!
//! Walks every commit reachable from a branch, confirms its snapshot and the
//! objects it references are present, and optionally re-hashes every stored
//! object and parses HEAD's MIDI files.

use crate::error::{MuseError, Result};
use crate::midi;
use crate::object_id::{CommitId, ObjectId};
use crate::object_store::Fetch;
use crate::repo::MuseRepo;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Configuration for repository validation.
#[derive(Debug, Clone, Default)]
pub struct ValidateConfig {
    /// Re-read and re-hash every stored object (slow).
    pub check_objects: bool,

    /// Parse every MIDI file in HEAD's manifest.
    pub check_midi: bool,
}

/// Report from repository validation.
#[derive(Debug, Default, Serialize)]
pub struct ValidateReport {
    /// Number of refs checked.
    pub refs_checked: usize,

    /// Refs that point to commits the history store doesn't have.
    pub refs_dangling: Vec<String>,

    /// Number of commits checked.
    pub commits_checked: usize,

    /// Commits that are missing or whose snapshot is missing.
    pub commits_invalid: Vec<CommitId>,

    /// Objects referenced by a snapshot but not stored.
    pub missing_objects: Vec<ObjectId>,

    /// Number of stored objects re-hashed.
    pub objects_checked: usize,

    /// Stored objects that fail decompression or hashing.
    pub corrupted_objects: Vec<ObjectId>,

    /// `path: reason` for each HEAD MIDI file that fails to parse.
    pub malformed_midi: Vec<String>,
}

impl ValidateReport {
    /// Returns true if any issues were found.
    pub fn has_issues(&self) -> bool {
        !self.refs_dangling.is_empty()
            || !self.commits_invalid.is_empty()
            || !self.missing_objects.is_empty()
            || !self.corrupted_objects.is_empty()
            || !self.malformed_midi.is_empty()
    }

    /// Returns a summary message.
    pub fn summary(&self) -> String {
        if !self.has_issues() {
            return "Repository is healthy. No issues found.".to_string();
        }

        let counts = [
            (self.refs_dangling.len(), "dangling refs"),
            (self.commits_invalid.len(), "invalid commits"),
            (self.missing_objects.len(), "missing objects"),
            (self.corrupted_objects.len(), "corrupted objects"),
            (self.malformed_midi.len(), "malformed MIDI files"),
        ];
        let issues: Vec<String> = counts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, what)| format!("{} {}", n, what))
            .collect();
        format!("Repository has issues: {}", issues.join(", "))
    }
}

/// Validate repository integrity.
///
/// # Examples
///
/// ```no_run
/// use muse_core::{MuseRepo, ValidateConfig};
///
/// let repo = MuseRepo::open(".").unwrap();
/// let report = repo.validate(ValidateConfig::default()).unwrap();
///
/// if report.has_issues() {
///     eprintln!("{}", report.summary());
/// }
/// ```
pub fn validate(repo: &MuseRepo, config: ValidateConfig) -> Result<ValidateReport> {
    let mut report = ValidateReport::default();

    let heads = check_refs(repo, &mut report)?;
    check_commits(repo, heads, &mut report)?;

    if config.check_objects {
        check_all_objects(repo, &mut report)?;
    }
    if config.check_midi {
        check_midi(repo, &mut report)?;
    }

    Ok(report)
}

/// Check that every branch points at a recorded commit. Returns the valid heads.
fn check_refs(repo: &MuseRepo, report: &mut ValidateReport) -> Result<Vec<CommitId>> {
    let mut heads = Vec::new();

    let current = &repo.head().branch;
    report.refs_checked += 1;
    if !repo.refs().branch_exists(current) {
        report.refs_dangling.push("HEAD".to_string());
    }

    for (name, id) in repo.branches()? {
        report.refs_checked += 1;
        let Some(id) = id else {
            continue;
        };
        if repo.history().get_commit(id)?.is_some() {
            heads.push(id);
        } else {
            report.refs_dangling.push(format!("refs/heads/{}", name));
        }
    }

    Ok(heads)
}

/// Walk every reachable commit, checking snapshots and referenced objects.
fn check_commits(
    repo: &MuseRepo,
    heads: Vec<CommitId>,
    report: &mut ValidateReport,
) -> Result<()> {
    let mut visited = HashSet::new();
    let mut queue: VecDeque<CommitId> = heads.into();
    let mut referenced = BTreeSet::new();

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        report.commits_checked += 1;

        let Some(commit) = repo.history().get_commit(id)? else {
            report.commits_invalid.push(id);
            continue;
        };

        match repo.history().get_snapshot(commit.snapshot_id)? {
            Some(snapshot) => referenced.extend(snapshot.manifest.iter().map(|(_, oid)| oid)),
            None => report.commits_invalid.push(id),
        }

        queue.extend(commit.parents.ids());
    }

    report.missing_objects = referenced
        .into_iter()
        .filter(|oid| !repo.store().has(*oid))
        .collect();
    Ok(())
}

/// Check integrity of all objects.
fn check_all_objects(repo: &MuseRepo, report: &mut ValidateReport) -> Result<()> {
    for id in repo.store().list_all()? {
        report.objects_checked += 1;
        match repo.store().get(id) {
            Ok(_) => {}
            Err(MuseError::HashMismatch { .. } | MuseError::CorruptedObject { .. }) => {
                report.corrupted_objects.push(id);
            }
            Err(MuseError::ObjectNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Parse every MIDI file HEAD records.
fn check_midi(repo: &MuseRepo, report: &mut ValidateReport) -> Result<()> {
    let manifest = match repo.head_manifest() {
        Ok(m) => m,
        Err(MuseError::CommitNotFound(_) | MuseError::SnapshotNotFound(_)) => return Ok(()),
        Err(e) => return Err(e),
    };

    for (path, id) in manifest.iter() {
        if !midi::is_midi_path(path) {
            continue;
        }
        // missing and corrupted objects are reported by the other checks
        if let Fetch::Found(data) = repo.store().fetch(id)? {
            if let Err(e) = midi::validate(&data) {
                report.malformed_midi.push(format!("{}: {}", path, e));
            }
        }
    }
    Ok(())
}
