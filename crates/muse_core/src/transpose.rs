//! Transposition: shift every melodic note in a commit's MIDI files.
//!
//! The result is committed on top of HEAD, the branch advances and the
//! rewritten files are written to the working tree. Other source commits can
//! only be previewed with a dry run.

use crate::commit::{Parents, KEY_METADATA};
use crate::error::{MuseError, Result};
use crate::midi::{is_midi_path, transpose_notes};
use crate::object_id::CommitId;
use crate::object_store::{Fetch, MissingReason};
use crate::repo::MuseRepo;
use crate::scope::Scope;
use serde::Serialize;
use tracing::{debug, info, warn};

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Inputs for [`transpose`].
#[derive(Debug, Clone)]
pub struct TransposeOptions {
    /// Signed integer or named interval, e.g. `+3`, `down-P5`, `octave`.
    pub interval: String,
    /// Source commit (branch, id or prefix). Defaults to HEAD; anything else
    /// needs `dry_run`.
    pub source: Option<String>,
    /// `section` filters paths; `track` filters chunks by track name.
    pub scope: Scope,
    /// Report what would change without writing anything.
    pub dry_run: bool,
    /// Commit message. Defaults to a description of the interval.
    pub message: Option<String>,
}

impl TransposeOptions {
    /// Transpose HEAD by `interval`, committing the result.
    pub fn new(interval: impl Into<String>) -> Self {
        Self {
            interval: interval.into(),
            source: None,
            scope: Scope::all(),
            dry_run: false,
            message: None,
        }
    }
}

/// A candidate file that was not transposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPath {
    /// Manifest path.
    pub path: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of [`transpose`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransposeOutcome {
    /// Nothing was written.
    DryRun {
        /// Paths whose bytes would change.
        would_modify: Vec<String>,
        /// Paths that could not be processed.
        skipped: Vec<SkippedPath>,
    },
    /// A new commit was recorded.
    Committed {
        /// The new commit.
        commit_id: CommitId,
        /// Paths whose bytes changed.
        modified: Vec<String>,
        /// Paths that could not be processed.
        skipped: Vec<SkippedPath>,
        /// Shifted key annotation, when the source had one.
        new_key: Option<String>,
    },
    /// No file changed.
    NoOp {
        /// Paths that could not be processed.
        skipped: Vec<SkippedPath>,
    },
}

/// Parses an interval into signed semitones.
///
/// Accepts an optional direction (`+`, `-`, `up-`, `down-`) followed by an
/// integer of magnitude at most 127 or an interval name.
///
/// # Examples
///
/// ```
/// use muse_core::parse_interval;
///
/// assert_eq!(parse_interval("+3").unwrap(), 3);
/// assert_eq!(parse_interval("down-P5").unwrap(), -7);
/// assert_eq!(parse_interval("octave").unwrap(), 12);
/// assert!(parse_interval("sideways").is_err());
/// ```
pub fn parse_interval(input: &str) -> Result<i32> {
    let invalid = |reason: &str| MuseError::InvalidInterval {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let text = input.trim();
    let lower = text.to_ascii_lowercase();
    let (sign, body) = if lower.starts_with("up-") {
        (1, &text[3..])
    } else if lower.starts_with("down-") {
        (-1, &text[5..])
    } else if let Some(rest) = text.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = text.strip_prefix('-') {
        (-1, rest)
    } else {
        (1, text)
    };

    if body.is_empty() {
        return Err(invalid("missing interval"));
    }

    let magnitude = if body.chars().all(|c| c.is_ascii_digit()) {
        match body.parse::<i32>() {
            Ok(n) if n <= i32::from(crate::midi::MAX_NOTE) => n,
            _ => return Err(invalid("magnitude must be at most 127")),
        }
    } else {
        named_interval(body).ok_or_else(|| invalid("unknown interval name"))?
    };

    Ok(sign * magnitude)
}

/// Semitones for an interval name. Short forms are case-sensitive (`m3` vs `M3`).
fn named_interval(name: &str) -> Option<i32> {
    let short = match name {
        "P1" => Some(0),
        "m2" => Some(1),
        "M2" => Some(2),
        "m3" => Some(3),
        "M3" => Some(4),
        "P4" => Some(5),
        "TT" | "A4" | "d5" => Some(6),
        "P5" => Some(7),
        "m6" => Some(8),
        "M6" => Some(9),
        "m7" => Some(10),
        "M7" => Some(11),
        "P8" => Some(12),
        _ => None,
    };
    if short.is_some() {
        return short;
    }

    match name.to_ascii_lowercase().as_str() {
        "unison" => Some(0),
        "minor2nd" => Some(1),
        "major2nd" => Some(2),
        "minor3rd" => Some(3),
        "major3rd" => Some(4),
        "perfect4th" => Some(5),
        "tritone" => Some(6),
        "perfect5th" => Some(7),
        "minor6th" => Some(8),
        "major6th" => Some(9),
        "minor7th" => Some(10),
        "major7th" => Some(11),
        "octave" => Some(12),
        _ => None,
    }
}

/// Shifts the root of a key annotation, keeping the rest verbatim.
///
/// Roots spelled with a flat stay flat; everything else is spelled with
/// sharps. An unrecognized root returns the input unchanged.
///
/// # Examples
///
/// ```
/// use muse_core::shift_key;
///
/// assert_eq!(shift_key("Eb major", 2), "F major");
/// assert_eq!(shift_key("A minor", 1), "A# minor");
/// assert_eq!(shift_key("Bb dorian", -1), "A dorian");
/// assert_eq!(shift_key("H major", 3), "H major");
/// ```
pub fn shift_key(key: &str, semitones: i32) -> String {
    let split = key.find(char::is_whitespace).unwrap_or(key.len());
    let (root, rest) = key.split_at(split);

    let Some((pitch_class, flat)) = parse_root(root) else {
        return key.to_string();
    };
    let shifted = (pitch_class + semitones).rem_euclid(12) as usize;
    let names = if flat { &FLAT_NAMES } else { &SHARP_NAMES };
    format!("{}{}", names[shifted], rest)
}

/// Pitch class of a root like `C`, `F#`, `Eb`, plus whether it used a flat.
fn parse_root(root: &str) -> Option<(i32, bool)> {
    let mut chars = root.chars();
    let base = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut offset = 0;
    let mut flat = false;
    for c in chars {
        match c {
            '#' | '♯' => offset += 1,
            'b' | '♭' => {
                offset -= 1;
                flat = true;
            }
            _ => return None,
        }
    }
    Some((base + offset, flat))
}

/// Transposes the MIDI files of `options.source`.
///
/// # Errors
///
/// Returns `InvalidInterval` before touching anything if the interval doesn't
/// parse, `NotBranchHead` when a committing run names a source other than
/// HEAD, and the usual lookup errors for the source commit. Unreadable or
/// malformed files, and files with uncommitted edits, are reported in
/// `skipped` instead.
pub fn transpose(repo: &mut MuseRepo, options: &TransposeOptions) -> Result<TransposeOutcome> {
    let semitones = parse_interval(&options.interval)?;

    let _lock = if options.dry_run {
        None
    } else {
        Some(repo.acquire_lock()?)
    };

    let source_id = match &options.source {
        Some(spec) => repo.resolve_ref(spec)?,
        None => repo
            .head()
            .commit
            .ok_or_else(|| MuseError::NoCommits(repo.head().branch.clone()))?,
    };
    let at_head = repo.head().commit == Some(source_id);
    if !options.dry_run && !at_head {
        return Err(MuseError::NotBranchHead {
            commit: source_id.short(),
            branch: repo.head().branch.clone(),
        });
    }

    let source = repo.load_commit(source_id)?;
    let manifest = repo.commit_manifest(&source)?;
    // candidates with local edits are skipped
    let work = if at_head {
        Some(repo.worktree().scan()?)
    } else {
        None
    };

    let paths = Scope::new(None, options.scope.section.clone());
    let track = options.scope.track.as_deref();

    let mut rewritten = Vec::new();
    let mut skipped = Vec::new();
    for (path, id) in manifest.iter() {
        if !is_midi_path(path) || !paths.matches(path) {
            continue;
        }
        if work.as_ref().is_some_and(|w| w.get(path) != Some(id)) {
            debug!(path, "uncommitted changes, not transposing");
            skipped.push(SkippedPath {
                path: path.to_string(),
                reason: "uncommitted changes in working tree".to_string(),
            });
            continue;
        }

        let data = match repo.store().fetch(id)? {
            Fetch::Found(data) => data,
            Fetch::Missing(reason) => {
                let reason = match reason {
                    MissingReason::NotStored => "object not available locally",
                    MissingReason::Corrupted => "object corrupted",
                };
                warn!(path, object = %id, reason, "transpose skipped path");
                skipped.push(SkippedPath {
                    path: path.to_string(),
                    reason: reason.to_string(),
                });
                continue;
            }
        };

        match transpose_notes(&data, semitones, track) {
            Ok(result) if result.data != data => {
                debug!(path, notes = result.notes_changed, "notes shifted");
                rewritten.push((path.to_string(), result.data));
            }
            Ok(_) => {}
            Err(MuseError::MalformedMidi { offset, reason }) => {
                warn!(path, offset, reason = %reason, "malformed MIDI skipped");
                skipped.push(SkippedPath {
                    path: path.to_string(),
                    reason: format!("malformed MIDI at byte {}: {}", offset, reason),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let modified: Vec<String> = rewritten.iter().map(|(p, _)| p.clone()).collect();

    if options.dry_run {
        return Ok(TransposeOutcome::DryRun {
            would_modify: modified,
            skipped,
        });
    }
    if rewritten.is_empty() {
        return Ok(TransposeOutcome::NoOp { skipped });
    }

    let mut new_manifest = manifest;
    for (path, data) in &rewritten {
        let id = repo.store().put(data)?;
        new_manifest.insert(path.clone(), id);
    }

    let new_key = source.key().map(|k| shift_key(k, semitones));
    let mut metadata = source.metadata.clone();
    if let Some(key) = &new_key {
        metadata.insert(KEY_METADATA.to_string(), key.clone());
    }

    let message = options
        .message
        .clone()
        .unwrap_or_else(|| format!("Transpose {} ({:+} semitones)", options.interval.trim(), semitones));
    let commit = repo.record_commit(Parents::Single(source.id), new_manifest, &message, metadata)?;

    repo.advance_head(commit.id)?;
    for (path, data) in &rewritten {
        repo.worktree().write_file(path, data)?;
    }

    info!(commit = %commit.id, semitones, files = modified.len(), "transpose committed");
    Ok(TransposeOutcome::Committed {
        commit_id: commit.id,
        modified,
        skipped,
        new_key,
    })
}
