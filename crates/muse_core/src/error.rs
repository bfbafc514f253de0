//! Error types for muse_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for muse_core operations.
#[derive(Error, Debug)]
pub enum MuseError {
    /// Object with the given ID was not found in the store.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Commit with the given ID was not found in the history store.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// Snapshot with the given ID was not found in the history store.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// Hash verification failed during object read.
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// The expected object ID
        expected: String,
        /// The actual computed hash
        actual: String,
    },

    /// The object file is corrupted or has invalid format.
    #[error("corrupted object at {}: {}", path.display(), reason)]
    CorruptedObject {
        /// Path to the corrupted object
        path: PathBuf,
        /// Description of the corruption
        reason: String,
    },

    /// Invalid hex string for ObjectId parsing.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Serialization error for history rows, stash entries or merge state.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error for history rows, stash entries or merge state.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// Blob exceeds maximum allowed size.
    #[error("blob too large: {size} bytes exceeds limit of {limit} bytes")]
    BlobTooLarge {
        /// Actual size of the blob
        size: usize,
        /// Maximum allowed size
        limit: usize,
    },

    /// Reference (branch, HEAD) not found.
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// A commit prefix matched more than one commit.
    #[error("ambiguous ref '{prefix}': matches {} commits", matches.len())]
    AmbiguousRef {
        /// The prefix that was looked up
        prefix: String,
        /// Every full commit id that matched
        matches: Vec<String>,
    },

    /// Invalid ref file content or format.
    #[error("invalid ref at {}: {}", path.display(), reason)]
    InvalidRef {
        /// Path to the invalid ref file
        path: PathBuf,
        /// Description of what's invalid
        reason: String,
    },

    /// Stash index is out of range.
    #[error("stash@{{{index}}} does not exist ({len} entries)")]
    StashNotFound {
        /// Requested index
        index: usize,
        /// Number of entries on the stack
        len: usize,
    },

    /// The branch has no commits yet.
    #[error("branch '{0}' has no commits yet")]
    NoCommits(String),

    /// The working tree matches HEAD exactly.
    #[error("nothing to commit, working tree matches HEAD")]
    NothingToCommit,

    /// A merge with unresolved conflicts blocks the operation.
    #[error("unresolved merge conflicts in {} path(s)", paths.len())]
    MergeConflictsPending {
        /// Paths still listed as conflicted
        paths: Vec<String>,
    },

    /// Interval text could not be parsed.
    #[error("invalid interval '{input}': {reason}")]
    InvalidInterval {
        /// The raw interval text
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// Track glob could not be compiled.
    #[error("invalid track pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The raw glob text
        pattern: String,
        /// Parser error from the glob crate
        #[source]
        source: glob::PatternError,
    },

    /// A committing transpose was asked to start from a commit that is not HEAD.
    #[error("commit {commit} is not the head of '{branch}'")]
    NotBranchHead {
        /// The requested source commit
        commit: String,
        /// The current branch
        branch: String,
    },

    /// MIDI container could not be parsed.
    #[error("malformed MIDI at byte {offset}: {reason}")]
    MalformedMidi {
        /// Byte offset where parsing failed
        offset: usize,
        /// Description of the problem
        reason: String,
    },

    /// Directory is not a Muse repository.
    #[error("not a muse repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// Repository already exists.
    #[error("muse repository already exists at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// Repository is locked by another process.
    #[error("repository locked by another process")]
    RepositoryLocked,

    /// Lock is held by a live process.
    #[error("repository lock held by another process (PID: {pid})")]
    LockHeld {
        /// Process ID holding the lock
        pid: u32,
    },

    /// History store backend failure.
    #[error("history store error: {0}")]
    Storage(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MuseError {
    /// Returns true when the condition means "nothing to do" rather than failure.
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NothingToCommit)
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CorruptedObject { .. } | Self::HashMismatch { .. } => {
                Some("Run 'muse validate --objects' to list every damaged object.")
            }
            Self::ObjectNotFound(_) => {
                Some("Object bytes are not available locally. Run 'muse validate' to check.")
            }
            Self::AmbiguousRef { .. } => Some("Use a longer commit id prefix."),
            Self::NoCommits(_) => Some("Create a first commit with 'muse commit -m <message>'."),
            Self::MergeConflictsPending { .. } => {
                Some("Resolve the conflicted paths and finish the merge before retrying.")
            }
            Self::LockHeld { .. } => {
                Some("Another muse process is writing. Wait for it to finish.")
            }
            Self::RepositoryLocked => {
                Some("Remove .muse/LOCK manually if no other muse process is running.")
            }
            Self::NotARepository(_) => Some("Run 'muse init' first."),
            Self::NotBranchHead { .. } => Some(
                "Use --dry-run to preview, or create a branch at that commit and switch to it.",
            ),
            _ => None,
        }
    }
}

/// Convenience Result type for muse_core operations.
pub type Result<T> = std::result::Result<T, MuseError>;

/// Maps any history backend error into [`MuseError::Storage`].
pub(crate) fn storage_err(e: impl std::fmt::Display) -> MuseError {
    MuseError::Storage(e.to_string())
}
