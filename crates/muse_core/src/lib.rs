//! Muse Core Library
//!
//! A content-addressed version-control engine for music projects, providing:
//! - Content-addressed object storage
//! - Deterministic snapshot and commit identities
//! - A commit graph with merge commits and branch refs
//! - Blame, stash, revert and MIDI transposition built on top
//!
//! # Quick Start
//!
//! ```
//! use muse_core::{ObjectStore, ObjectId};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let store = ObjectStore::new(tmp.path().join("objects"));
//!
//! // Same content = same ID (deduplication)
//! let id1 = store.put(b"MThd...").unwrap();
//! let id2 = store.put(b"MThd...").unwrap();
//! assert_eq!(id1, id2);
//! assert_eq!(id1, ObjectId::hash_bytes(b"MThd..."));
//! ```
//!
//! # Repositories
//!
//! A repository keeps its metadata in `.muse/` and its mutable files in
//! `muse-work/`:
//!
//! ```
//! use muse_core::{BlameOptions, MuseRepo};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let mut repo = MuseRepo::init(tmp.path()).unwrap();
//!
//! repo.worktree().write_file("verse/bass.mid", b"bass").unwrap();
//! let first = repo.commit("Add bass").unwrap();
//!
//! let report = repo.blame(&BlameOptions::default()).unwrap();
//! assert_eq!(report.entries[0].commit_id, first);
//! ```

mod blame;
mod commit;
mod config;
mod diff;
mod error;
mod history;
mod manifest;
mod merge_state;
pub mod midi;
mod object_id;
mod object_store;
mod refs;
mod repo;
mod revert;
mod scope;
mod stash;
mod transpose;
mod validate;
mod worktree;

pub use blame::{blame, BlameEntry, BlameOptions, BlameReport, ChangeKind};
pub use commit::{commit_id, Commit, Parents, KEY_METADATA};
pub use config::{Config, HistoryConfig, StorageConfig, UserConfig, DEFAULT_TRAVERSAL_LIMIT};
pub use diff::{diff_manifests, ManifestDiff};
pub use error::{MuseError, Result};
pub use history::{HistoryStore, RedbHistory, HISTORY_SCHEMA_VERSION};
pub use manifest::{Manifest, Snapshot};
pub use merge_state::MergeState;
pub use object_id::{CommitId, ObjectId, SnapshotId};
pub use object_store::{Fetch, MissingReason, ObjectStore, DEFAULT_COMPRESSION_LEVEL};
pub use refs::{Refs, DEFAULT_BRANCH};
pub use repo::{Head, MuseRepo, MUSE_DIR};
pub use revert::{revert, RevertOptions, RevertOutcome};
pub use scope::Scope;
pub use stash::{StashApply, StashEntry, StashPush};
pub use transpose::{
    parse_interval, shift_key, transpose, SkippedPath, TransposeOptions, TransposeOutcome,
};
pub use validate::{validate, ValidateConfig, ValidateReport};
pub use worktree::{RestoreMode, RestoreReport, WorkTree, WORK_DIR};
