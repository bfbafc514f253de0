//! Repository handle providing the main Muse API.

use crate::blame::{BlameOptions, BlameReport};
use crate::commit::{Commit, Parents};
use crate::config::{Config, DEFAULT_CONFIG_TOML};
use crate::diff::{diff_manifests, ManifestDiff};
use crate::error::{MuseError, Result};
use crate::history::{HistoryStore, RedbHistory};
use crate::manifest::{Manifest, Snapshot};
use crate::merge_state::{ensure_no_conflicts, MergeState};
use crate::object_id::{CommitId, ObjectId, SnapshotId};
use crate::object_store::ObjectStore;
use crate::refs::{Refs, DEFAULT_BRANCH};
use crate::revert::{RevertOptions, RevertOutcome};
use crate::scope::Scope;
use crate::stash::{StashApply, StashEntry, StashPush};
use crate::transpose::{TransposeOptions, TransposeOutcome};
use crate::validate::{ValidateConfig, ValidateReport};
use crate::worktree::{RestoreMode, RestoreReport, WorkTree, WORK_DIR};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Name of the metadata directory under the repository root.
pub const MUSE_DIR: &str = ".muse";

/// The branch HEAD names and the commit that branch points at.
///
/// Loaded once at open and changed only through [`MuseRepo`] methods, so no
/// operation reads the current position from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// Current branch.
    pub branch: String,
    /// Branch head, or `None` before the first commit.
    pub commit: Option<CommitId>,
}

/// Muse repository handle.
///
/// Owns the object store, history store, refs and working tree of one
/// repository.
pub struct MuseRepo {
    /// Root directory containing the repository (parent of `.muse`).
    root: PathBuf,
    /// Content-addressed object store.
    store: ObjectStore,
    /// Snapshot and commit rows.
    history: RedbHistory,
    /// HEAD and branch files.
    refs: Refs,
    /// `muse-work/`.
    worktree: WorkTree,
    /// Loaded `.muse/config.toml`.
    config: Config,
    /// Current position.
    head: Head,
    /// Time provider for testing (None = use system time).
    time_provider: Option<Arc<dyn Fn() -> u64 + Send + Sync>>,
}

impl MuseRepo {
    /// Opens an existing Muse repository.
    ///
    /// # Errors
    ///
    /// Returns `NotARepository` if the `.muse` directory doesn't exist, or an
    /// error if config, HEAD or the history store can't be read.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use muse_core::MuseRepo;
    ///
    /// let repo = MuseRepo::open(".").unwrap();
    /// println!("on branch {}", repo.head().branch);
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let muse_dir = root.join(MUSE_DIR);

        if !muse_dir.is_dir() {
            return Err(MuseError::NotARepository(root));
        }

        let config = Config::load(&muse_dir)?;
        let store = ObjectStore::new(muse_dir.join("objects"))
            .with_compression_level(config.storage.compression_level);
        let refs = Refs::new(&muse_dir);
        let history = RedbHistory::open(muse_dir.join("history.redb"))?;

        let branch = refs.current_branch()?;
        let commit = match refs.read_branch(&branch) {
            Ok(commit) => commit,
            Err(MuseError::RefNotFound(_)) => None,
            Err(e) => return Err(e),
        };
        debug!(branch = %branch, head = ?commit, "repository opened");

        Ok(Self {
            worktree: WorkTree::new(root.join(WORK_DIR)),
            root,
            store,
            history,
            refs,
            config,
            head: Head { branch, commit },
            time_provider: None,
        })
    }

    /// Initializes a new Muse repository.
    ///
    /// Creates `.muse/` with a default config, HEAD pointing at an empty
    /// `main` branch, and an empty `muse-work/` directory.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` if `.muse` already exists.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use muse_core::MuseRepo;
    ///
    /// let repo = MuseRepo::init(".").unwrap();
    /// assert!(repo.head().commit.is_none());
    /// ```
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let muse_dir = root.join(MUSE_DIR);

        if muse_dir.exists() {
            return Err(MuseError::AlreadyInitialized(root));
        }

        fs::create_dir_all(muse_dir.join("objects"))?;
        fs::create_dir_all(muse_dir.join("refs/heads"))?;
        fs::create_dir_all(muse_dir.join("stash"))?;
        fs::create_dir_all(root.join(WORK_DIR))?;

        fs::write(muse_dir.join("config.toml"), DEFAULT_CONFIG_TOML)?;
        fs::write(muse_dir.join(".gitignore"), "LOCK\n*.tmp\n")?;

        let refs = Refs::new(&muse_dir);
        refs.write_branch(DEFAULT_BRANCH, None)?;
        refs.set_head(DEFAULT_BRANCH)?;

        info!(root = %root.display(), "initialized muse repository");
        Self::open(root)
    }

    /// Sets a custom time provider (Unix seconds) for testing.
    pub fn with_time_provider(mut self, provider: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.time_provider = Some(Arc::new(provider));
        self
    }

    /// Returns the repository root (parent of `.muse`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `.muse` directory path.
    pub fn muse_dir(&self) -> PathBuf {
        self.root.join(MUSE_DIR)
    }

    /// Returns the content-addressed object store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Returns the history store.
    pub fn history(&self) -> &dyn HistoryStore {
        &self.history
    }

    /// Returns the refs manager.
    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Returns the working tree.
    pub fn worktree(&self) -> &WorkTree {
        &self.worktree
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current position.
    pub fn head(&self) -> &Head {
        &self.head
    }

    /// Current time in Unix seconds.
    pub(crate) fn now(&self) -> u64 {
        match &self.time_provider {
            Some(provider) => provider(),
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Loads a commit row.
    ///
    /// # Errors
    ///
    /// Returns `CommitNotFound` if no such commit was recorded.
    pub fn load_commit(&self, id: CommitId) -> Result<Commit> {
        self.history
            .get_commit(id)?
            .ok_or_else(|| MuseError::CommitNotFound(id.as_hex()))
    }

    /// Loads a snapshot's manifest.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound` if no such snapshot was recorded.
    pub fn load_manifest(&self, id: SnapshotId) -> Result<Manifest> {
        self.history
            .get_snapshot(id)?
            .map(|s| s.manifest)
            .ok_or_else(|| MuseError::SnapshotNotFound(id.as_hex()))
    }

    /// Loads the manifest a commit records.
    pub fn commit_manifest(&self, commit: &Commit) -> Result<Manifest> {
        self.load_manifest(commit.snapshot_id)
    }

    /// Returns the HEAD commit, or `None` before the first commit.
    pub fn head_commit(&self) -> Result<Option<Commit>> {
        self.head.commit.map(|id| self.load_commit(id)).transpose()
    }

    /// Returns the HEAD manifest; empty before the first commit.
    pub fn head_manifest(&self) -> Result<Manifest> {
        match self.head_commit()? {
            Some(commit) => self.commit_manifest(&commit),
            None => Ok(Manifest::new()),
        }
    }

    /// Snapshots the working tree and commits it on the current branch.
    ///
    /// # Errors
    ///
    /// Returns `NothingToCommit` if the tree matches HEAD (or is empty on a
    /// branch without commits).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use muse_core::MuseRepo;
    ///
    /// let mut repo = MuseRepo::open(".").unwrap();
    /// let id = repo.commit("Add chorus drums").unwrap();
    /// println!("Created commit: {}", id.short());
    /// ```
    pub fn commit(&mut self, message: &str) -> Result<CommitId> {
        self.commit_with_metadata(message, BTreeMap::new())
    }

    /// Like [`MuseRepo::commit`], attaching metadata such as a key annotation.
    ///
    /// HEAD's metadata is inherited; entries in `metadata` override it.
    pub fn commit_with_metadata(
        &mut self,
        message: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<CommitId> {
        let _lock = self.acquire_lock()?;

        let manifest = self.worktree.snapshot_into(&self.store, &Scope::all())?;
        let head = self.head_commit()?;

        let unchanged = match &head {
            Some(commit) => manifest.snapshot_id() == commit.snapshot_id,
            None => manifest.is_empty(),
        };
        if unchanged {
            return Err(MuseError::NothingToCommit);
        }

        let mut merged = head.map(|c| c.metadata).unwrap_or_default();
        merged.extend(metadata);

        let parents = match self.head.commit {
            Some(parent) => Parents::Single(parent),
            None => Parents::Root,
        };
        let commit = self.record_commit(parents, manifest, message, merged)?;
        self.advance_head(commit.id)?;
        Ok(commit.id)
    }

    /// Records a two-parent commit of the working tree: HEAD plus `theirs`.
    ///
    /// Clears any merge state on success.
    ///
    /// # Errors
    ///
    /// Returns `MergeConflictsPending` while conflicts are listed, and
    /// `NoCommits` if the current branch is empty.
    pub fn commit_merge(&mut self, theirs: &str, message: &str) -> Result<CommitId> {
        let _lock = self.acquire_lock()?;
        ensure_no_conflicts(&self.muse_dir())?;

        let ours = self
            .head
            .commit
            .ok_or_else(|| MuseError::NoCommits(self.head.branch.clone()))?;
        let theirs = self.resolve_ref(theirs)?;
        if theirs == ours {
            return Err(MuseError::NothingToCommit);
        }

        let metadata = self.load_commit(ours)?.metadata;
        let manifest = self.worktree.snapshot_into(&self.store, &Scope::all())?;
        let commit = self.record_commit(Parents::Merge(ours, theirs), manifest, message, metadata)?;

        self.advance_head(commit.id)?;
        MergeState::clear(&self.muse_dir())?;
        Ok(commit.id)
    }

    /// Persists the snapshot, then the commit. Does not touch refs.
    ///
    /// Objects must already be in the store.
    pub(crate) fn record_commit(
        &self,
        parents: Parents,
        manifest: Manifest,
        message: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<Commit> {
        let snapshot = Snapshot::new(manifest);
        self.history.put_snapshot(&snapshot)?;

        let commit = Commit::new(
            self.head.branch.clone(),
            parents,
            snapshot.id,
            message,
            self.config.user.name.clone(),
            self.now(),
        )
        .with_metadata(metadata);
        self.history.put_commit(&commit)?;

        info!(commit = %commit.id, branch = %commit.branch, "commit recorded");
        Ok(commit)
    }

    /// Moves the current branch to a durable commit.
    pub(crate) fn advance_head(&mut self, id: CommitId) -> Result<()> {
        self.refs.write_branch(&self.head.branch, Some(id))?;
        self.head.commit = Some(id);
        debug!(branch = %self.head.branch, commit = %id, "branch advanced");
        Ok(())
    }

    /// Resolves a branch name, `HEAD`, a full commit id, or an unambiguous
    /// prefix of at least four hex characters.
    ///
    /// # Errors
    ///
    /// - `NoCommits` for an empty branch
    /// - `AmbiguousRef` when a prefix matches several commits
    /// - `CommitNotFound` when an id or prefix matches nothing
    /// - `RefNotFound` for anything else
    pub fn resolve_ref(&self, spec: &str) -> Result<CommitId> {
        let spec = spec.trim();

        if spec == "HEAD" {
            return self
                .head
                .commit
                .ok_or_else(|| MuseError::NoCommits(self.head.branch.clone()));
        }

        if self.refs.branch_exists(spec) {
            return self
                .refs
                .read_branch(spec)?
                .ok_or_else(|| MuseError::NoCommits(spec.to_string()));
        }

        let is_hex = !spec.is_empty() && spec.chars().all(|c| c.is_ascii_hexdigit());
        if !is_hex || spec.len() < ObjectId::MIN_PREFIX_LEN || spec.len() > ObjectId::HEX_LEN {
            return Err(MuseError::RefNotFound(spec.to_string()));
        }

        if spec.len() == ObjectId::HEX_LEN {
            let id = ObjectId::from_hex(spec)?;
            return match self.history.get_commit(id)? {
                Some(_) => Ok(id),
                None => Err(MuseError::CommitNotFound(spec.to_string())),
            };
        }

        let mut matches = self.history.commit_ids_with_prefix(spec)?;
        match matches.len() {
            0 => Err(MuseError::CommitNotFound(spec.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(MuseError::AmbiguousRef {
                prefix: spec.to_string(),
                matches: matches.iter().map(ObjectId::as_hex).collect(),
            }),
        }
    }

    /// Walks first parents from `start` (default HEAD), newest first.
    ///
    /// Stops at `limit` commits, at the configured traversal limit, or at a
    /// commit whose row is missing.
    pub fn log(&self, start: Option<&str>, limit: Option<usize>) -> Result<Vec<Commit>> {
        let mut next = match start {
            Some(spec) => Some(self.resolve_ref(spec)?),
            None => self.head.commit,
        };
        let cap = limit
            .unwrap_or(usize::MAX)
            .min(self.config.history.traversal_limit);

        let mut commits = Vec::new();
        while let Some(id) = next {
            if commits.len() >= cap {
                break;
            }
            let commit = match self.history.get_commit(id)? {
                Some(c) => c,
                None => {
                    warn!(commit = %id, "commit missing from history, log truncated");
                    break;
                }
            };
            next = commit.parents.first();
            commits.push(commit);
        }
        Ok(commits)
    }

    /// Lists every branch with its head, sorted by name.
    pub fn branches(&self) -> Result<Vec<(String, Option<CommitId>)>> {
        self.refs.list_branches()
    }

    /// Creates a branch at `start` (default HEAD). Does not switch to it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRef` if the branch already exists or the name is invalid.
    pub fn create_branch(&self, name: &str, start: Option<&str>) -> Result<Option<CommitId>> {
        let _lock = self.acquire_lock()?;

        if self.refs.branch_exists(name) {
            return Err(MuseError::InvalidRef {
                path: self.muse_dir().join("refs/heads").join(name),
                reason: "branch already exists".to_string(),
            });
        }

        let target = match start {
            Some(spec) => Some(self.resolve_ref(spec)?),
            None => self.head.commit,
        };
        self.refs.write_branch(name, target)?;
        info!(branch = name, head = ?target, "branch created");
        Ok(target)
    }

    /// Points HEAD at another branch and fully restores its tree.
    ///
    /// # Errors
    ///
    /// Returns `RefNotFound` if the branch doesn't exist.
    pub fn switch_branch(&mut self, name: &str) -> Result<RestoreReport> {
        let _lock = self.acquire_lock()?;

        let target = self.refs.read_branch(name)?;
        let manifest = match target {
            Some(id) => self.commit_manifest(&self.load_commit(id)?)?,
            None => Manifest::new(),
        };

        let report = self
            .worktree
            .restore(&manifest, &self.store, &RestoreMode::Full)?;
        self.refs.set_head(name)?;
        self.head = Head {
            branch: name.to_string(),
            commit: target,
        };
        info!(branch = name, "switched branch");
        Ok(report)
    }

    /// Working tree vs HEAD.
    pub fn status(&self) -> Result<ManifestDiff> {
        let head = self.head_manifest()?;
        let work = self.worktree.scan()?;
        Ok(diff_manifests(&head, &work))
    }

    /// Manifest differences between two commits.
    pub fn diff(&self, from: &str, to: &str) -> Result<ManifestDiff> {
        let from = self.commit_manifest(&self.load_commit(self.resolve_ref(from)?)?)?;
        let to = self.commit_manifest(&self.load_commit(self.resolve_ref(to)?)?)?;
        Ok(diff_manifests(&from, &to))
    }

    /// Returns the recorded merge state, if a merge is in progress.
    pub fn merge_state(&self) -> Result<Option<MergeState>> {
        MergeState::load(&self.muse_dir())
    }

    /// Attribute each path to the last commit that changed it.
    ///
    /// See `crate::blame::blame` for details.
    pub fn blame(&self, options: &BlameOptions) -> Result<BlameReport> {
        crate::blame::blame(self, options)
    }

    /// Shelve working-tree changes. See `crate::stash::push`.
    pub fn stash_push(&self, message: Option<&str>, scope: &Scope) -> Result<StashPush> {
        crate::stash::push(self, message, scope)
    }

    /// Restore a stash entry, optionally dropping it. See `crate::stash::apply`.
    pub fn stash_apply(&self, index: usize, drop: bool) -> Result<StashApply> {
        crate::stash::apply(self, index, drop)
    }

    /// Stash entries, most recent first.
    pub fn stash_list(&self) -> Result<Vec<StashEntry>> {
        crate::stash::list(self)
    }

    /// Remove one stash entry.
    pub fn stash_drop(&self, index: usize) -> Result<StashEntry> {
        crate::stash::drop(self, index)
    }

    /// Remove every stash entry, returning how many were removed.
    pub fn stash_clear(&self) -> Result<usize> {
        crate::stash::clear(self)
    }

    /// Undo a commit. See `crate::revert::revert`.
    pub fn revert(&mut self, options: &RevertOptions) -> Result<RevertOutcome> {
        crate::revert::revert(self, options)
    }

    /// Shift MIDI note pitches. See `crate::transpose::transpose`.
    pub fn transpose(&mut self, options: &TransposeOptions) -> Result<TransposeOutcome> {
        crate::transpose::transpose(self, options)
    }

    /// Verify repository integrity. See `crate::validate::validate`.
    pub fn validate(&self, config: ValidateConfig) -> Result<ValidateReport> {
        crate::validate::validate(self, config)
    }

    /// Acquires exclusive lock on repository.
    ///
    /// The lock file contains the PID of the owning process. If the lock is held
    /// by a dead process (stale lock), it will be automatically cleaned up.
    pub(crate) fn acquire_lock(&self) -> Result<LockGuard> {
        let lock_path = self.muse_dir().join("LOCK");
        acquire_lock_with_retry(&lock_path, 0)
    }
}

/// Internal helper for lock acquisition with retry count.
fn acquire_lock_with_retry(lock_path: &Path, retry_count: u32) -> Result<LockGuard> {
    if retry_count > 2 {
        return Err(MuseError::RepositoryLocked);
    }

    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let pid = std::process::id();
            writeln!(file, "{}", pid)?;
            file.flush()?;

            file.try_lock_exclusive()
                .map_err(|_| MuseError::RepositoryLocked)?;

            Ok(LockGuard {
                file: Some(file),
                path: lock_path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            handle_existing_lock(lock_path, retry_count)
        }
        Err(e) => Err(MuseError::Io(e)),
    }
}

/// Handle the case where a lock file already exists.
fn handle_existing_lock(lock_path: &Path, retry_count: u32) -> Result<LockGuard> {
    match fs::read_to_string(lock_path) {
        Ok(content) => {
            if let Ok(pid) = content.trim().parse::<u32>() {
                if is_process_alive(pid) {
                    return Err(MuseError::LockHeld { pid });
                }

                warn!(pid = pid, "Detected stale lock from dead process, cleaning up");

                if let Err(e) = fs::remove_file(lock_path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        return Err(MuseError::Io(e));
                    }
                }

                return acquire_lock_with_retry(lock_path, retry_count + 1);
            }

            warn!("Lock file has invalid content, attempting cleanup");
            let _ = fs::remove_file(lock_path);
            acquire_lock_with_retry(lock_path, retry_count + 1)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            acquire_lock_with_retry(lock_path, retry_count + 1)
        }
        Err(_) => Err(MuseError::RepositoryLocked),
    }
}

/// RAII guard for repository lock.
///
/// Holds an exclusive lock on the repository's LOCK file. The lock is
/// automatically released when dropped, and the lock file is removed.
pub(crate) struct LockGuard {
    /// Wrapped in Option to allow taking ownership in Drop.
    file: Option<File>,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
        }
        let _ = fs::remove_file(&self.path);
    }
}

/// Check if a process with the given PID is still alive.
///
/// On Linux, uses /proc/{pid}/stat. On other Unix systems, asks `kill -0`.
/// On non-Unix systems, conservatively assumes the process is alive.
#[cfg(target_os = "linux")]
fn is_process_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{}/stat", pid)).exists()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(true)
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    true
}
