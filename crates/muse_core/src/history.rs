//! Persistent snapshot and commit rows.
//!
//! The [`HistoryStore`] trait is the get/upsert/query contract the rest of the
//! crate relies on. [`RedbHistory`] implements it on a redb database at
//! `.muse/history.redb`. Rows are immutable once written: putting an id that
//! already exists is a no-op.

use crate::commit::Commit;
use crate::error::{storage_err, MuseError, Result};
use crate::manifest::Snapshot;
use crate::object_id::{CommitId, ObjectId, SnapshotId};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// History schema version for migration support.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

const METADATA_TABLE: TableDefinition<&str, u32> = TableDefinition::new("metadata");
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");
const COMMITS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("commits");

/// Get/upsert/query over snapshot and commit rows.
pub trait HistoryStore {
    /// Stores a snapshot row. First write wins.
    fn put_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// Loads a snapshot row.
    fn get_snapshot(&self, id: SnapshotId) -> Result<Option<Snapshot>>;

    /// Stores a commit row. First write wins.
    fn put_commit(&self, commit: &Commit) -> Result<()>;

    /// Loads a commit row.
    fn get_commit(&self, id: CommitId) -> Result<Option<Commit>>;

    /// Every commit id whose hex form starts with `prefix`.
    fn commit_ids_with_prefix(&self, prefix: &str) -> Result<Vec<CommitId>>;

    /// Every commit row, in id order.
    fn all_commits(&self) -> Result<Vec<Commit>>;
}

/// redb-backed history store.
pub struct RedbHistory {
    db: Database,
    path: PathBuf,
}

impl RedbHistory {
    /// Opens the database, creating it and its tables if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be opened or has a schema
    /// version mismatch.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(storage_err)?;

        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let mut meta = write_txn.open_table(METADATA_TABLE).map_err(storage_err)?;
            let existing = meta
                .get("version")
                .map_err(storage_err)?
                .map(|v| v.value());
            match existing {
                Some(v) if v != HISTORY_SCHEMA_VERSION => {
                    return Err(MuseError::Storage(format!(
                        "history schema version mismatch: found {}, expected {}",
                        v, HISTORY_SCHEMA_VERSION
                    )));
                }
                Some(_) => {}
                None => {
                    meta.insert("version", HISTORY_SCHEMA_VERSION)
                        .map_err(storage_err)?;
                }
            }
            write_txn.open_table(SNAPSHOTS_TABLE).map_err(storage_err)?;
            write_txn.open_table(COMMITS_TABLE).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(Self { db, path })
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn put_row<T: Serialize>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> Result<bool> {
        let bytes =
            postcard::to_allocvec(value).map_err(|e| MuseError::Serialization(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let inserted = {
            let mut t = write_txn.open_table(table).map_err(storage_err)?;
            let exists = t.get(key).map_err(storage_err)?.is_some();
            if !exists {
                t.insert(key, bytes.as_slice()).map_err(storage_err)?;
            }
            !exists
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(inserted)
    }

    fn get_row<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> Result<Option<T>> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let t = read_txn.open_table(table).map_err(storage_err)?;
        match t.get(key).map_err(storage_err)? {
            Some(guard) => {
                let value = postcard::from_bytes(guard.value())
                    .map_err(|e| MuseError::Deserialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl HistoryStore for RedbHistory {
    fn put_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if self.put_row(SNAPSHOTS_TABLE, &snapshot.id.as_hex(), snapshot)? {
            debug!(snapshot = %snapshot.id, files = snapshot.manifest.len(), "snapshot stored");
        }
        Ok(())
    }

    fn get_snapshot(&self, id: SnapshotId) -> Result<Option<Snapshot>> {
        self.get_row(SNAPSHOTS_TABLE, &id.as_hex())
    }

    fn put_commit(&self, commit: &Commit) -> Result<()> {
        if self.put_row(COMMITS_TABLE, &commit.id.as_hex(), commit)? {
            debug!(commit = %commit.id, "commit stored");
        }
        Ok(())
    }

    fn get_commit(&self, id: CommitId) -> Result<Option<Commit>> {
        self.get_row(COMMITS_TABLE, &id.as_hex())
    }

    fn commit_ids_with_prefix(&self, prefix: &str) -> Result<Vec<CommitId>> {
        let prefix = prefix.to_ascii_lowercase();
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let t = read_txn.open_table(COMMITS_TABLE).map_err(storage_err)?;

        let mut ids = Vec::new();
        for entry in t.range::<&str>(prefix.as_str()..).map_err(storage_err)? {
            let (key, _) = entry.map_err(storage_err)?;
            let key = key.value();
            if !key.starts_with(&prefix) {
                break;
            }
            ids.push(ObjectId::from_hex(key)?);
        }
        Ok(ids)
    }

    fn all_commits(&self) -> Result<Vec<Commit>> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let t = read_txn.open_table(COMMITS_TABLE).map_err(storage_err)?;

        let mut commits = Vec::new();
        for entry in t.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            let commit: Commit = postcard::from_bytes(value.value())
                .map_err(|e| MuseError::Deserialization(e.to_string()))?;
            commits.push(commit);
        }
        Ok(commits)
    }
}
