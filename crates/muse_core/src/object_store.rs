//! Content-addressed object storage with integrity verification.

use crate::error::{MuseError, Result};
use crate::object_id::ObjectId;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Maximum size for a single blob object (100 MB).
const MAX_BLOB_SIZE: usize = 100 * 1024 * 1024;

/// Default zstd compression level for object storage.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Why object bytes could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// No object file exists for the id.
    NotStored,
    /// The object file exists but fails decompression or hash verification.
    Corrupted,
}

/// Result of a non-fatal object read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    /// The verified object bytes.
    Found(Vec<u8>),
    /// The bytes are unavailable locally.
    Missing(MissingReason),
}

/// Content-addressed object storage.
///
/// Objects are stored as zstd-compressed files at
/// `objects/{id[..2]}/{id[2..]}`. Writes are first-write-wins: an id that
/// already exists is never rewritten.
///
/// # Examples
///
/// ```
/// use muse_core::ObjectStore;
/// use tempfile::TempDir;
///
/// let tmp = TempDir::new().unwrap();
/// let store = ObjectStore::new(tmp.path().join("objects"));
///
/// let id = store.put(b"hello world").unwrap();
/// assert!(store.has(id));
/// assert_eq!(store.get(id).unwrap(), b"hello world");
/// ```
pub struct ObjectStore {
    root: PathBuf,
    compression_level: i32,
}

impl ObjectStore {
    /// Creates a new ObjectStore at the given root directory.
    ///
    /// Shard directories are created lazily on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Overrides the zstd compression level used for new objects.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Returns the root directory of this object store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores raw bytes and returns their content-addressed ID.
    ///
    /// Re-putting identical bytes is a no-op that returns the same ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is too large or writing fails.
    pub fn put(&self, data: &[u8]) -> Result<ObjectId> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(MuseError::BlobTooLarge {
                size: data.len(),
                limit: MAX_BLOB_SIZE,
            });
        }

        let id = ObjectId::hash_bytes(data);

        if self.has(id) {
            return Ok(id);
        }

        self.write_object(id, data)?;
        Ok(id)
    }

    /// Retrieves raw bytes by their content ID.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if the object doesn't exist.
    /// Returns `HashMismatch` or `CorruptedObject` if integrity verification fails.
    pub fn get(&self, id: ObjectId) -> Result<Vec<u8>> {
        let path = self.object_path(id);

        if !path.exists() {
            return Err(MuseError::ObjectNotFound(id.as_hex()));
        }

        let compressed = fs::read(&path)?;
        let data = zstd::decode_all(compressed.as_slice()).map_err(|e| {
            MuseError::CorruptedObject {
                path: path.clone(),
                reason: format!("decompression failed: {}", e),
            }
        })?;

        let actual = ObjectId::hash_bytes(&data);
        if actual != id {
            return Err(MuseError::HashMismatch {
                expected: id.as_hex(),
                actual: actual.as_hex(),
            });
        }

        Ok(data)
    }

    /// Reads an object, turning absence or corruption into [`Fetch::Missing`].
    ///
    /// Callers that can keep going without a path (stash apply, revert into
    /// the working tree, transpose) use this instead of [`ObjectStore::get`].
    /// I/O failures other than absence are still returned as errors.
    pub fn fetch(&self, id: ObjectId) -> Result<Fetch> {
        match self.get(id) {
            Ok(data) => Ok(Fetch::Found(data)),
            Err(MuseError::ObjectNotFound(_)) => Ok(Fetch::Missing(MissingReason::NotStored)),
            Err(e @ (MuseError::HashMismatch { .. } | MuseError::CorruptedObject { .. })) => {
                warn!(object = %id, error = %e, "object failed verification");
                Ok(Fetch::Missing(MissingReason::Corrupted))
            }
            Err(e) => Err(e),
        }
    }

    /// Checks if an object exists in the store.
    pub fn has(&self, id: ObjectId) -> bool {
        self.object_path(id).exists()
    }

    /// Lists all object ids in the store, sorted.
    ///
    /// Unparseable file names and leftover temp files are ignored.
    pub fn list_all(&self) -> Result<Vec<ObjectId>> {
        let mut objects = Vec::new();

        if !self.root.exists() {
            return Ok(objects);
        }

        for shard_entry in fs::read_dir(&self.root)? {
            let shard_path = shard_entry?.path();
            if !shard_path.is_dir() {
                continue;
            }
            let Some(shard) = shard_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let shard = shard.to_string();

            for obj_entry in fs::read_dir(&shard_path)? {
                let obj_path = obj_entry?.path();
                if !obj_path.is_file() || obj_path.extension().is_some() {
                    continue;
                }
                let Some(rest) = obj_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                match ObjectId::from_hex(&format!("{}{}", shard, rest)) {
                    Ok(id) => objects.push(id),
                    Err(_) => warn!(path = %obj_path.display(), "ignoring stray file in object store"),
                }
            }
        }

        objects.sort();
        Ok(objects)
    }

    /// Computes the filesystem path for an object.
    fn object_path(&self, id: ObjectId) -> PathBuf {
        self.root.join(id.shard()).join(id.shard_rest())
    }

    /// Writes compressed bytes to disk atomically.
    fn write_object(&self, id: ObjectId, data: &[u8]) -> Result<()> {
        let path = self.object_path(id);
        let dir = self.root.join(id.shard());

        fs::create_dir_all(&dir)?;

        let compressed = zstd::encode_all(data, self.compression_level)
            .map_err(|e| MuseError::Compression(e.to_string()))?;

        // temp file + fsync + rename
        let tmp_path = path.with_extension("tmp");

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &path)?;

        #[cfg(unix)]
        {
            if let Ok(dir_file) = File::open(&dir) {
                let _ = dir_file.sync_all();
            }
        }

        Ok(())
    }
}
