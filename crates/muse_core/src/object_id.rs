//! Content identifiers shared by objects, snapshots and commits.

use crate::error::{MuseError, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte BLAKE3 hash identifying an object, snapshot or commit.
///
/// The same input always produces the same ObjectId. On disk and in JSON it
/// is always the 64-character lowercase hex form.
///
/// # Examples
///
/// ```
/// use muse_core::ObjectId;
///
/// let id = ObjectId::from_bytes([0xab; 32]);
/// assert_eq!(id.as_hex().len(), 64);
/// assert_eq!(id.shard(), "ab");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 32]);

/// Snapshot ids are hashes of a sorted manifest.
pub type SnapshotId = ObjectId;

/// Commit ids are hashes of parents, snapshot, message and timestamp.
pub type CommitId = ObjectId;

impl ObjectId {
    /// The length of an ObjectId in bytes.
    pub const LEN: usize = 32;

    /// The length of an ObjectId as a hex string.
    pub const HEX_LEN: usize = 64;

    /// Shortest prefix accepted when resolving abbreviated ids.
    pub const MIN_PREFIX_LEN: usize = 4;

    /// Creates an ObjectId from raw bytes.
    #[inline]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying 32-byte hash.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns this ObjectId as a lowercase hex string.
    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the first 8 hex characters, for display.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Returns the shard directory name (first 2 hex characters).
    ///
    /// Objects live at `.muse/objects/{shard}/{rest}`.
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Returns the file name inside the shard directory (hex chars 2..64).
    pub fn shard_rest(&self) -> String {
        hex::encode(&self.0[1..])
    }

    /// True when the hex form starts with `prefix` (case-insensitive).
    pub fn has_hex_prefix(&self, prefix: &str) -> bool {
        self.as_hex().starts_with(&prefix.to_ascii_lowercase())
    }

    /// Parses an ObjectId from a hex string.
    ///
    /// # Errors
    ///
    /// Returns `MuseError::InvalidHex` if the string is not valid hex
    /// or is not exactly 64 characters long.
    ///
    /// # Examples
    ///
    /// ```
    /// use muse_core::ObjectId;
    ///
    /// let hex = "a".repeat(64);
    /// let id = ObjectId::from_hex(&hex).unwrap();
    /// assert_eq!(id.as_hex(), hex);
    /// ```
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != Self::HEX_LEN {
            return Err(MuseError::InvalidHex(format!(
                "expected {} hex chars, got {}",
                Self::HEX_LEN,
                s.len()
            )));
        }

        let bytes = hex::decode(s).map_err(|e| MuseError::InvalidHex(e.to_string()))?;

        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| MuseError::InvalidHex("invalid length".to_string()))?;

        Ok(Self(arr))
    }

    /// Hashes raw content bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use muse_core::ObjectId;
    ///
    /// assert_eq!(ObjectId::hash_bytes(b"x"), ObjectId::hash_bytes(b"x"));
    /// assert_ne!(ObjectId::hash_bytes(b"x"), ObjectId::hash_bytes(b"y"));
    /// ```
    pub fn hash_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hashes `parts` joined by `|`.
    ///
    /// Callers are responsible for putting `parts` into canonical order.
    pub(crate) fn hash_joined<S: AsRef<str>>(parts: &[S]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                hasher.update(b"|");
            }
            hasher.update(part.as_ref().as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}...)", &self.as_hex()[..12])
    }
}

impl std::str::FromStr for ObjectId {
    type Err = MuseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
