//! HEAD and branch ref files.
//!
//! `HEAD` holds `refs/heads/<branch>`. Each branch file holds a hex commit id,
//! or nothing when the branch has no commits yet.

use crate::error::{MuseError, Result};
use crate::object_id::{CommitId, ObjectId};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prefix of the symbolic ref stored in `HEAD`.
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Branch created by `init`.
pub const DEFAULT_BRANCH: &str = "main";

/// Manages `HEAD` and the branch files under `refs/heads/`.
///
/// All write operations are atomic using temp file + rename.
pub struct Refs {
    root: PathBuf,
}

impl Refs {
    /// Creates a new Refs manager for the given `.muse` directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Reads the branch name HEAD points at.
    ///
    /// # Errors
    ///
    /// Returns `RefNotFound` if HEAD doesn't exist.
    /// Returns `InvalidRef` if HEAD isn't a `refs/heads/` pointer.
    pub fn current_branch(&self) -> Result<String> {
        let path = self.root.join("HEAD");
        if !path.exists() {
            return Err(MuseError::RefNotFound("HEAD".to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let branch = content
            .trim()
            .strip_prefix(HEADS_PREFIX)
            .ok_or_else(|| MuseError::InvalidRef {
                path: path.clone(),
                reason: format!("expected '{}<branch>'", HEADS_PREFIX),
            })?;

        validate_branch_name(branch).map_err(|reason| MuseError::InvalidRef {
            path: path.clone(),
            reason,
        })?;
        Ok(branch.to_string())
    }

    /// Points HEAD at a branch.
    pub fn set_head(&self, branch: &str) -> Result<()> {
        check_branch_name(branch)?;
        let content = format!("{}{}\n", HEADS_PREFIX, branch);
        write_atomic(&self.root.join("HEAD"), content.as_bytes())
    }

    /// Reads a branch head.
    ///
    /// Returns `None` for a branch that exists but has no commits.
    ///
    /// # Errors
    ///
    /// Returns `RefNotFound` if the branch file doesn't exist.
    /// Returns `InvalidRef` if the content is malformed.
    pub fn read_branch(&self, branch: &str) -> Result<Option<CommitId>> {
        check_branch_name(branch)?;
        let path = self.branch_path(branch);
        if !path.exists() {
            return Err(MuseError::RefNotFound(branch.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if trimmed.len() != ObjectId::HEX_LEN {
            return Err(MuseError::InvalidRef {
                path,
                reason: format!(
                    "expected {} hex chars, got {}",
                    ObjectId::HEX_LEN,
                    trimmed.len()
                ),
            });
        }

        ObjectId::from_hex(trimmed)
            .map(Some)
            .map_err(|_| MuseError::InvalidRef {
                path,
                reason: "invalid hex string".to_string(),
            })
    }

    /// Writes a branch head atomically; `None` empties the branch.
    ///
    /// Creates parent directories as needed.
    pub fn write_branch(&self, branch: &str, id: Option<CommitId>) -> Result<()> {
        check_branch_name(branch)?;
        let path = self.branch_path(branch);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = match id {
            Some(id) => format!("{}\n", id.as_hex()),
            None => String::new(),
        };
        write_atomic(&path, content.as_bytes())
    }

    /// True if the branch file exists.
    pub fn branch_exists(&self, branch: &str) -> bool {
        validate_branch_name(branch).is_ok() && self.branch_path(branch).is_file()
    }

    /// Lists every branch with its head, sorted by name.
    ///
    /// Malformed branch files are skipped.
    pub fn list_branches(&self) -> Result<Vec<(String, Option<CommitId>)>> {
        let heads = self.root.join(HEADS_PREFIX);
        if !heads.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        collect_names(&heads, &heads, &mut names)?;
        names.sort();

        let mut branches = Vec::with_capacity(names.len());
        for name in names {
            if let Ok(head) = self.read_branch(&name) {
                branches.push((name, head));
            }
        }
        Ok(branches)
    }

    fn branch_path(&self, branch: &str) -> PathBuf {
        self.root.join(HEADS_PREFIX).join(branch)
    }
}

/// Rejects names that would escape `refs/heads/` or collide with temp files.
fn validate_branch_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("branch name is empty".to_string());
    }
    if name.ends_with(".tmp") {
        return Err("branch name may not end in .tmp".to_string());
    }
    for part in name.split('/') {
        if part.is_empty() || part.starts_with('.') {
            return Err(format!("invalid branch name component '{}'", part));
        }
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control() || c == '\\') {
        return Err("branch name contains whitespace or control characters".to_string());
    }
    Ok(())
}

fn check_branch_name(name: &str) -> Result<()> {
    validate_branch_name(name).map_err(|reason| MuseError::InvalidRef {
        path: PathBuf::from(HEADS_PREFIX).join(name),
        reason,
    })
}

/// Recursively collects branch names under `refs/heads/`.
fn collect_names(current: &Path, base: &Path, names: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_names(&path, base, names)?;
        } else if path.is_file() {
            if path.extension().and_then(|s| s.to_str()) == Some("tmp") {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(base) {
                let name = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                names.push(name);
            }
        }
    }
    Ok(())
}

/// Writes a file atomically: temp file + fsync + rename + parent fsync.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;

    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            if let Ok(dir_file) = File::open(parent) {
                let _ = dir_file.sync_all();
            }
        }
    }

    Ok(())
}
