//! The mutable working tree (`muse-work/`) and its conversion to manifests.

use crate::error::Result;
use crate::manifest::Manifest;
use crate::object_id::ObjectId;
use crate::object_store::{Fetch, ObjectStore};
use crate::scope::Scope;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name of the working tree directory under the repository root.
pub const WORK_DIR: &str = "muse-work";

/// Which part of the working tree a restore may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreMode {
    /// Every path: anything not in the target manifest is deleted.
    Full,
    /// Only paths matching the scope; everything else is left alone.
    Scoped(Scope),
}

impl RestoreMode {
    /// Picks `Full` for an empty scope, `Scoped` otherwise.
    pub fn for_scope(scope: &Scope) -> Self {
        if scope.is_empty() {
            RestoreMode::Full
        } else {
            RestoreMode::Scoped(scope.clone())
        }
    }

    fn scope(&self) -> Scope {
        match self {
            RestoreMode::Full => Scope::all(),
            RestoreMode::Scoped(s) => s.clone(),
        }
    }
}

/// What a restore changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Paths whose bytes were written.
    pub written: Vec<String>,
    /// Paths removed from the working tree.
    pub deleted: Vec<String>,
    /// Paths that should have been written but whose object is unavailable.
    pub missing: Vec<String>,
}

/// Handle on the working tree directory.
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    /// Creates a handle; the directory need not exist yet.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the working tree directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hashes every tracked file without storing anything.
    pub fn scan(&self) -> Result<Manifest> {
        let mut manifest = Manifest::new();
        for (rel, abs) in self.tracked_files()? {
            let data = fs::read(&abs)?;
            manifest.insert(rel, ObjectId::hash_bytes(&data));
        }
        Ok(manifest)
    }

    /// Stores every tracked file matching `scope` and returns its manifest.
    pub fn snapshot_into(&self, store: &ObjectStore, scope: &Scope) -> Result<Manifest> {
        let mut manifest = Manifest::new();
        for (rel, abs) in self.tracked_files()? {
            if !scope.matches(&rel) {
                continue;
            }
            let data = fs::read(&abs)?;
            let id = store.put(&data)?;
            manifest.insert(rel, id);
        }
        debug!(files = manifest.len(), "working tree snapshotted");
        Ok(manifest)
    }

    /// Reads a file by relative path.
    pub fn read_file(&self, rel: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(rel)?)?)
    }

    /// Writes a file by relative path, creating parent directories.
    pub fn write_file(&self, rel: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(())
    }

    /// Removes a file by relative path and prunes now-empty parent directories.
    ///
    /// Removing a file that does not exist is not an error.
    pub fn remove_file(&self, rel: &str) -> Result<()> {
        let path = self.resolve(rel)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root {
                break;
            }
            // fails when not empty, which ends the pruning
            if fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        Ok(())
    }

    /// Makes the working tree match `target` within the bounds of `mode`.
    ///
    /// Paths whose objects are unavailable are listed in
    /// [`RestoreReport::missing`] and left as they are on disk.
    pub fn restore(
        &self,
        target: &Manifest,
        store: &ObjectStore,
        mode: &RestoreMode,
    ) -> Result<RestoreReport> {
        let scope = mode.scope();
        let current = self.scan()?.filter(&scope);
        let target = target.filter(&scope);
        let mut report = RestoreReport::default();

        for path in current.paths() {
            if !target.contains(path) {
                self.remove_file(path)?;
                report.deleted.push(path.to_string());
            }
        }

        for (path, id) in target.iter() {
            if current.get(path) == Some(id) {
                continue;
            }
            match store.fetch(id)? {
                Fetch::Found(data) => {
                    self.write_file(path, &data)?;
                    report.written.push(path.to_string());
                }
                Fetch::Missing(reason) => {
                    warn!(path, object = %id, ?reason, "object unavailable, path not restored");
                    report.missing.push(path.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Lists `(relative, absolute)` for every regular, non-hidden file.
    fn tracked_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        if !self.root.exists() {
            return Ok(files);
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "walk failed"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            files.push((normalize(rel), entry.path().to_path_buf()));
        }

        Ok(files)
    }

    /// Joins a manifest path onto the root, refusing anything that escapes it.
    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let candidate = Path::new(rel);
        let safe = !rel.is_empty()
            && candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes working tree: {}", rel),
            )
            .into());
        }
        Ok(self.root.join(candidate))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

/// Renders a relative path with forward slashes on every platform.
fn normalize(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
