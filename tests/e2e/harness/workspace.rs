use anyhow::{Context, Result};
use muse_core::{MuseRepo, WORK_DIR};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Manages isolated test environments with tempfile
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temp directory")?;
        Ok(Self { dir })
    }

    /// Create workspace with initial working-tree files
    pub fn with_files(files: HashMap<String, Vec<u8>>) -> Result<Self> {
        let workspace = Self::empty()?;
        for (path, content) in files {
            workspace.write_file(&path, &content)?;
        }
        Ok(workspace)
    }

    /// Repository root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The `muse-work/` directory
    pub fn work_dir(&self) -> PathBuf {
        self.path().join(WORK_DIR)
    }

    /// Initialize a Muse repository in the workspace
    pub fn init_muse(&self) -> Result<MuseRepo> {
        Ok(MuseRepo::init(self.path())?)
    }

    /// Open the existing repository
    pub fn open_muse(&self) -> Result<MuseRepo> {
        Ok(MuseRepo::open(self.path())?)
    }

    /// Write a file under `muse-work/`
    pub fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let full_path = self.work_dir().join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directories for {}", path))?;
        }

        fs::write(&full_path, content)
            .with_context(|| format!("Failed to write file: {}", path))?;

        Ok(())
    }

    /// Read a file under `muse-work/`
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.work_dir().join(path);
        fs::read(&full_path).with_context(|| format!("Failed to read file: {}", path))
    }

    /// Delete a file under `muse-work/`
    pub fn delete_file(&self, path: &str) -> Result<()> {
        let full_path = self.work_dir().join(path);
        fs::remove_file(&full_path).with_context(|| format!("Failed to delete file: {}", path))
    }

    /// Check if a working-tree file exists
    pub fn file_exists(&self, path: &str) -> bool {
        self.work_dir().join(path).exists()
    }

    /// On-disk location of a stored object
    pub fn object_path(&self, hex: &str) -> PathBuf {
        self.path()
            .join(".muse")
            .join("objects")
            .join(&hex[..2])
            .join(&hex[2..])
    }
}
