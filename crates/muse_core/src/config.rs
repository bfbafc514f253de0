//! Repository configuration (`.muse/config.toml`).

use crate::error::{MuseError, Result};
use crate::object_store::DEFAULT_COMPRESSION_LEVEL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default bound on commit-chain walks (blame, log).
pub const DEFAULT_TRAVERSAL_LIMIT: usize = 10_000;

/// Written by `init` so users can see the knobs.
pub const DEFAULT_CONFIG_TOML: &str = r#"# Muse repository configuration

[storage]
# zstd compression level for stored objects (1-22)
compression_level = 3

[history]
# Maximum number of commits walked by blame and log
traversal_limit = 10000

[user]
# Author recorded on new commits
name = ""
"#;

/// Configuration for a Muse repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Object storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Commit-graph traversal settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Author identity.
    #[serde(default)]
    pub user: UserConfig,
}

impl Config {
    /// Load configuration from `<muse_root>/config.toml`, or defaults if absent.
    pub fn load(muse_root: &Path) -> Result<Self> {
        let path = muse_root.join("config.toml");
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| MuseError::ConfigError(format!("failed to read config: {}", e)))?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| MuseError::ConfigError(format!("failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to `<muse_root>/config.toml`.
    pub fn save(&self, muse_root: &Path) -> Result<()> {
        let path = muse_root.join("config.toml");
        let content = toml::to_string_pretty(self)
            .map_err(|e| MuseError::ConfigError(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| MuseError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(1..=22).contains(&self.storage.compression_level) {
            return Err(MuseError::ConfigError(format!(
                "storage.compression_level must be 1-22, got {}",
                self.storage.compression_level
            )));
        }
        if self.history.traversal_limit == 0 {
            return Err(MuseError::ConfigError(
                "history.traversal_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Compression level for zstd (1-22, default: 3).
    pub compression_level: i32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Commit-graph traversal settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum commits walked by blame and log (default: 10000).
    pub traversal_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            traversal_limit: DEFAULT_TRAVERSAL_LIMIT,
        }
    }
}

/// Author identity.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserConfig {
    /// Recorded as the author of new commits.
    pub name: String,
}
