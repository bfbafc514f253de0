//! Commit command.

use super::{open_repo, Outcome};
use anyhow::Result;
use muse_core::KEY_METADATA;
use std::collections::BTreeMap;

/// Snapshot the working tree into a new commit.
pub fn run(message: &str, key: Option<String>) -> Result<Outcome> {
    let mut repo = open_repo()?;

    let mut metadata = BTreeMap::new();
    if let Some(key) = key {
        metadata.insert(KEY_METADATA.to_string(), key);
    }

    let commit_id = repo.commit_with_metadata(message, metadata)?;
    let manifest = repo.head_manifest()?;

    println!(
        "[{} {}] {}",
        repo.head().branch,
        commit_id.short(),
        message
    );
    println!("  {} file(s) tracked", manifest.len());

    Ok(Outcome::Done)
}
