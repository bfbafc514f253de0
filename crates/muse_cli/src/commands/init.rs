//! Initialize a new Muse repository.

use super::Outcome;
use anyhow::{Context, Result};
use muse_core::{MuseRepo, MUSE_DIR, WORK_DIR};

/// Initialize a new Muse repository in the current directory.
pub fn run() -> Result<Outcome> {
    let repo = MuseRepo::init(".").context("Failed to initialize Muse repository")?;

    println!("Initialized Muse repository in {}/", MUSE_DIR);
    println!();
    println!("Directory structure:");
    println!("  {}/objects/     - Content-addressed object storage", MUSE_DIR);
    println!("  {}/refs/heads/  - Branch pointers", MUSE_DIR);
    println!("  {}/history.redb - Snapshots and commits", MUSE_DIR);
    println!("  {}/            - Working tree (put your tracks here)", WORK_DIR);
    println!();
    println!("Configuration written to {}/config.toml", MUSE_DIR);
    println!("On branch {} (no commits yet)", repo.head().branch);

    Ok(Outcome::Done)
}
