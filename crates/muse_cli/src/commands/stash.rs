//! Stash commands.

use super::branch::print_missing;
use super::{open_repo, Outcome};
use anyhow::Result;
use console::style;
use muse_core::{Scope, StashPush};

/// Shelve matching working-tree changes and restore HEAD.
pub fn push(
    message: Option<String>,
    track: Option<String>,
    section: Option<String>,
) -> Result<Outcome> {
    let repo = open_repo()?;
    let scope = Scope::new(track, section);

    match repo.stash_push(message.as_deref(), &scope)? {
        StashPush::Saved {
            stash_id,
            paths,
            missing,
        } => {
            println!("Saved {} path(s) as {}", paths, stash_id);
            print_missing(&missing);
            Ok(Outcome::partial_if(!missing.is_empty()))
        }
        StashPush::NothingToStash => {
            println!("No local changes to stash");
            Ok(Outcome::Done)
        }
    }
}

/// Apply entry `index`; with `drop`, remove it afterwards (pop).
pub fn apply(index: usize, drop: bool) -> Result<Outcome> {
    let repo = open_repo()?;
    let result = repo.stash_apply(index, drop)?;

    println!(
        "Applied {} ({} path(s))",
        result.stash_id,
        result.applied.len()
    );
    print_missing(&result.missing);
    if result.dropped {
        println!("Dropped stash@{{{}}}", index);
    } else if drop {
        println!(
            "{} entry kept because some paths could not be restored",
            style("⚠").yellow()
        );
    }

    Ok(Outcome::partial_if(!result.missing.is_empty()))
}

/// List entries, most recent first.
pub fn list() -> Result<Outcome> {
    let repo = open_repo()?;
    let entries = repo.stash_list()?;

    if entries.is_empty() {
        println!("No stash entries");
    }
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "stash@{{{}}}: {} {} ({} path(s), {})",
            i,
            style(&entry.branch).cyan(),
            entry.message,
            entry.manifest.len(),
            style(&entry.created_at).dim()
        );
    }
    Ok(Outcome::Done)
}

/// Remove entry `index`.
pub fn drop(index: usize) -> Result<Outcome> {
    let repo = open_repo()?;
    let entry = repo.stash_drop(index)?;
    println!("Dropped stash@{{{}}} ({})", index, entry.stash_id);
    Ok(Outcome::Done)
}

/// Remove every entry.
pub fn clear() -> Result<Outcome> {
    let repo = open_repo()?;
    let count = repo.stash_clear()?;
    println!("Cleared {} stash entr{}", count, if count == 1 { "y" } else { "ies" });
    Ok(Outcome::Done)
}
