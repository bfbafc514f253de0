//! Revert command.

use super::branch::print_missing;
use super::{open_repo, Outcome};
use anyhow::Result;
use muse_core::{RevertOptions, RevertOutcome, Scope};

/// Undo `reference`, as a commit or in the working tree only.
pub fn run(
    reference: String,
    track: Option<String>,
    section: Option<String>,
    no_commit: bool,
) -> Result<Outcome> {
    let mut repo = open_repo()?;
    let options = RevertOptions {
        target: reference,
        scope: Scope::new(track, section),
        no_commit,
    };

    match repo.revert(&options)? {
        RevertOutcome::Committed {
            commit_id,
            paths_changed,
            missing,
        } => {
            println!(
                "[{} {}] reverted {} path(s)",
                repo.head().branch,
                commit_id.short(),
                paths_changed.len()
            );
            for path in &paths_changed {
                println!("  {}", path);
            }
            print_missing(&missing);
            Ok(Outcome::partial_if(!missing.is_empty()))
        }
        RevertOutcome::WorkingTree {
            written,
            deleted,
            missing,
        } => {
            println!(
                "Working tree updated: {} written, {} removed (not committed)",
                written.len(),
                deleted.len()
            );
            print_missing(&missing);
            Ok(Outcome::partial_if(!missing.is_empty()))
        }
        RevertOutcome::NoOp => {
            println!("Nothing to revert");
            Ok(Outcome::Done)
        }
    }
}
