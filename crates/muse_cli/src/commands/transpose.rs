//! Transpose command.

use super::{open_repo, Outcome};
use anyhow::Result;
use console::style;
use muse_core::{Scope, SkippedPath, TransposeOptions, TransposeOutcome};

/// Shift every melodic note in a commit's MIDI files.
pub fn run(
    interval: String,
    commit: Option<String>,
    track: Option<String>,
    section: Option<String>,
    dry_run: bool,
    message: Option<String>,
) -> Result<Outcome> {
    let mut repo = open_repo()?;
    let options = TransposeOptions {
        interval,
        source: commit,
        scope: Scope::new(track, section),
        dry_run,
        message,
    };

    let skipped = match repo.transpose(&options)? {
        TransposeOutcome::DryRun {
            would_modify,
            skipped,
        } => {
            println!("Would modify {} file(s):", would_modify.len());
            for path in &would_modify {
                println!("  {}", path);
            }
            skipped
        }
        TransposeOutcome::Committed {
            commit_id,
            modified,
            skipped,
            new_key,
        } => {
            println!(
                "[{} {}] {} file(s) transposed",
                repo.head().branch,
                commit_id.short(),
                modified.len()
            );
            for path in &modified {
                println!("  {}", path);
            }
            if let Some(key) = new_key {
                println!("Key: {}", key);
            }
            skipped
        }
        TransposeOutcome::NoOp { skipped } => {
            println!("No notes changed");
            skipped
        }
    };

    print_skipped(&skipped);
    Ok(Outcome::partial_if(!skipped.is_empty()))
}

fn print_skipped(skipped: &[SkippedPath]) {
    if skipped.is_empty() {
        return;
    }
    println!("{}", style(format!("Skipped {} file(s):", skipped.len())).yellow());
    for s in skipped {
        println!("    {} {}: {}", style("⚠").yellow(), s.path, s.reason);
    }
}
