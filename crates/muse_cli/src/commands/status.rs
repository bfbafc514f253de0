//! Working tree status.

use super::{open_repo, Outcome};
use anyhow::Result;
use console::style;

/// Show how the working tree differs from HEAD.
pub fn run() -> Result<Outcome> {
    let repo = open_repo()?;
    let head = repo.head();

    match head.commit {
        Some(id) => println!("On branch {} at {}", head.branch, id.short()),
        None => println!("On branch {} (no commits yet)", head.branch),
    }

    if let Some(state) = repo.merge_state()? {
        if state.has_conflicts() {
            println!();
            println!("{}", style("Unresolved merge conflicts:").red().bold());
            for path in &state.conflict_paths {
                println!("  {} {}", style("×").red(), path);
            }
        }
    }

    let diff = repo.status()?;
    if diff.is_empty() {
        println!("Nothing to commit, working tree clean");
        return Ok(Outcome::Done);
    }

    println!();
    for path in &diff.added {
        println!("  {} {}", style("added:   ").green(), path);
    }
    for path in &diff.modified {
        println!("  {} {}", style("modified:").yellow(), path);
    }
    for path in &diff.deleted {
        println!("  {} {}", style("deleted: ").red(), path);
    }

    Ok(Outcome::Done)
}
