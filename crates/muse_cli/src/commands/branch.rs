//! Branch listing, creation and switching.

use super::{open_repo, Outcome};
use anyhow::Result;
use console::style;

/// List branches, marking the current one.
pub fn list() -> Result<Outcome> {
    let repo = open_repo()?;
    let current = &repo.head().branch;

    for (name, head) in repo.branches()? {
        let marker = if &name == current { "*" } else { " " };
        let head = head.map(|id| id.short()).unwrap_or_else(|| "(empty)".to_string());
        if &name == current {
            println!("{} {} {}", marker, style(&name).green(), style(head).dim());
        } else {
            println!("{} {} {}", marker, name, style(head).dim());
        }
    }

    Ok(Outcome::Done)
}

/// Create a branch without switching to it.
pub fn create(name: &str, from: Option<&str>) -> Result<Outcome> {
    let repo = open_repo()?;
    match repo.create_branch(name, from)? {
        Some(id) => println!("Created branch {} at {}", name, id.short()),
        None => println!("Created empty branch {}", name),
    }
    Ok(Outcome::Done)
}

/// Switch branches, restoring the target's tree.
pub fn switch(name: &str) -> Result<Outcome> {
    let mut repo = open_repo()?;
    let report = repo.switch_branch(name)?;

    println!("Switched to branch {}", name);
    println!(
        "  {} written, {} removed",
        report.written.len(),
        report.deleted.len()
    );
    print_missing(&report.missing);

    Ok(Outcome::partial_if(!report.missing.is_empty()))
}

pub(crate) fn print_missing(missing: &[String]) {
    if missing.is_empty() {
        return;
    }
    println!(
        "{}",
        style(format!("{} path(s) unavailable locally:", missing.len())).yellow()
    );
    for path in missing {
        println!("    {} {}", style("⚠").yellow(), path);
    }
}
