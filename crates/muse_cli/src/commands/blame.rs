//! Blame command.

use super::{open_repo, Outcome};
use anyhow::Result;
use console::style;
use muse_core::{BlameOptions, ChangeKind, Scope};

/// Attribute each path in HEAD to the commit that last changed it.
pub fn run(
    path: Option<String>,
    track: Option<String>,
    section: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<Outcome> {
    let repo = open_repo()?;
    let options = BlameOptions {
        start: None,
        path,
        scope: Scope::new(track, section),
        limit,
    };
    let report = repo.blame(&options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(Outcome::Done);
    }

    if report.entries.is_empty() {
        println!("No matching paths");
    }
    let width = report.entries.iter().map(|e| e.path.len()).max().unwrap_or(0);
    for entry in &report.entries {
        let change = match entry.change {
            ChangeKind::Added => style("added   ").green(),
            ChangeKind::Modified => style("modified").yellow(),
        };
        println!(
            "{:width$}  {}  {}  {}",
            entry.path,
            style(entry.commit_id.short()).cyan(),
            change,
            entry.message,
            width = width
        );
    }

    if let Some(reason) = &report.truncated {
        println!();
        println!(
            "{} walk stopped after {} commit(s): {}",
            style("⚠").yellow(),
            report.commits_walked,
            reason
        );
    }

    Ok(Outcome::Done)
}
