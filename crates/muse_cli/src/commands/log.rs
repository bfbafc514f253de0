//! History listing.

use super::{open_repo, Outcome};
use anyhow::Result;
use chrono::DateTime;
use console::style;

/// Print the first-parent chain from `start` (default HEAD).
pub fn run(start: Option<&str>, limit: Option<usize>) -> Result<Outcome> {
    let repo = open_repo()?;
    let commits = repo.log(start, limit)?;

    if commits.is_empty() {
        println!("No commits yet on {}", repo.head().branch);
        return Ok(Outcome::Done);
    }

    for commit in commits {
        let mut header = format!("commit {}", commit.id.as_hex());
        if commit.parents.is_merge() {
            header.push_str(" (merge)");
        }
        println!("{}", style(header).yellow());

        if !commit.author.is_empty() {
            println!("Author: {}", commit.author);
        }
        let when = i64::try_from(commit.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| commit.timestamp.to_string());
        println!("Date:   {}", when);
        if let Some(key) = commit.key() {
            println!("Key:    {}", key);
        }
        println!();
        println!("    {}", commit.message);
        println!();
    }

    Ok(Outcome::Done)
}
