//! Repository validation command.

use super::{open_repo, Outcome};
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use muse_core::ValidateConfig;

/// Verify repository integrity.
pub fn run(objects: bool, midi: bool) -> Result<Outcome> {
    let repo = open_repo()?;
    let config = ValidateConfig {
        check_objects: objects,
        check_midi: midi,
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(if objects {
        "Verifying object integrity..."
    } else {
        "Verifying repository..."
    });
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = repo.validate(config);
    spinner.finish_and_clear();
    let report = report?;

    println!("{}", style("Validation Report:").bold());
    println!("  Refs checked:       {}", style(report.refs_checked).cyan());
    for name in &report.refs_dangling {
        println!("    {} dangling {}", style("⚠").yellow(), name);
    }

    println!("  Commits checked:    {}", style(report.commits_checked).cyan());
    for id in &report.commits_invalid {
        println!("    {} invalid commit {}", style("×").red(), id.as_hex());
    }
    for id in &report.missing_objects {
        println!("    {} missing object {}", style("×").red(), id.as_hex());
    }

    if objects {
        println!("  Objects checked:    {}", style(report.objects_checked).cyan());
        for id in &report.corrupted_objects {
            println!("    {} corrupted {}", style("×").red(), id.as_hex());
        }
    }
    for line in &report.malformed_midi {
        println!("    {} {}", style("⚠").yellow(), line);
    }

    println!();
    if report.has_issues() {
        println!("{}", style(report.summary()).yellow().bold());
        Ok(Outcome::Partial)
    } else {
        println!("{} {}", style("✓").green(), style(report.summary()).green());
        Ok(Outcome::Done)
    }
}
