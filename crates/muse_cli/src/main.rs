//! Muse CLI - Command-line interface for Muse music version control.

use clap::{Parser, Subcommand};
use console::style;
use muse_core::MuseError;
use std::process::ExitCode;
use tracing::debug;

mod commands;

use commands::Outcome;

#[derive(Parser)]
#[command(name = "muse")]
#[command(about = "Version control for music projects", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Muse repository
    Init,
    /// Record the working tree as a new commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
        /// Key annotation, e.g. "Eb major"
        #[arg(long)]
        key: Option<String>,
    },
    /// Show first-parent history
    Log {
        /// Start commit (branch, id or prefix)
        start: Option<String>,
        /// Maximum number of commits to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show working tree changes against HEAD
    Status,
    /// List branches, or create one
    Branch {
        /// Name of the branch to create
        name: Option<String>,
        /// Start commit for the new branch (default HEAD)
        #[arg(long)]
        from: Option<String>,
    },
    /// Switch to another branch
    Switch {
        /// Branch name
        name: String,
    },
    /// Show which commit last changed each path
    Blame {
        /// Only show paths containing this text
        path: Option<String>,
        /// Track name glob
        #[arg(long)]
        track: Option<String>,
        /// Section directory
        #[arg(long)]
        section: Option<String>,
        /// Maximum commits to walk
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Shelve working tree changes
    Stash {
        #[command(subcommand)]
        command: Option<StashCommands>,
    },
    /// Undo a commit
    Revert {
        /// Commit to revert (branch, id or prefix)
        reference: String,
        /// Only revert paths matching this track glob
        #[arg(long)]
        track: Option<String>,
        /// Only revert paths in this section
        #[arg(long)]
        section: Option<String>,
        /// Update the working tree without committing
        #[arg(long)]
        no_commit: bool,
    },
    /// Shift the pitch of every melodic note
    Transpose {
        /// Semitones or interval name, e.g. +3, down-P5, octave
        #[arg(allow_hyphen_values = true)]
        interval: String,
        /// Source commit (default HEAD)
        #[arg(long)]
        commit: Option<String>,
        /// Only transpose tracks whose name contains this text
        #[arg(long)]
        track: Option<String>,
        /// Only transpose files in this section
        #[arg(long)]
        section: Option<String>,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Verify repository integrity
    Validate {
        /// Re-hash every stored object (slow)
        #[arg(long)]
        objects: bool,
        /// Parse every MIDI file in HEAD
        #[arg(long)]
        midi: bool,
    },
}

#[derive(Subcommand)]
enum StashCommands {
    /// Shelve changes and restore HEAD (default)
    Push {
        /// Description
        #[arg(short, long)]
        message: Option<String>,
        /// Only stash paths matching this track glob
        #[arg(long)]
        track: Option<String>,
        /// Only stash paths in this section
        #[arg(long)]
        section: Option<String>,
    },
    /// Apply an entry and drop it
    Pop {
        /// Entry index (0 is most recent)
        #[arg(default_value = "0")]
        index: usize,
    },
    /// Apply an entry and keep it
    Apply {
        /// Entry index (0 is most recent)
        #[arg(default_value = "0")]
        index: usize,
    },
    /// List entries
    List,
    /// Remove an entry
    Drop {
        /// Entry index (0 is most recent)
        #[arg(default_value = "0")]
        index: usize,
    },
    /// Remove every entry
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Partial) => ExitCode::from(2),
        Err(err) => report_error(&err),
    }
}

fn run(command: Commands) -> anyhow::Result<Outcome> {
    match command {
        Commands::Init => commands::init::run(),
        Commands::Commit { message, key } => commands::commit::run(&message, key),
        Commands::Log { start, limit } => commands::log::run(start.as_deref(), limit),
        Commands::Status => commands::status::run(),
        Commands::Branch { name, from } => match name {
            Some(name) => commands::branch::create(&name, from.as_deref()),
            None => commands::branch::list(),
        },
        Commands::Switch { name } => commands::branch::switch(&name),
        Commands::Blame {
            path,
            track,
            section,
            limit,
            json,
        } => commands::blame::run(path, track, section, limit, json),
        Commands::Stash { command } => match command {
            None => commands::stash::push(None, None, None),
            Some(StashCommands::Push {
                message,
                track,
                section,
            }) => commands::stash::push(message, track, section),
            Some(StashCommands::Pop { index }) => commands::stash::apply(index, true),
            Some(StashCommands::Apply { index }) => commands::stash::apply(index, false),
            Some(StashCommands::List) => commands::stash::list(),
            Some(StashCommands::Drop { index }) => commands::stash::drop(index),
            Some(StashCommands::Clear) => commands::stash::clear(),
        },
        Commands::Revert {
            reference,
            track,
            section,
            no_commit,
        } => commands::revert::run(reference, track, section, no_commit),
        Commands::Transpose {
            interval,
            commit,
            track,
            section,
            dry_run,
            message,
        } => commands::transpose::run(interval, commit, track, section, dry_run, message),
        Commands::Validate { objects, midi } => commands::validate::run(objects, midi),
    }
}

/// Prints the error chain and picks the exit code.
fn report_error(err: &anyhow::Error) -> ExitCode {
    debug!(error = ?err, "command failed");
    let muse_err = err.chain().find_map(|e| e.downcast_ref::<MuseError>());

    if let Some(e) = muse_err {
        if e.is_noop() {
            println!("{}", e);
            return ExitCode::SUCCESS;
        }
    }

    eprintln!("{} {:#}", style("error:").red().bold(), err);
    if let Some(hint) = muse_err.and_then(MuseError::recovery_suggestion) {
        eprintln!("  {} {}", style("→").cyan(), hint);
    }
    ExitCode::from(1)
}
