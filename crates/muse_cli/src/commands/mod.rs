//! CLI commands.

use anyhow::{Context, Result};
use muse_core::MuseRepo;

pub mod blame;
pub mod branch;
pub mod commit;
pub mod init;
pub mod log;
pub mod revert;
pub mod stash;
pub mod status;
pub mod transpose;
pub mod validate;

/// How a command finished, for the exit code.
pub enum Outcome {
    /// Success, including "nothing to do".
    Done,
    /// Work was done but some paths were missing or skipped.
    Partial,
}

impl Outcome {
    /// `Partial` when `incomplete` holds.
    pub fn partial_if(incomplete: bool) -> Self {
        if incomplete {
            Outcome::Partial
        } else {
            Outcome::Done
        }
    }
}

/// Opens the repository rooted at the current directory.
pub fn open_repo() -> Result<MuseRepo> {
    MuseRepo::open(".").context("Not a Muse repository")
}
