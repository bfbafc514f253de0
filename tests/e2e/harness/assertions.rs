use anyhow::Result;
use muse_core::{ChangeKind, MuseRepo};

/// Declarative assertions on repository state
pub enum Assertion {
    // Commits
    CommitCount(usize),
    HeadMessage(String),
    HeadKey(Option<String>),
    HeadIsMerge,

    // Files
    FileInHead { path: String },
    FileNotInHead { path: String },
    WorkFileEquals { path: String, content: Vec<u8> },
    WorkFileMissing { path: String },
    CleanStatus,

    // Derived operations
    BlameAttributes { path: String, message: String, change: ChangeKind },
    StashCount(usize),
    LastWasNoop,
    LastIncomplete(Vec<String>),

    // Integrity
    Healthy,

    // Custom (takes mutable reference to allow mutations)
    Custom(Box<dyn Fn(&mut MuseRepo) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommitCount(n) => write!(f, "CommitCount({})", n),
            Self::HeadMessage(s) => write!(f, "HeadMessage({:?})", s),
            Self::HeadKey(k) => write!(f, "HeadKey({:?})", k),
            Self::HeadIsMerge => write!(f, "HeadIsMerge"),
            Self::FileInHead { path } => write!(f, "FileInHead {{ path: {:?} }}", path),
            Self::FileNotInHead { path } => write!(f, "FileNotInHead {{ path: {:?} }}", path),
            Self::WorkFileEquals { path, content } => write!(
                f,
                "WorkFileEquals {{ path: {:?}, len: {} }}",
                path,
                content.len()
            ),
            Self::WorkFileMissing { path } => write!(f, "WorkFileMissing {{ path: {:?} }}", path),
            Self::CleanStatus => write!(f, "CleanStatus"),
            Self::BlameAttributes {
                path,
                message,
                change,
            } => write!(
                f,
                "BlameAttributes {{ path: {:?}, message: {:?}, change: {:?} }}",
                path, message, change
            ),
            Self::StashCount(n) => write!(f, "StashCount({})", n),
            Self::LastWasNoop => write!(f, "LastWasNoop"),
            Self::LastIncomplete(paths) => write!(f, "LastIncomplete({:?})", paths),
            Self::Healthy => write!(f, "Healthy"),
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}
