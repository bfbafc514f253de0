use super::assertions::Assertion;
use muse_core::Scope;

/// All possible actions in a test scenario
///
/// Commits are named by their message; later steps refer to them by that
/// label. Unknown labels are passed through as refs (`HEAD`, branch names).
#[derive(Debug)]
pub enum ScenarioStep {
    // Working tree
    WriteFile { path: String, content: Vec<u8> },
    DeleteFile { path: String },

    // History
    Commit { message: String, key: Option<String> },
    CommitExpectingNoop,
    CreateBranch { name: String },
    Switch { name: String },
    Merge { theirs: String, message: String },

    // Derived operations
    StashPush { scope: Scope },
    StashPop,
    Revert { target: String, scope: Scope, no_commit: bool },
    Transpose { interval: String, source: Option<String>, scope: Scope, dry_run: bool },

    // Failure simulation
    LoseObject { path: String },
    Restart,

    // Assertions (can be interspersed)
    Assert { assertion: Assertion },
}
