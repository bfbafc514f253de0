use super::assertions::Assertion;
use super::runner::ScenarioRunner;
use super::steps::ScenarioStep;
use anyhow::{Context, Result};
use muse_core::{ChangeKind, MuseRepo, Scope};
use std::collections::HashMap;

/// Fluent DSL for building test scenarios
pub struct Scenario {
    name: String,
    initial_files: HashMap<String, Vec<u8>>,
    steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Create a new scenario with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            initial_files: HashMap::new(),
            steps: Vec::new(),
        }
    }

    // ===== Initial setup =====

    /// Add a file to the initial working tree
    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.initial_files.insert(path.to_string(), content.to_vec());
        self
    }

    // ===== Working tree =====

    pub fn writes(mut self, path: &str, content: &[u8]) -> Self {
        self.steps.push(ScenarioStep::WriteFile {
            path: path.to_string(),
            content: content.to_vec(),
        });
        self
    }

    pub fn deletes(mut self, path: &str) -> Self {
        self.steps.push(ScenarioStep::DeleteFile {
            path: path.to_string(),
        });
        self
    }

    // ===== History =====

    /// Commit; the message doubles as the label for later steps
    pub fn commits(mut self, message: &str) -> Self {
        self.steps.push(ScenarioStep::Commit {
            message: message.to_string(),
            key: None,
        });
        self
    }

    pub fn commits_with_key(mut self, message: &str, key: &str) -> Self {
        self.steps.push(ScenarioStep::Commit {
            message: message.to_string(),
            key: Some(key.to_string()),
        });
        self
    }

    /// Commit that must be rejected with "nothing to commit"
    pub fn commits_nothing(mut self) -> Self {
        self.steps.push(ScenarioStep::CommitExpectingNoop);
        self
    }

    pub fn branches(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::CreateBranch {
            name: name.to_string(),
        });
        self
    }

    pub fn switches(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::Switch {
            name: name.to_string(),
        });
        self
    }

    pub fn merges(mut self, theirs: &str, message: &str) -> Self {
        self.steps.push(ScenarioStep::Merge {
            theirs: theirs.to_string(),
            message: message.to_string(),
        });
        self
    }

    // ===== Derived operations =====

    pub fn stashes(mut self) -> Self {
        self.steps.push(ScenarioStep::StashPush { scope: Scope::all() });
        self
    }

    pub fn stashes_scoped(mut self, scope: Scope) -> Self {
        self.steps.push(ScenarioStep::StashPush { scope });
        self
    }

    pub fn pops_stash(mut self) -> Self {
        self.steps.push(ScenarioStep::StashPop);
        self
    }

    pub fn reverts(self, target: &str) -> Self {
        self.reverts_with(target, Scope::all(), false)
    }

    pub fn reverts_with(mut self, target: &str, scope: Scope, no_commit: bool) -> Self {
        self.steps.push(ScenarioStep::Revert {
            target: target.to_string(),
            scope,
            no_commit,
        });
        self
    }

    pub fn transposes(self, interval: &str) -> Self {
        self.transposes_with(interval, None, Scope::all(), false)
    }

    pub fn transposes_with(
        mut self,
        interval: &str,
        source: Option<&str>,
        scope: Scope,
        dry_run: bool,
    ) -> Self {
        self.steps.push(ScenarioStep::Transpose {
            interval: interval.to_string(),
            source: source.map(str::to_string),
            scope,
            dry_run,
        });
        self
    }

    // ===== Failure simulation =====

    /// Delete the stored object HEAD records for `path`
    pub fn loses_object(mut self, path: &str) -> Self {
        self.steps.push(ScenarioStep::LoseObject {
            path: path.to_string(),
        });
        self
    }

    /// Drop the repository handle and reopen it from disk
    pub fn restart(mut self) -> Self {
        self.steps.push(ScenarioStep::Restart);
        self
    }

    // ===== Assertions =====

    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.steps.push(ScenarioStep::Assert { assertion });
        self
    }

    pub fn assert_commit_count(self, n: usize) -> Self {
        self.assert(Assertion::CommitCount(n))
    }

    pub fn assert_head_message(self, message: &str) -> Self {
        self.assert(Assertion::HeadMessage(message.to_string()))
    }

    pub fn assert_file_committed(self, path: &str) -> Self {
        self.assert(Assertion::FileInHead {
            path: path.to_string(),
        })
    }

    pub fn assert_file_not_committed(self, path: &str) -> Self {
        self.assert(Assertion::FileNotInHead {
            path: path.to_string(),
        })
    }

    pub fn assert_work_file(self, path: &str, content: &[u8]) -> Self {
        self.assert(Assertion::WorkFileEquals {
            path: path.to_string(),
            content: content.to_vec(),
        })
    }

    pub fn assert_work_file_missing(self, path: &str) -> Self {
        self.assert(Assertion::WorkFileMissing {
            path: path.to_string(),
        })
    }

    pub fn assert_blame(self, path: &str, message: &str, change: ChangeKind) -> Self {
        self.assert(Assertion::BlameAttributes {
            path: path.to_string(),
            message: message.to_string(),
            change,
        })
    }

    pub fn assert_custom(
        self,
        f: impl Fn(&mut MuseRepo) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.assert(Assertion::Custom(Box::new(f)))
    }

    /// Execute the scenario
    pub fn run(self) -> Result<()> {
        let mut runner = ScenarioRunner::new(self.initial_files)?;
        runner
            .execute(&self.steps)
            .with_context(|| format!("Scenario '{}' failed", self.name))
    }
}
