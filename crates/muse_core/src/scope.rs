//! Track/section path filters.

use crate::error::{MuseError, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Restricts an operation to part of the working tree.
///
/// `track` is a [`glob::Pattern`] matched against the file name (with or
/// without its extension); `section` must equal the first path component. Both must hold
/// when both are set. An empty scope matches every path.
///
/// # Examples
///
/// ```
/// use muse_core::Scope;
///
/// let scope = Scope::track("drums*");
/// assert!(scope.matches("verse/drums_main.mid"));
/// assert!(!scope.matches("verse/bass.mid"));
///
/// let scope = Scope::section("chorus");
/// assert!(scope.matches("chorus/bass.mid"));
/// assert!(!scope.matches("bass.mid"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Basename glob.
    pub track: Option<String>,
    /// First directory component.
    pub section: Option<String>,
}

impl Scope {
    /// Scope that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Scope restricted to a track glob.
    pub fn track(pattern: impl Into<String>) -> Self {
        Self {
            track: Some(pattern.into()),
            section: None,
        }
    }

    /// Scope restricted to a section directory.
    pub fn section(name: impl Into<String>) -> Self {
        Self {
            track: None,
            section: Some(name.into()),
        }
    }

    /// Builds a scope from optional CLI-style arguments.
    pub fn new(track: Option<String>, section: Option<String>) -> Self {
        Self { track, section }
    }

    /// True when no filter is set.
    pub fn is_empty(&self) -> bool {
        self.track.is_none() && self.section.is_none()
    }

    /// Checks that the track glob compiles.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for a malformed glob such as an unterminated
    /// `[` class.
    pub fn validate(&self) -> Result<()> {
        if let Some(pattern) = &self.track {
            Pattern::new(pattern).map_err(|source| MuseError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Tests a normalized forward-slash relative path.
    ///
    /// A track glob that does not compile matches nothing; call
    /// [`Scope::validate`] first to report it.
    pub fn matches(&self, path: &str) -> bool {
        if let Some(section) = &self.section {
            match path.split_once('/') {
                Some((first, _)) if first == section => {}
                _ => return false,
            }
        }

        if let Some(pattern) = &self.track {
            let Ok(pattern) = Pattern::new(pattern) else {
                return false;
            };
            let base = path.rsplit('/').next().unwrap_or(path);
            let stem = match base.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem,
                _ => base,
            };
            if !pattern.matches(base) && !pattern.matches(stem) {
                return false;
            }
        }

        true
    }
}
