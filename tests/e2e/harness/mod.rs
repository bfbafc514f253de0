//! E2E test harness for Muse.
//!
//! Not every builder and assertion is used by every scenario module.

#![allow(dead_code)]

pub mod assertions;
pub mod clock;
pub mod midi;
pub mod scenario;
pub mod steps;
pub mod workspace;

pub use assertions::Assertion;
pub use midi::MidiFile;
pub use scenario::Scenario;
pub use workspace::TestWorkspace;
