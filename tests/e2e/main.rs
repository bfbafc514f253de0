//! End-to-end tests for Muse: scenarios run against real repositories in
//! temporary directories.

mod harness;
