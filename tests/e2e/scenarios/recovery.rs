//! Degraded repositories: missing bytes, corrupted objects, stale locks.

use crate::harness::{Assertion, Scenario, TestWorkspace};
use anyhow::{ensure, Result};
use muse_core::{MuseError, MuseRepo, ObjectId, ValidateConfig};
use std::fs;

#[test]
fn test_switch_reports_missing_objects() {
    Scenario::new("switch_missing")
        .writes("a.mid", b"a")
        .writes("b.mid", b"b")
        .commits("first")
        .loses_object("a.mid")
        .branches("other")
        .deletes("a.mid")
        .deletes("b.mid")
        .switches("other")
        .assert(Assertion::LastIncomplete(vec!["a.mid".to_string()]))
        .assert_work_file("b.mid", b"b")
        .run()
        .unwrap();
}

#[test]
fn test_stash_pop_keeps_entry_when_bytes_are_missing() -> Result<()> {
    let ws = TestWorkspace::empty()?;
    let mut repo = ws.init_muse()?;
    ws.write_file("a.mid", b"base")?;
    repo.commit("base")?;

    ws.write_file("a.mid", b"unsaved idea")?;
    repo.stash_push(None, &Default::default())?;
    fs::remove_file(ws.object_path(&ObjectId::hash_bytes(b"unsaved idea").as_hex()))?;

    let result = repo.stash_apply(0, true)?;
    assert_eq!(result.missing, vec!["a.mid"]);
    assert!(!result.dropped);
    assert_eq!(repo.stash_list()?.len(), 1);
    assert_eq!(ws.read_file("a.mid")?, b"base");
    Ok(())
}

#[test]
fn test_validate_finds_corruption() -> Result<()> {
    let ws = TestWorkspace::empty()?;
    let mut repo = ws.init_muse()?;
    ws.write_file("a.mid", b"fine")?;
    repo.commit("first")?;

    let id = ObjectId::hash_bytes(b"fine");
    fs::write(ws.object_path(&id.as_hex()), b"not zstd")?;

    let report = repo.validate(ValidateConfig {
        check_objects: true,
        check_midi: false,
    })?;
    ensure!(report.corrupted_objects == vec![id]);
    ensure!(report.has_issues());
    Ok(())
}

#[test]
fn test_open_and_init_errors() -> Result<()> {
    let ws = TestWorkspace::empty()?;
    assert!(matches!(
        MuseRepo::open(ws.path()),
        Err(MuseError::NotARepository(_))
    ));

    let repo = ws.init_muse()?;
    drop(repo);
    assert!(matches!(
        MuseRepo::init(ws.path()),
        Err(MuseError::AlreadyInitialized(_))
    ));
    Ok(())
}

#[test]
fn test_unknown_refs_are_errors() -> Result<()> {
    let ws = TestWorkspace::empty()?;
    let mut repo = ws.init_muse()?;
    ws.write_file("a.mid", b"a")?;
    repo.commit("first")?;

    assert!(matches!(
        repo.resolve_ref("no-such-branch"),
        Err(MuseError::RefNotFound(_))
    ));
    assert!(matches!(
        repo.resolve_ref("000000000000"),
        Err(MuseError::CommitNotFound(_))
    ));
    Ok(())
}
