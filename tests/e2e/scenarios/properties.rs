//! Identity and round-trip properties of the storage layer.

use crate::harness::TestWorkspace;
use anyhow::Result;
use muse_core::{commit_id, Manifest, ObjectId, ObjectStore, RestoreMode};
use std::fs;

#[test]
fn test_object_ids_are_content_hashes() -> Result<()> {
    let ws = TestWorkspace::empty()?;
    let store = ObjectStore::new(ws.path().join("objects"));

    let a = store.put(b"same bytes")?;
    let b = store.put(b"same bytes")?;
    let c = store.put(b"other bytes")?;
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, ObjectId::hash_bytes(b"same bytes"));

    // one stored copy per distinct content
    assert_eq!(store.list_all()?.len(), 2);
    Ok(())
}

#[test]
fn test_snapshot_id_ignores_insertion_order() {
    let entries = [
        ("verse/drums.mid", ObjectId::hash_bytes(b"d")),
        ("verse/bass.mid", ObjectId::hash_bytes(b"b")),
        ("chorus/keys.mid", ObjectId::hash_bytes(b"k")),
    ];

    let mut forward = Manifest::new();
    for (path, id) in entries {
        forward.insert(path, id);
    }
    let mut backward = Manifest::new();
    for (path, id) in entries.iter().rev() {
        backward.insert(*path, *id);
    }

    assert_eq!(forward.snapshot_id(), backward.snapshot_id());
    backward.insert("verse/bass.mid", ObjectId::hash_bytes(b"b2"));
    assert_ne!(forward.snapshot_id(), backward.snapshot_id());
}

#[test]
fn test_commit_id_ignores_parent_order() {
    let p1 = ObjectId::hash_bytes(b"p1");
    let p2 = ObjectId::hash_bytes(b"p2");
    let snap = ObjectId::hash_bytes(b"snap");

    assert_eq!(
        commit_id(&[p1, p2], snap, "merge", 100),
        commit_id(&[p2, p1], snap, "merge", 100)
    );
    assert_ne!(
        commit_id(&[p1], snap, "merge", 100),
        commit_id(&[p1], snap, "merge", 101)
    );
}

#[test]
fn test_build_restore_rebuild_round_trip() -> Result<()> {
    let ws = TestWorkspace::empty()?;
    let repo = ws.init_muse()?;
    ws.write_file("verse/drums.mid", b"drums")?;
    ws.write_file("verse/bass.mid", b"bass")?;
    ws.write_file("intro.mid", b"intro")?;

    let built = repo
        .worktree()
        .snapshot_into(repo.store(), &Default::default())?;

    fs::remove_dir_all(ws.work_dir())?;
    fs::create_dir_all(ws.work_dir())?;
    let report = repo
        .worktree()
        .restore(&built, repo.store(), &RestoreMode::Full)?;
    assert!(report.missing.is_empty());

    let rebuilt = repo.worktree().scan()?;
    assert_eq!(rebuilt, built);
    assert_eq!(ws.read_file("verse/bass.mid")?, b"bass");
    Ok(())
}
