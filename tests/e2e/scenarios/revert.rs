use crate::harness::{Assertion, Scenario};
use muse_core::Scope;

#[test]
fn test_revert_restores_parent_and_second_revert_is_noop() {
    Scenario::new("revert_twice")
        .writes("a.mid", b"a1")
        .commits("P")
        .writes("a.mid", b"a2")
        .writes("b.mid", b"b")
        .commits("C")
        .reverts("C")
        .assert_head_message("Revert 'C'")
        .assert_file_not_committed("b.mid")
        .assert_work_file("a.mid", b"a1")
        .assert_work_file_missing("b.mid")
        .assert(Assertion::CleanStatus)
        .assert_custom(|repo| {
            let log = repo.log(None, None)?;
            let parent = &log[2];
            anyhow::ensure!(log[0].snapshot_id == parent.snapshot_id);
            Ok(())
        })
        .reverts("C")
        .assert(Assertion::LastWasNoop)
        .assert_commit_count(3)
        .run()
        .unwrap();
}

#[test]
fn test_scoped_revert_keeps_other_tracks() {
    Scenario::new("revert_scoped")
        .writes("drums.mid", b"d1")
        .writes("keys.mid", b"k1")
        .commits("P")
        .writes("drums.mid", b"d2")
        .writes("keys.mid", b"k2")
        .commits("C")
        .reverts_with("C", Scope::track("drums"), false)
        .assert_work_file("drums.mid", b"d1")
        .assert_work_file("keys.mid", b"k2")
        .assert(Assertion::CleanStatus)
        .assert_custom(|repo| {
            let manifest = repo.head_manifest()?;
            anyhow::ensure!(manifest.get("drums.mid") == Some(muse_core::ObjectId::hash_bytes(b"d1")));
            anyhow::ensure!(manifest.get("keys.mid") == Some(muse_core::ObjectId::hash_bytes(b"k2")));
            Ok(())
        })
        .run()
        .unwrap();
}

#[test]
fn test_no_commit_reports_missing_without_failing() {
    Scenario::new("revert_missing")
        .writes("a.mid", b"a1")
        .writes("b.mid", b"b1")
        .commits("P")
        .loses_object("a.mid")
        .writes("a.mid", b"a2")
        .writes("b.mid", b"b2")
        .commits("C")
        .reverts_with("C", Scope::all(), true)
        .assert(Assertion::LastIncomplete(vec!["a.mid".to_string()]))
        .assert_work_file("b.mid", b"b1")
        .assert_work_file("a.mid", b"a2")
        .assert_head_message("C")
        .run()
        .unwrap();
}

#[test]
fn test_committed_revert_reports_missing_bytes() {
    Scenario::new("revert_commit_missing")
        .writes("a.mid", b"a1")
        .writes("b.mid", b"b1")
        .commits("P")
        .loses_object("a.mid")
        .writes("a.mid", b"a2")
        .writes("b.mid", b"b2")
        .commits("C")
        .reverts("C")
        .assert(Assertion::LastIncomplete(vec!["a.mid".to_string()]))
        .assert_head_message("Revert 'C'")
        .assert_work_file("b.mid", b"b1")
        .assert_work_file("a.mid", b"a2")
        .run()
        .unwrap();
}
