use crate::harness::{Assertion, Scenario};
use anyhow::ensure;
use muse_core::Parents;

#[test]
fn test_commit_chain() {
    Scenario::new("commit_chain")
        .writes("verse/drums.mid", b"drums v1")
        .commits("Add drums")
        .writes("verse/bass.mid", b"bass v1")
        .commits("Add bass")
        .assert_commit_count(2)
        .assert_head_message("Add bass")
        .assert_file_committed("verse/drums.mid")
        .assert_file_committed("verse/bass.mid")
        .assert(Assertion::CleanStatus)
        .assert(Assertion::Healthy)
        .run()
        .unwrap();
}

#[test]
fn test_unchanged_tree_is_not_committed() {
    Scenario::new("unchanged_tree")
        .commits_nothing()
        .writes("a.mid", b"a")
        .commits("first")
        .commits_nothing()
        .assert(Assertion::LastWasNoop)
        .assert_commit_count(1)
        .run()
        .unwrap();
}

#[test]
fn test_deleting_a_file_is_a_change() {
    Scenario::new("delete_file")
        .writes("a.mid", b"a")
        .writes("b.mid", b"b")
        .commits("both")
        .deletes("b.mid")
        .commits("drop b")
        .assert_file_not_committed("b.mid")
        .assert_file_committed("a.mid")
        .run()
        .unwrap();
}

#[test]
fn test_key_annotation_is_inherited() {
    Scenario::new("key_inherited")
        .writes("a.mid", b"a")
        .commits_with_key("first", "Eb major")
        .writes("a.mid", b"a2")
        .commits("second")
        .assert(Assertion::HeadKey(Some("Eb major".to_string())))
        .run()
        .unwrap();
}

#[test]
fn test_branch_switch_restores_tree() {
    Scenario::new("branch_switch")
        .writes("a.mid", b"main a")
        .commits("main start")
        .branches("idea")
        .switches("idea")
        .writes("a.mid", b"idea a")
        .writes("extra.mid", b"extra")
        .commits("idea change")
        .switches("main")
        .assert_work_file("a.mid", b"main a")
        .assert_work_file_missing("extra.mid")
        .assert_head_message("main start")
        .switches("idea")
        .assert_work_file("extra.mid", b"extra")
        .assert_head_message("idea change")
        .run()
        .unwrap();
}

#[test]
fn test_merge_commit_has_two_parents() {
    Scenario::new("merge_commit")
        .writes("a.mid", b"a")
        .commits("base")
        .branches("feature")
        .switches("feature")
        .writes("b.mid", b"b")
        .commits("feature work")
        .switches("main")
        .writes("c.mid", b"c")
        .commits("main work")
        .writes("b.mid", b"b")
        .merges("feature", "Merge feature")
        .assert(Assertion::HeadIsMerge)
        .assert_file_committed("b.mid")
        .assert_file_committed("c.mid")
        // log follows first parents: merge, main work, base
        .assert_commit_count(3)
        .assert_custom(|repo| {
            let head = repo.head_commit()?.ok_or_else(|| anyhow::anyhow!("no head"))?;
            let Parents::Merge(ours, theirs) = head.parents else {
                anyhow::bail!("not a merge: {:?}", head.parents);
            };
            ensure!(repo.load_commit(ours)?.message == "main work");
            ensure!(repo.load_commit(theirs)?.message == "feature work");
            Ok(())
        })
        .assert(Assertion::Healthy)
        .run()
        .unwrap();
}

#[test]
fn test_history_survives_restart() {
    Scenario::new("restart")
        .writes("a.mid", b"a")
        .commits("first")
        .writes("a.mid", b"a2")
        .commits("second")
        .restart()
        .assert_commit_count(2)
        .assert_head_message("second")
        .assert(Assertion::CleanStatus)
        .writes("a.mid", b"a3")
        .commits("third")
        .assert_commit_count(3)
        .run()
        .unwrap();
}
