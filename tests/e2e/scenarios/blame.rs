use crate::harness::{Assertion, Scenario};
use anyhow::ensure;
use muse_core::{BlameOptions, ChangeKind, Scope};

#[test]
fn test_blame_added_and_modified() {
    Scenario::new("blame_basic")
        .writes("a.mid", b"a1")
        .writes("b.mid", b"b1")
        .commits("C1")
        .writes("a.mid", b"a2")
        .commits("C2")
        .assert_blame("a.mid", "C2", ChangeKind::Modified)
        .assert_blame("b.mid", "C1", ChangeKind::Added)
        .run()
        .unwrap();
}

#[test]
fn test_blame_readded_path() {
    Scenario::new("blame_readded")
        .writes("a.mid", b"a")
        .writes("keep.mid", b"k")
        .commits("add a")
        .deletes("a.mid")
        .commits("remove a")
        .writes("a.mid", b"a")
        .commits("restore a")
        .assert_blame("a.mid", "restore a", ChangeKind::Added)
        .assert_blame("keep.mid", "add a", ChangeKind::Added)
        .run()
        .unwrap();
}

#[test]
fn test_blame_filters_do_not_change_attribution() {
    Scenario::new("blame_filters")
        .writes("verse/drums.mid", b"d1")
        .writes("chorus/drums.mid", b"cd1")
        .writes("verse/bass.mid", b"b1")
        .commits("C1")
        .writes("verse/drums.mid", b"d2")
        .commits("C2")
        .assert_custom(|repo| {
            let report = repo.blame(&BlameOptions {
                scope: Scope::new(Some("drums".to_string()), Some("verse".to_string())),
                ..Default::default()
            })?;
            ensure!(report.entries.len() == 1, "{:?}", report.entries);
            ensure!(report.entries[0].path == "verse/drums.mid");
            ensure!(report.entries[0].message == "C2");

            let report = repo.blame(&BlameOptions {
                path: Some("bass".to_string()),
                ..Default::default()
            })?;
            ensure!(report.entries.len() == 1);
            ensure!(report.entries[0].message == "C1");
            Ok(())
        })
        .run()
        .unwrap();
}

#[test]
fn test_blame_limit_truncates() {
    Scenario::new("blame_limit")
        .writes("a.mid", b"1")
        .commits("one")
        .writes("a.mid", b"2")
        .commits("two")
        .writes("b.mid", b"b")
        .commits("three")
        .assert_custom(|repo| {
            let report = repo.blame(&BlameOptions {
                limit: Some(2),
                ..Default::default()
            })?;
            ensure!(report.commits_walked == 2);
            ensure!(report.truncated.is_some());
            // a.mid never changes inside the window, so the oldest walked commit owns it
            let a = report
                .entries
                .iter()
                .find(|e| e.path == "a.mid")
                .ok_or_else(|| anyhow::anyhow!("a.mid missing"))?;
            ensure!(a.message == "two");
            Ok(())
        })
        .assert(Assertion::CommitCount(3))
        .run()
        .unwrap();
}
