use crate::harness::midi::note_on_pitches;
use crate::harness::{Assertion, MidiFile, Scenario};
use anyhow::ensure;
use muse_core::midi::PERCUSSION_CHANNEL;
use muse_core::{MuseError, Scope, TransposeOptions, TransposeOutcome};

fn song() -> Vec<u8> {
    MidiFile::new()
        .note_track(Some("Piano"), 0, 60)
        .note_track(Some("Drums"), PERCUSSION_CHANNEL, 36)
        .build()
}

#[test]
fn test_transpose_head_advances_branch_and_tree() {
    let expected = MidiFile::new()
        .note_track(Some("Piano"), 0, 63)
        .note_track(Some("Drums"), PERCUSSION_CHANNEL, 36)
        .build();

    Scenario::new("transpose_head")
        .writes("song.mid", &song())
        .writes("notes.txt", b"lyrics")
        .commits_with_key("first", "C major")
        .transposes("m3")
        .assert_head_message("Transpose m3 (+3 semitones)")
        .assert(Assertion::HeadKey(Some("D# major".to_string())))
        .assert_work_file("song.mid", &expected)
        .assert_work_file("notes.txt", b"lyrics")
        .assert(Assertion::CleanStatus)
        .assert(Assertion::Healthy)
        .run()
        .unwrap();
}

#[test]
fn test_percussion_untouched_and_clamped() {
    let data = MidiFile::new()
        .track(None, &[(0, 126), (PERCUSSION_CHANNEL, 40)])
        .build();

    Scenario::new("transpose_clamp")
        .writes("a.mid", &data)
        .commits("first")
        .transposes("+10")
        .assert_custom(|repo| {
            let bytes = repo.worktree().read_file("a.mid")?;
            ensure!(note_on_pitches(&bytes) == vec![(0, 127), (PERCUSSION_CHANNEL, 40)]);
            Ok(())
        })
        .run()
        .unwrap();
}

#[test]
fn test_zero_shift_is_noop() {
    Scenario::new("transpose_zero")
        .writes("song.mid", &song())
        .commits("first")
        .transposes("unison")
        .assert(Assertion::LastWasNoop)
        .assert_commit_count(1)
        .assert_work_file("song.mid", &song())
        .run()
        .unwrap();
}

#[test]
fn test_track_filter_selects_chunks() {
    Scenario::new("transpose_track")
        .writes("song.mid", &song())
        .commits("first")
        .transposes_with("-2", None, Scope::track("pia"), false)
        .assert_custom(|repo| {
            let bytes = repo.worktree().read_file("song.mid")?;
            ensure!(note_on_pitches(&bytes) == vec![(0, 58), (PERCUSSION_CHANNEL, 36)]);
            Ok(())
        })
        .transposes_with("+5", None, Scope::track("strings"), false)
        .assert(Assertion::LastWasNoop)
        .run()
        .unwrap();
}

#[test]
fn test_section_filter_and_dry_run() {
    Scenario::new("transpose_section")
        .writes("verse/a.mid", &song())
        .writes("chorus/a.mid", &song())
        .commits("first")
        .transposes_with("P5", None, Scope::section("chorus"), true)
        .assert_commit_count(1)
        .assert_work_file("chorus/a.mid", &song())
        .transposes_with("P5", None, Scope::section("chorus"), false)
        .assert_commit_count(2)
        .assert_work_file("verse/a.mid", &song())
        .assert_custom(|repo| {
            let bytes = repo.worktree().read_file("chorus/a.mid")?;
            ensure!(note_on_pitches(&bytes)[0] == (0, 67));
            Ok(())
        })
        .run()
        .unwrap();
}

#[test]
fn test_older_source_only_previews() {
    Scenario::new("transpose_old_source")
        .writes("song.mid", &song())
        .commits("first")
        .writes("other.mid", &song())
        .commits("second")
        .assert_custom(|repo| {
            let first = repo.log(None, None)?[1].id.as_hex();

            let commit = TransposeOptions {
                source: Some(first.clone()),
                ..TransposeOptions::new("octave")
            };
            let refused = repo.transpose(&commit);
            ensure!(matches!(refused, Err(MuseError::NotBranchHead { .. })));

            let preview = TransposeOptions {
                dry_run: true,
                ..commit
            };
            match repo.transpose(&preview)? {
                TransposeOutcome::DryRun { would_modify, .. } => {
                    ensure!(would_modify == vec!["song.mid".to_string()]);
                }
                other => anyhow::bail!("expected a dry run, got {:?}", other),
            }
            Ok(())
        })
        .assert_commit_count(2)
        .assert_head_message("second")
        .assert_work_file("song.mid", &song())
        .run()
        .unwrap();
}

#[test]
fn test_uncommitted_edits_are_not_overwritten() {
    let edited = MidiFile::new().note_track(Some("Piano"), 0, 72).build();

    Scenario::new("transpose_dirty")
        .writes("song.mid", &song())
        .writes("other.mid", &song())
        .commits("first")
        .writes("song.mid", &edited)
        .transposes("+2")
        .assert(Assertion::LastIncomplete(vec!["song.mid".to_string()]))
        .assert_commit_count(2)
        .assert_work_file("song.mid", &edited)
        .assert_custom(|repo| {
            let bytes = repo.worktree().read_file("other.mid")?;
            ensure!(note_on_pitches(&bytes)[0] == (0, 62));
            let committed = repo.head_manifest()?;
            let first = repo.log(None, None)?[1].id;
            let original = repo.commit_manifest(&repo.load_commit(first)?)?;
            ensure!(committed.get("song.mid") == original.get("song.mid"));
            Ok(())
        })
        .run()
        .unwrap();
}

#[test]
fn test_malformed_and_missing_files_are_skipped() {
    Scenario::new("transpose_skipped")
        .writes("good.mid", &song())
        .writes("bad.mid", b"MThd\x00\x00")
        .writes("lost.mid", &MidiFile::new().note_track(None, 1, 50).build())
        .commits("first")
        .loses_object("lost.mid")
        .transposes("+1")
        .assert(Assertion::LastIncomplete(vec![
            "bad.mid".to_string(),
            "lost.mid".to_string(),
        ]))
        .assert_head_message("Transpose +1 (+1 semitones)")
        .run()
        .unwrap();
}

#[test]
fn test_bad_interval_is_rejected_before_mutation() {
    Scenario::new("transpose_bad_interval")
        .writes("song.mid", &song())
        .commits("first")
        .assert_custom(|repo| {
            let result = repo.transpose(&TransposeOptions::new("sideways"));
            ensure!(matches!(result, Err(MuseError::InvalidInterval { .. })));
            Ok(())
        })
        .assert_commit_count(1)
        .run()
        .unwrap();
}
