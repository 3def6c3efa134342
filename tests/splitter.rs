//! End-to-end splitter tests.
//!
//! Tests that open real files require fixture files from
//! `tests/fixtures/generate_fixtures.sh` and return early without them.

mod common;

use std::fs;
use std::path::Path;

use common::{RecordingBackend, SyntheticVideo, files_under};
use vidsplit::{
    FrameSource, JobState, SplitError, SplitOptions, SplitOutcome, VideoFile, VideoSplitter,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── Input validation ───────────────────────────────────────────────

#[test]
fn missing_video_is_an_invalid_path() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let mut splitter =
        VideoSplitter::new(SplitOptions::new().with_output_root(temporary.path())).unwrap();

    let result = splitter.split_video(temporary.path().join("missing.mp4"), "00:00-00:01");
    assert!(matches!(result, Err(SplitError::InvalidPath { .. })));
    assert!(files_under(temporary.path()).is_empty());
}

#[test]
fn invalid_options_are_rejected_up_front() {
    assert!(matches!(
        VideoSplitter::new(SplitOptions::new().with_quality(0)),
        Err(SplitError::InvalidQuality(0))
    ));
    assert!(matches!(
        VideoSplitter::new(SplitOptions::new().with_frame_step(0)),
        Err(SplitError::InvalidStep)
    ));
}

#[test]
fn timecodes_without_ranges_leave_the_disk_untouched() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let video = temporary.path().join("talk.mp4");
    fs::write(&video, b"not decoded").unwrap();
    let output = temporary.path().join("output");
    let mut splitter = VideoSplitter::new(SplitOptions::new().with_output_root(&output)).unwrap();

    let outcome = splitter.split_video(&video, "hello").expect("not an error");

    let report = outcome.report().expect("completed");
    assert!(report.segments.is_empty());
    assert!(report.archive.is_none());
    assert!(!output.exists());
    assert_eq!(splitter.jobs().iter().count(), 0);
}

// ── Job table ──────────────────────────────────────────────────────

#[test]
fn repeated_split_is_skipped() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let mut splitter =
        VideoSplitter::new(SplitOptions::new().with_output_root(temporary.path())).unwrap();
    let mut backend = RecordingBackend::new();

    let first = splitter
        .split_source(
            Path::new("talk.mp4"),
            &mut SyntheticVideo::new(10.0, 100),
            &mut backend,
            "00:00-00:01",
        )
        .unwrap();
    assert!(matches!(first, SplitOutcome::Completed(_)));

    let second = splitter
        .split_source(
            Path::new("talk.mp4"),
            &mut SyntheticVideo::new(10.0, 100),
            &mut backend,
            "take two: 00:00-00:01",
        )
        .unwrap();
    match second {
        SplitOutcome::AlreadyDone { video, archive } => {
            assert_eq!(video, Path::new("talk.mp4"));
            assert_eq!(archive, Some(temporary.path().join("talk.zip")));
        }
        other => panic!("expected AlreadyDone, got {other:?}"),
    }

    assert_eq!(backend.records().len(), 1);
    assert_eq!(splitter.jobs().count(JobState::Done), 1);
}

#[test]
fn different_ranges_are_a_different_job() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let mut splitter =
        VideoSplitter::new(SplitOptions::new().with_output_root(temporary.path())).unwrap();
    let mut backend = RecordingBackend::new();

    for timecodes in ["00:00-00:01", "00:02-00:03"] {
        let outcome = splitter
            .split_source(
                Path::new("talk.mp4"),
                &mut SyntheticVideo::new(10.0, 100),
                &mut backend,
                timecodes,
            )
            .unwrap();
        assert!(matches!(outcome, SplitOutcome::Completed(_)));
    }

    assert_eq!(backend.records().len(), 2);
    assert_eq!(splitter.jobs().count(JobState::Done), 2);
}

#[test]
fn failed_split_can_be_retried() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let blocker = temporary.path().join("blocked");
    fs::write(&blocker, b"file").unwrap();
    let mut splitter = VideoSplitter::new(SplitOptions::new().with_output_root(&blocker)).unwrap();

    let result = splitter.split_source(
        Path::new("talk.mp4"),
        &mut SyntheticVideo::new(10.0, 100),
        &mut RecordingBackend::new(),
        "00:00-00:01",
    );

    assert!(result.is_err());
    assert_eq!(splitter.jobs().count(JobState::Pending), 1);
    assert_eq!(splitter.jobs().count(JobState::Done), 0);
}

// ── Output tree ────────────────────────────────────────────────────

#[test]
fn split_without_archive_writes_only_the_video_directory() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SplitOptions::new()
        .with_frame_step(5)
        .with_output_root(temporary.path())
        .with_archive(false);
    let mut splitter = VideoSplitter::new(options).unwrap();

    let outcome = splitter
        .split_source(
            Path::new("my: talk?.mp4"),
            &mut SyntheticVideo::new(10.0, 100),
            &mut RecordingBackend::new(),
            "00:00-00:02, 00:05-00:07",
        )
        .unwrap();

    let report = outcome.report().unwrap();
    assert!(report.archive.is_none());
    assert_eq!(report.still_count(), 8);
    assert_eq!(report.video_dir, temporary.path().join("my_ talk_"));

    let files = files_under(temporary.path());
    assert_eq!(files.len(), 10);
    assert!(files.contains(&Path::new("my_ talk_/my_ talk__part_1.mp4").to_path_buf()));
    assert!(files.contains(&Path::new("my_ talk_/frames_part_2/frame_65.jpg").to_path_buf()));
    assert!(!temporary.path().join("my_ talk_.zip").exists());
}

// ── Folders ────────────────────────────────────────────────────────

#[test]
fn split_folder_rejects_missing_folder() {
    let mut splitter = VideoSplitter::new(SplitOptions::new()).unwrap();
    let result = splitter.split_folder("definitely/not/a/folder", "00:00-00:01");
    assert!(matches!(result, Err(SplitError::InvalidPath { .. })));
}

#[test]
fn split_folder_records_unreadable_videos_and_continues() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let folder = temporary.path().join("videos");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("broken.mp4"), b"this is not a video").unwrap();
    fs::write(folder.join("notes.txt"), b"ignored").unwrap();

    let options = SplitOptions::new().with_output_root(temporary.path().join("output"));
    let mut splitter = VideoSplitter::new(options).unwrap();
    let report = splitter
        .split_folder(&folder, "00:00-00:01")
        .expect("folder exists");

    assert!(report.outcomes.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, folder.join("broken.mp4"));
}

// ── Fixture video ──────────────────────────────────────────────────

#[test]
fn split_sample_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let properties = VideoFile::open(path).expect("Failed to open fixture").properties();
    assert!(properties.frames_per_second > 0.0);

    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SplitOptions::new()
        .with_frame_step(5)
        .with_output_root(temporary.path());
    let mut splitter = VideoSplitter::new(options).unwrap();

    let outcome = splitter
        .split_video(path, "00:00-00:01, 00:02-00:03")
        .expect("split should succeed");
    let report = outcome.report().expect("completed");

    assert_eq!(report.segments.len(), 2);
    for segment in &report.segments {
        assert!(!segment.still_frames.is_empty());
        assert_eq!(segment.still_frames[0], segment.start_frame);
        for frame_number in &segment.still_frames {
            assert!(segment.frames_dir.join(format!("frame_{frame_number}.jpg")).is_file());
        }
        // Skip clip checks if the MPEG-4 encoder is not available on this platform.
        if let Some(error) = &segment.clip_error {
            eprintln!("Skipping clip checks: {error}");
            continue;
        }
        assert!(segment.clip_frames > 0);
        assert!(fs::metadata(&segment.clip_path).unwrap().len() > 0);
    }

    let archive = report.archive_path().expect("archive should be written");
    assert!(archive.is_file());
    assert_eq!(archive, temporary.path().join("sample_video.zip"));
}

#[test]
fn sample_video_reopened_clip_has_expected_length() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SplitOptions::new()
        .with_output_root(temporary.path())
        .with_archive(false);
    let mut splitter = VideoSplitter::new(options).unwrap();
    let outcome = splitter.split_video(path, "00:00-00:01").unwrap();
    let segment = &outcome.report().unwrap().segments[0];
    if segment.clip_error.is_some() {
        return;
    }

    let mut clip = VideoFile::open(&segment.clip_path).expect("clip should reopen");
    let mut decoded: u64 = 0;
    while clip.read_frame().unwrap().is_some() {
        decoded += 1;
    }
    assert!(decoded > 0);
    assert!(decoded.abs_diff(segment.clip_frames) <= 1);
}
