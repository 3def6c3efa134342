//! Archive integration tests.

mod common;

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use common::{RecordingBackend, SyntheticVideo};
use vidsplit::{
    ArchiveLayout, Archiver, SplitError, SplitOptions, SplitOutcome, VideoSplitter,
    archive_directory,
};
use zip::ZipArchive;

fn entry_names(archive: &Path) -> Vec<String> {
    let zip = ZipArchive::new(File::open(archive).expect("archive should exist"))
        .expect("archive should be a valid zip");
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn entry_text(archive: &Path, name: &str) -> String {
    let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).expect("entry should exist");
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}

fn colliding_tree(root: &Path) {
    fs::create_dir_all(root.join("frames_part_1")).unwrap();
    fs::create_dir_all(root.join("frames_part_2")).unwrap();
    fs::write(root.join("clip_part_1.mp4"), b"clip 1").unwrap();
    fs::write(root.join("frames_part_1/frame_10.jpg"), b"from part 1").unwrap();
    fs::write(root.join("frames_part_1/frame_5.jpg"), b"five").unwrap();
    fs::write(root.join("frames_part_2/frame_10.jpg"), b"from part 2").unwrap();
}

#[test]
fn flat_archive_keeps_each_base_name_once_and_later_wins() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let source = temporary.path().join("clip");
    colliding_tree(&source);
    let archive = temporary.path().join("clip.zip");

    let summary = Archiver::new(ArchiveLayout::Flatten)
        .archive(&source, &archive)
        .expect("archiving should succeed");

    assert_eq!(summary.path, archive);
    assert_eq!(
        entry_names(&archive),
        vec!["clip_part_1.mp4", "frame_10.jpg", "frame_5.jpg"]
    );
    assert_eq!(entry_text(&archive, "frame_10.jpg"), "from part 2");
    assert_eq!(summary.replaced, vec![source.join("frames_part_1/frame_10.jpg")]);
}

#[test]
fn preserved_archive_keeps_relative_paths() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let source = temporary.path().join("clip");
    colliding_tree(&source);
    let archive = temporary.path().join("clip.zip");

    let summary = Archiver::new(ArchiveLayout::Preserve)
        .archive(&source, &archive)
        .expect("archiving should succeed");

    assert!(summary.replaced.is_empty());
    assert_eq!(
        entry_names(&archive),
        vec![
            "clip_part_1.mp4",
            "frames_part_1/frame_10.jpg",
            "frames_part_1/frame_5.jpg",
            "frames_part_2/frame_10.jpg",
        ]
    );
    assert_eq!(entry_text(&archive, "frames_part_1/frame_10.jpg"), "from part 1");
}

#[test]
fn archive_directory_returns_archive_path() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let source = temporary.path().join("clip");
    colliding_tree(&source);
    let archive = temporary.path().join("nested/out/clip.zip");

    let written = archive_directory(&source, &archive).expect("archiving should succeed");
    assert_eq!(written, archive);
    assert_eq!(entry_names(&archive).len(), 3);
}

#[test]
fn archiving_a_missing_directory_fails() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let result = Archiver::default().archive(
        &temporary.path().join("missing"),
        &temporary.path().join("missing.zip"),
    );
    assert!(matches!(result, Err(SplitError::InvalidPath { .. })));
}

// ── Through the splitter ───────────────────────────────────────────

#[test]
fn overlapping_parts_collide_in_flat_archive() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SplitOptions::new()
        .with_frame_step(5)
        .with_output_root(temporary.path());
    let mut splitter = VideoSplitter::new(options).unwrap();

    let outcome = splitter
        .split_source(
            Path::new("videos/clip.mp4"),
            &mut SyntheticVideo::new(10.0, 100),
            &mut RecordingBackend::new(),
            "00:00-00:02, 00:01-00:03",
        )
        .expect("split should succeed");

    let SplitOutcome::Completed(report) = outcome else {
        panic!("expected a completed split");
    };
    let summary = report.archive.as_ref().expect("archive should be written");
    assert_eq!(summary.path, temporary.path().join("clip.zip"));
    assert_eq!(summary.replaced.len(), 2);
    assert_eq!(
        entry_names(&summary.path),
        vec![
            "clip_part_1.mp4",
            "clip_part_2.mp4",
            "frame_0.jpg",
            "frame_10.jpg",
            "frame_15.jpg",
            "frame_20.jpg",
            "frame_25.jpg",
            "frame_5.jpg",
        ]
    );
}

#[test]
fn preserve_layout_through_the_splitter() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SplitOptions::new()
        .with_frame_step(10)
        .with_output_root(temporary.path())
        .with_archive_layout(ArchiveLayout::Preserve);
    let mut splitter = VideoSplitter::new(options).unwrap();

    let outcome = splitter
        .split_source(
            Path::new("clip.mp4"),
            &mut SyntheticVideo::new(10.0, 100),
            &mut RecordingBackend::new(),
            "00:00-00:02, 00:01-00:03",
        )
        .expect("split should succeed");

    let archive = outcome.report().and_then(|report| report.archive_path()).unwrap();
    assert_eq!(
        entry_names(archive),
        vec![
            "clip_part_1.mp4",
            "clip_part_2.mp4",
            "frames_part_1/frame_0.jpg",
            "frames_part_1/frame_10.jpg",
            "frames_part_2/frame_10.jpg",
            "frames_part_2/frame_20.jpg",
        ]
    );
}

#[test]
fn second_job_archives_only_its_own_outputs() {
    let temporary = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SplitOptions::new()
        .with_frame_step(5)
        .with_output_root(temporary.path());
    let mut splitter = VideoSplitter::new(options).unwrap();
    let mut backend = RecordingBackend::new();

    for timecodes in ["00:00-00:01", "00:05-00:06"] {
        splitter
            .split_source(
                Path::new("talk.mp4"),
                &mut SyntheticVideo::new(10.0, 100),
                &mut backend,
                timecodes,
            )
            .expect("split should succeed");
    }

    let archive = temporary.path().join("talk.zip");
    assert_eq!(
        entry_names(&archive),
        vec!["frame_50.jpg", "frame_55.jpg", "talk_part_1.mp4"]
    );
    assert!(!temporary.path().join("talk/frames_part_1/frame_0.jpg").exists());
    assert!(temporary.path().join("talk/frames_part_1/frame_50.jpg").is_file());
}
