//! Output naming.
//!
//! Every split run writes into a fixed directory convention that other
//! tooling relies on:
//!
//! ```text
//! output/<video>/<video>_part_<k>.<ext>
//! output/<video>/frames_part_<k>/frame_<n>.jpg
//! output/<video>.zip
//! ```
//!
//! Part numbers `k` are 1-based; frame numbers `n` are absolute frame indices
//! in the source. Text that comes from the user or the video file name is
//! passed through [`sanitize`] first.

use std::path::{Path, PathBuf};

/// Default root directory for all outputs.
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

const RESERVED_CHARACTERS: [char; 7] = [':', '"', '<', '>', '|', '?', '*'];

/// Replace characters that are illegal in file names on common platforms
/// with `_`.
///
/// # Example
///
/// ```
/// assert_eq!(vidsplit::sanitize("take 1: \"final\"?"), "take 1_ _final__");
/// ```
pub fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if RESERVED_CHARACTERS.contains(&c) { '_' } else { c })
        .collect()
}

/// Paths for one video's outputs under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    video_name: String,
}

impl OutputLayout {
    /// Layout for `video_name` (the file stem, unsanitized) under `root`.
    pub fn new(root: impl Into<PathBuf>, video_name: &str) -> Self {
        Self {
            root: root.into(),
            video_name: sanitize(video_name),
        }
    }

    /// Layout for a video path, using its file stem as the name.
    pub fn for_video(root: impl Into<PathBuf>, video_path: &Path) -> Self {
        let stem = video_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        Self::new(root, &stem)
    }

    /// The sanitized video name used in every derived path.
    pub fn video_name(&self) -> &str {
        &self.video_name
    }

    /// Root output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<video>/`
    pub fn video_dir(&self) -> PathBuf {
        self.root.join(&self.video_name)
    }

    /// `<root>/<video>/<video>_part_<index+1>.<extension>`
    pub fn clip_path(&self, index: usize, extension: &str) -> PathBuf {
        self.video_dir()
            .join(format!("{}_part_{}.{extension}", self.video_name, index + 1))
    }

    /// `<root>/<video>/frames_part_<index+1>/`
    pub fn frames_dir(&self, index: usize) -> PathBuf {
        self.video_dir().join(format!("frames_part_{}", index + 1))
    }

    /// `<root>/<video>/frames_part_<index+1>/frame_<frame_number>.jpg`
    pub fn frame_path(&self, index: usize, frame_number: u64) -> PathBuf {
        self.frames_dir(index).join(frame_file_name(frame_number))
    }

    /// `<root>/<video>.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(format!("{}.zip", self.video_name))
    }
}

/// `frame_<frame_number>.jpg`
pub fn frame_file_name(frame_number: u64) -> String {
    format!("frame_{frame_number}.jpg")
}
