//! # vidsplit
//!
//! Split videos into sub-clips and decimated JPEG stills from free-text
//! timecodes, then package each video's outputs into a zip archive.
//!
//! `vidsplit` finds every `MM:SS-MM:SS` range in a piece of text, cuts the
//! matching frame ranges out of a video, writes each range as its own clip
//! and saves every N-th frame of it as a JPEG. Decoding and encoding are
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Split a Video
//!
//! ```no_run
//! use vidsplit::{SplitOptions, VideoSplitter};
//!
//! let mut splitter = VideoSplitter::new(SplitOptions::new().with_frame_step(5)).unwrap();
//! splitter.split_video("talk.mp4", "00:00-00:02, 00:05-00:07").unwrap();
//! // output/talk/talk_part_1.mp4
//! // output/talk/frames_part_1/frame_0.jpg, frame_5.jpg, ...
//! // output/talk.zip
//! ```
//!
//! ### Parse Timecodes
//!
//! ```
//! use std::time::Duration;
//!
//! use vidsplit::parse_timecodes;
//!
//! let intervals = parse_timecodes("intro 00:00-00:30, then 01:15-02:00");
//! assert_eq!(intervals.len(), 2);
//! assert_eq!(intervals[1].start, Duration::from_secs(75));
//! ```
//!
//! ### Track Progress
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidsplit::{ProgressReporter, SplitOptions, VideoSplitter};
//!
//! let reporter = Arc::new(ProgressReporter::new());
//! let options = SplitOptions::new().with_progress(reporter.clone());
//! let mut splitter = VideoSplitter::new(options).unwrap();
//! splitter.split_video("talk.mp4", "00:00-00:10").unwrap();
//! println!("{}% {}", reporter.percent(), reporter.status());
//! ```
//!
//! ## Features
//!
//! - **Timecode parsing** — ranges are picked out of arbitrary text
//! - **Frame-accurate parts** — `[round(start * fps), round(end * fps))`
//! - **Two output rates** — every frame to the clip, every N-th to stills
//! - **Codec choice** — MPEG-4, H.264, Xvid, or Motion JPEG clips
//! - **Archiving** — one zip per video, flat or with relative paths
//! - **Job tracking** — repeated requests in a session are skipped
//! - **Pluggable I/O** — [`FrameSource`] and [`ClipBackend`] traits
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod archive;
pub mod configuration;
pub mod discovery;
pub mod encode;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod jobs;
pub mod metadata;
pub mod naming;
pub mod progress;
pub mod source;
pub mod splitter;
pub mod timecode;
mod utilities;

pub use archive::{ArchiveLayout, ArchiveSummary, Archiver, archive_directory};
pub use configuration::{DEFAULT_QUALITY, SplitOptions};
pub use discovery::{VIDEO_EXTENSIONS, find_videos, render_tree, subdirectories};
pub use encode::{ClipBackend, ClipSettings, ClipSink, ClipWriter, FfmpegClipBackend, VideoCodec};
pub use error::SplitError;
pub use extractor::{SegmentExtractor, SegmentJob, SegmentReport, write_still};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use jobs::{JobKey, JobState, JobTable};
pub use metadata::VideoProperties;
pub use naming::{DEFAULT_OUTPUT_ROOT, OutputLayout, frame_file_name, sanitize};
pub use progress::{COMPLETE_STATUS, ProgressCallback, ProgressInfo, ProgressReporter, ProgressState};
pub use source::{FrameSource, VideoFile};
pub use splitter::{FolderReport, SplitOutcome, SplitReport, VideoSplitter};
pub use timecode::{TimeInterval, parse_timecodes};
pub use utilities::timestamp_to_frame_number;
