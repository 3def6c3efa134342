//! End-to-end splitting.
//!
//! [`VideoSplitter`] is the main entry point for the crate. For each video it
//! parses the timecodes, opens the file, runs the [`SegmentExtractor`] and
//! packages the results with the [`Archiver`]. A [`JobTable`] remembers what
//! has already been produced, so asking for the same split twice does no
//! work the second time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveSummary, Archiver};
use crate::configuration::SplitOptions;
use crate::discovery::find_videos;
use crate::encode::{ClipBackend, FfmpegClipBackend};
use crate::error::SplitError;
use crate::extractor::{SegmentExtractor, SegmentReport};
use crate::jobs::{JobKey, JobState, JobTable};
use crate::naming::OutputLayout;
use crate::source::{FrameSource, VideoFile};
use crate::timecode::{TimeInterval, parse_timecodes};

/// Everything produced for one video.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitReport {
    /// The source video.
    pub video: PathBuf,
    /// Directory holding the clips and frame directories.
    pub video_dir: PathBuf,
    /// One report per interval, in order.
    pub segments: Vec<SegmentReport>,
    /// The written archive, if archiving was enabled and there was output.
    pub archive: Option<ArchiveSummary>,
}

impl SplitReport {
    /// Path of the archive, if one was written.
    pub fn archive_path(&self) -> Option<&Path> {
        self.archive.as_ref().map(|summary| summary.path.as_path())
    }

    /// Total number of stills written across all parts.
    pub fn still_count(&self) -> usize {
        self.segments.iter().map(|segment| segment.still_frames.len()).sum()
    }
}

/// Result of asking for a split.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// The split ran.
    Completed(SplitReport),
    /// The same video was already split with the same parameters in this
    /// session; nothing was done.
    AlreadyDone {
        /// The source video.
        video: PathBuf,
        /// Where the earlier run put its archive, if archiving is enabled.
        archive: Option<PathBuf>,
    },
}

impl SplitOutcome {
    /// The report, if the split ran.
    pub fn report(&self) -> Option<&SplitReport> {
        match self {
            SplitOutcome::Completed(report) => Some(report),
            SplitOutcome::AlreadyDone { .. } => None,
        }
    }
}

/// Outcome of splitting every video in a folder.
#[derive(Debug, Default)]
pub struct FolderReport {
    /// Videos that were split or skipped, in processing order.
    pub outcomes: Vec<SplitOutcome>,
    /// Videos that failed, with the error that halted them.
    pub failures: Vec<(PathBuf, SplitError)>,
}

/// Splits videos into parts according to timecodes.
///
/// # Example
///
/// ```no_run
/// use vidsplit::{SplitError, SplitOptions, SplitOutcome, VideoSplitter};
///
/// let mut splitter = VideoSplitter::new(SplitOptions::new().with_frame_step(5))?;
/// if let SplitOutcome::Completed(report) =
///     splitter.split_video("talk.mp4", "intro 00:00-00:02, demo 00:05-00:07")?
/// {
///     println!("{} stills, archive at {:?}", report.still_count(), report.archive_path());
/// }
/// # Ok::<(), SplitError>(())
/// ```
#[derive(Debug)]
pub struct VideoSplitter {
    options: SplitOptions,
    jobs: JobTable,
}

impl VideoSplitter {
    /// Create a splitter with validated options.
    ///
    /// # Errors
    ///
    /// [`SplitError::InvalidStep`] or [`SplitError::InvalidQuality`].
    pub fn new(options: SplitOptions) -> Result<Self, SplitError> {
        options.validate()?;
        Ok(Self {
            options,
            jobs: JobTable::new(),
        })
    }

    /// The options every split uses.
    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Jobs seen so far.
    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Split one video file.
    ///
    /// Text without any `MM:SS-MM:SS` range is not an error: the result is a
    /// completed report with no segments, and nothing is written to disk.
    ///
    /// # Errors
    ///
    /// - [`SplitError::InvalidPath`] if `video` is missing or not a file.
    /// - Any error from opening the video, extraction, or archiving.
    pub fn split_video<P: AsRef<Path>>(
        &mut self,
        video: P,
        timecodes: &str,
    ) -> Result<SplitOutcome, SplitError> {
        let video = video.as_ref();
        if !video.is_file() {
            return Err(SplitError::invalid_path(video, "video file does not exist"));
        }

        let intervals = parse_timecodes(timecodes);
        if intervals.is_empty() {
            log::info!("No time ranges found for {}", video.display());
            return Ok(SplitOutcome::Completed(self.empty_report(video)));
        }

        let key = JobKey::new(video, &intervals, &self.options);
        if let Some(done) = self.already_done(video, &key) {
            return Ok(done);
        }

        let result = VideoFile::open(video).and_then(|mut source| {
            self.run(video, &mut source, &mut FfmpegClipBackend, &intervals)
        });
        self.settle(&key, result)
    }

    /// Split an already-opened source with a custom clip backend.
    ///
    /// `video` names the outputs and identifies the job; it is not opened.
    pub fn split_source<S: FrameSource, B: ClipBackend>(
        &mut self,
        video: &Path,
        source: &mut S,
        backend: &mut B,
        timecodes: &str,
    ) -> Result<SplitOutcome, SplitError> {
        let intervals = parse_timecodes(timecodes);
        if intervals.is_empty() {
            return Ok(SplitOutcome::Completed(self.empty_report(video)));
        }

        let key = JobKey::new(video, &intervals, &self.options);
        if let Some(done) = self.already_done(video, &key) {
            return Ok(done);
        }

        let result = self.run(video, source, backend, &intervals);
        self.settle(&key, result)
    }

    /// Split every supported video directly inside `folder`, one after
    /// another.
    ///
    /// A video that fails is recorded and the rest still run.
    ///
    /// # Errors
    ///
    /// [`SplitError::InvalidPath`] if `folder` is not a directory.
    pub fn split_folder<P: AsRef<Path>>(
        &mut self,
        folder: P,
        timecodes: &str,
    ) -> Result<FolderReport, SplitError> {
        let videos = find_videos(folder.as_ref())?;
        log::info!("Found {} video(s) in {}", videos.len(), folder.as_ref().display());

        let mut report = FolderReport::default();
        for video in videos {
            match self.split_video(&video, timecodes) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(error) => {
                    log::warn!("{}: {error}", video.display());
                    report.failures.push((video, error));
                }
            }
        }
        Ok(report)
    }

    fn layout(&self, video: &Path) -> OutputLayout {
        OutputLayout::for_video(self.options.output_root.clone(), video)
    }

    fn empty_report(&self, video: &Path) -> SplitReport {
        SplitReport {
            video: video.to_path_buf(),
            video_dir: self.layout(video).video_dir(),
            segments: Vec::new(),
            archive: None,
        }
    }

    fn already_done(&mut self, video: &Path, key: &JobKey) -> Option<SplitOutcome> {
        if self.jobs.register(key.clone()) != JobState::Done {
            return None;
        }
        log::info!("{} was already split with these settings; skipping", video.display());
        Some(SplitOutcome::AlreadyDone {
            video: video.to_path_buf(),
            archive: self
                .options
                .archive
                .then(|| self.layout(video).archive_path()),
        })
    }

    fn settle(
        &mut self,
        key: &JobKey,
        result: Result<SplitReport, SplitError>,
    ) -> Result<SplitOutcome, SplitError> {
        match result {
            Ok(report) => {
                self.jobs.complete(key);
                Ok(SplitOutcome::Completed(report))
            }
            Err(error) => {
                self.jobs.fail(key);
                Err(error)
            }
        }
    }

    fn run<S: FrameSource, B: ClipBackend>(
        &mut self,
        video: &Path,
        source: &mut S,
        backend: &mut B,
        intervals: &[TimeInterval],
    ) -> Result<SplitReport, SplitError> {
        let key = JobKey::new(video, intervals, &self.options);
        self.jobs.begin(&key);

        let layout = self.layout(video);
        log::info!(
            "Splitting {} into {} part(s) under {}",
            video.display(),
            intervals.len(),
            layout.video_dir().display()
        );

        // Outputs of an earlier job for this video must not leak into this one.
        let video_dir = layout.video_dir();
        if video_dir.exists() {
            log::debug!("Clearing previous outputs in {}", video_dir.display());
            fs::remove_dir_all(&video_dir)?;
        }

        let segments = SegmentExtractor::new(source, backend, &self.options).run(&layout, intervals)?;

        let archive = if self.options.archive {
            let summary = Archiver::new(self.options.archive_layout)
                .archive(&layout.video_dir(), &layout.archive_path())?;
            Some(summary)
        } else {
            None
        };

        Ok(SplitReport {
            video: video.to_path_buf(),
            video_dir: layout.video_dir(),
            segments,
            archive,
        })
    }
}
