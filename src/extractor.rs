//! Segment extraction.
//!
//! [`SegmentExtractor`] turns a list of [`TimeInterval`]s into parts: for each
//! interval it writes a sub-clip holding every decoded frame in range, and a
//! directory of JPEG stills holding every `frame_step`-th of those frames.
//!
//! Frame ranges are half-open: an interval covers
//! `[round(start * fps), round(end * fps))`. Within a part the source is
//! read sequentially after one seek, so stills land exactly on
//! `start_frame, start_frame + step, ...`.
//!
//! Running out of frames is not an error. A part whose range extends past
//! the end of the video (or whose decoder fails mid-way) is simply shorter,
//! and the report records it as truncated. A codec that cannot be opened
//! leaves the part without a clip but its stills are still written; the
//! failure is logged and recorded on the [`SegmentReport`].
//!
//! # Example
//!
//! ```no_run
//! use vidsplit::{
//!     FfmpegClipBackend, OutputLayout, SegmentExtractor, SplitError, SplitOptions, VideoFile,
//!     parse_timecodes,
//! };
//!
//! let mut video = VideoFile::open("talk.mp4")?;
//! let mut backend = FfmpegClipBackend;
//! let options = SplitOptions::new().with_frame_step(5);
//! let layout = OutputLayout::new("output", "talk");
//!
//! let intervals = parse_timecodes("00:00-00:02, 00:05-00:07");
//! let reports = SegmentExtractor::new(&mut video, &mut backend, &options).run(&layout, &intervals)?;
//! for report in &reports {
//!     println!("part {}: {} stills", report.index + 1, report.still_frames.len());
//! }
//! # Ok::<(), SplitError>(())
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};

use crate::configuration::SplitOptions;
use crate::encode::{ClipBackend, ClipSettings, ClipSink, VideoCodec};
use crate::error::SplitError;
use crate::naming::OutputLayout;
use crate::progress::ProgressTracker;
use crate::source::FrameSource;
use crate::timecode::TimeInterval;

/// One interval's worth of work.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentJob {
    /// The interval to cut.
    pub interval: TimeInterval,
    /// 0-based part index; outputs are numbered `index + 1`.
    pub index: usize,
    /// Stride between saved stills, at least 1.
    pub frame_step: u64,
    /// Clip codec.
    pub codec: VideoCodec,
    /// Still JPEG quality, 1–100.
    pub quality: u8,
}

impl SegmentJob {
    /// Build the job for part `index` from the run options.
    pub fn new(interval: TimeInterval, index: usize, options: &SplitOptions) -> Self {
        Self {
            interval,
            index,
            frame_step: options.frame_step.max(1),
            codec: options.codec,
            quality: options.quality,
        }
    }

    /// `[start_frame, end_frame)` at `frames_per_second`.
    pub fn frame_bounds(&self, frames_per_second: f64) -> (u64, u64) {
        self.interval.frame_bounds(frames_per_second)
    }

    /// Absolute frame numbers that receive a still, assuming every frame in
    /// range decodes.
    pub fn still_frame_numbers(&self, frames_per_second: f64) -> Vec<u64> {
        let (start, end) = self.frame_bounds(frames_per_second);
        (start..end).step_by(self.frame_step as usize).collect()
    }
}

/// What was produced for one part.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    /// 0-based part index.
    pub index: usize,
    /// The interval this part was cut from.
    pub interval: TimeInterval,
    /// First frame of the range (inclusive).
    pub start_frame: u64,
    /// End of the range (exclusive).
    pub end_frame: u64,
    /// Path of the sub-clip.
    pub clip_path: PathBuf,
    /// Directory holding the stills.
    pub frames_dir: PathBuf,
    /// Frames successfully decoded within the range.
    pub decoded_frames: u64,
    /// Frames the clip encoder accepted.
    pub clip_frames: u64,
    /// Absolute frame numbers saved as stills, in order.
    pub still_frames: Vec<u64>,
    /// Why the clip could not be written, if it could not.
    pub clip_error: Option<String>,
    /// Whether the source ran out of frames before `end_frame`.
    pub truncated: bool,
}

impl SegmentReport {
    /// Whether the clip was written without encoder failures.
    pub fn has_clip(&self) -> bool {
        self.clip_error.is_none()
    }
}

/// Drives a [`FrameSource`] and a [`ClipBackend`] through a list of
/// intervals for one video.
///
/// The extractor borrows the source mutably for its whole lifetime, so a
/// decoder is never shared between two runs.
pub struct SegmentExtractor<'a, S: FrameSource, B: ClipBackend> {
    source: &'a mut S,
    backend: &'a mut B,
    options: &'a SplitOptions,
}

impl<'a, S: FrameSource, B: ClipBackend> SegmentExtractor<'a, S, B> {
    /// Create an extractor over `source`, opening clips with `backend`.
    pub fn new(source: &'a mut S, backend: &'a mut B, options: &'a SplitOptions) -> Self {
        Self {
            source,
            backend,
            options,
        }
    }

    /// Extract every interval, in order, into `layout`.
    ///
    /// Reports progress once per part. An empty interval list does nothing:
    /// no directories, no files, no progress events.
    ///
    /// # Errors
    ///
    /// - [`SplitError::InvalidStep`] / [`SplitError::InvalidQuality`] for bad
    ///   options.
    /// - [`SplitError::IoError`] / [`SplitError::ImageError`] when output
    ///   directories or stills cannot be written. These halt the run.
    pub fn run(
        &mut self,
        layout: &OutputLayout,
        intervals: &[TimeInterval],
    ) -> Result<Vec<SegmentReport>, SplitError> {
        self.options.validate()?;

        if intervals.is_empty() {
            log::info!("No intervals for {}; nothing to do", layout.video_name());
            return Ok(Vec::new());
        }

        fs::create_dir_all(layout.video_dir())?;

        let mut tracker = ProgressTracker::new(self.options.progress.clone(), intervals.len());
        let mut reports = Vec::with_capacity(intervals.len());

        for (index, interval) in intervals.iter().enumerate() {
            let job = SegmentJob::new(*interval, index, self.options);
            let report = self.extract(layout, &job)?;
            log::info!(
                "Part {}/{} ({}): frames [{}, {}), {} decoded, {} still(s)",
                index + 1,
                intervals.len(),
                interval,
                report.start_frame,
                report.end_frame,
                report.decoded_frames,
                report.still_frames.len(),
            );
            reports.push(report);
            tracker.advance();
        }

        Ok(reports)
    }

    /// Extract a single part.
    pub fn extract(
        &mut self,
        layout: &OutputLayout,
        job: &SegmentJob,
    ) -> Result<SegmentReport, SplitError> {
        let properties = self.source.properties();
        let (start_frame, end_frame) = job.frame_bounds(properties.frames_per_second);

        let frames_dir = layout.frames_dir(job.index);
        fs::create_dir_all(&frames_dir)?;

        let clip_path = layout.clip_path(job.index, job.codec.extension());
        let settings = ClipSettings {
            width: properties.width,
            height: properties.height,
            frames_per_second: properties.frames_per_second,
            codec: job.codec,
            bit_rate: self.options.bit_rate,
        };

        let mut clip_error = None;
        let mut sink = match self.backend.open(&clip_path, &settings) {
            Ok(sink) => Some(sink),
            Err(error) => {
                log::warn!(
                    "Part {}: no clip written to {}: {error}",
                    job.index + 1,
                    clip_path.display()
                );
                clip_error = Some(error.to_string());
                None
            }
        };

        let planned_stills = job.still_frame_numbers(properties.frames_per_second);
        log::debug!(
            "Part {}: frames {start_frame}..{end_frame}, {} still(s) planned",
            job.index + 1,
            planned_stills.len()
        );

        let mut decoded_frames = 0;
        let mut still_frames = Vec::with_capacity(planned_stills.len());
        let mut truncated = false;

        if start_frame < end_frame {
            if let Err(error) = self.source.seek(start_frame) {
                log::warn!("Part {}: seek to frame {start_frame} failed: {error}", job.index + 1);
                truncated = true;
            }
        }

        let mut frame_number = start_frame;
        while !truncated && frame_number < end_frame {
            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::debug!("Part {}: end of stream at frame {frame_number}", job.index + 1);
                    truncated = true;
                    break;
                }
                Err(error) => {
                    log::warn!(
                        "Part {}: decoding stopped at frame {frame_number}: {error}",
                        job.index + 1
                    );
                    truncated = true;
                    break;
                }
            };
            decoded_frames += 1;

            let write_failure = sink
                .as_mut()
                .and_then(|active| active.write_frame(&frame).err());
            if let Some(error) = write_failure {
                log::warn!("Part {}: clip encoding failed: {error}", job.index + 1);
                clip_error = Some(error.to_string());
                sink = None;
            }

            if (frame_number - start_frame) % job.frame_step == 0 {
                write_still(&frame, &layout.frame_path(job.index, frame_number), job.quality)?;
                still_frames.push(frame_number);
            }

            frame_number += 1;
        }

        let clip_frames = match sink {
            Some(active) => active.finish().unwrap_or_else(|error| {
                log::warn!("Part {}: closing clip failed: {error}", job.index + 1);
                clip_error = Some(error.to_string());
                0
            }),
            None => 0,
        };

        if still_frames.len() < planned_stills.len() {
            log::warn!(
                "Part {}: wrote {} of {} planned still(s)",
                job.index + 1,
                still_frames.len(),
                planned_stills.len()
            );
        }

        Ok(SegmentReport {
            index: job.index,
            interval: job.interval,
            start_frame,
            end_frame,
            clip_path,
            frames_dir,
            decoded_frames,
            clip_frames,
            still_frames,
            clip_error,
            truncated,
        })
    }
}

/// Write `frame` as a baseline JPEG at `quality` (1–100).
pub fn write_still(frame: &DynamicImage, path: &Path, quality: u8) -> Result<(), SplitError> {
    let rgb = frame.to_rgb8();
    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn still_frames_follow_the_step() {
        let interval = TimeInterval::new(Duration::from_secs(0), Duration::from_secs(2));
        let options = SplitOptions::new().with_frame_step(5);
        let job = SegmentJob::new(interval, 0, &options);
        assert_eq!(job.still_frame_numbers(10.0), vec![0, 5, 10, 15]);
    }

    #[test]
    fn reversed_interval_has_no_stills() {
        let interval = TimeInterval::new(Duration::from_secs(7), Duration::from_secs(5));
        let job = SegmentJob::new(interval, 1, &SplitOptions::new());
        assert!(job.still_frame_numbers(10.0).is_empty());
    }

    #[test]
    fn step_that_skips_past_the_end_keeps_the_first_frame() {
        let interval = TimeInterval::new(Duration::from_secs(5), Duration::from_secs(7));
        let options = SplitOptions::new().with_frame_step(100);
        let job = SegmentJob::new(interval, 0, &options);
        assert_eq!(job.still_frame_numbers(10.0), vec![50]);
    }
}
