//! Split configuration.
//!
//! [`SplitOptions`] is the context object of one batch run. It carries the
//! frame step, clip codec, still-image quality, output location, archive
//! settings, and progress callback into the extractor without widening every
//! function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidsplit::{ProgressReporter, SplitOptions, VideoCodec};
//!
//! let reporter = Arc::new(ProgressReporter::new());
//! let options = SplitOptions::new()
//!     .with_frame_step(5)
//!     .with_codec(VideoCodec::H264)
//!     .with_quality(90)
//!     .with_output_root("exports")
//!     .with_progress(reporter.clone());
//! options.validate().unwrap();
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::ArchiveLayout;
use crate::encode::VideoCodec;
use crate::error::SplitError;
use crate::naming::DEFAULT_OUTPUT_ROOT;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default JPEG quality for still frames.
pub const DEFAULT_QUALITY: u8 = 95;

/// Configuration for a split run.
///
/// A default-constructed value reproduces the classic behaviour: every frame
/// saved as a still, MPEG-4 clips, quality 95, outputs under `output/`, and
/// a flat archive per video.
#[derive(Clone)]
pub struct SplitOptions {
    pub(crate) frame_step: u64,
    pub(crate) codec: VideoCodec,
    pub(crate) quality: u8,
    pub(crate) bit_rate: Option<usize>,
    pub(crate) output_root: PathBuf,
    pub(crate) archive: bool,
    pub(crate) archive_layout: ArchiveLayout,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for SplitOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SplitOptions")
            .field("frame_step", &self.frame_step)
            .field("codec", &self.codec)
            .field("quality", &self.quality)
            .field("bit_rate", &self.bit_rate)
            .field("output_root", &self.output_root)
            .field("archive", &self.archive)
            .field("archive_layout", &self.archive_layout)
            .finish_non_exhaustive()
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            frame_step: 1,
            codec: VideoCodec::default(),
            quality: DEFAULT_QUALITY,
            bit_rate: None,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            archive: true,
            archive_layout: ArchiveLayout::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Save every `step`-th decoded frame as a still. Must be at least 1.
    #[must_use]
    pub fn with_frame_step(mut self, step: u64) -> Self {
        self.frame_step = step;
        self
    }

    /// Codec used for sub-clips.
    #[must_use]
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// JPEG quality for stills, 1–100.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Target bitrate for sub-clips in bits per second.
    #[must_use]
    pub fn with_bit_rate(mut self, bit_rate: usize) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Root directory for all outputs. Defaults to `output`.
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Whether to package each video's outputs into a zip. Defaults to `true`.
    #[must_use]
    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    /// How archive entries are named.
    #[must_use]
    pub fn with_archive_layout(mut self, layout: ArchiveLayout) -> Self {
        self.archive_layout = layout;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Frame step.
    pub fn frame_step(&self) -> u64 {
        self.frame_step
    }

    /// Clip codec.
    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    /// Still quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Output root.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Check the numeric parameters.
    ///
    /// # Errors
    ///
    /// - [`SplitError::InvalidStep`] for a step of 0.
    /// - [`SplitError::InvalidQuality`] for a quality outside 1–100.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.frame_step == 0 {
            return Err(SplitError::InvalidStep);
        }
        if !(1..=100).contains(&self.quality) {
            return Err(SplitError::InvalidQuality(self.quality));
        }
        Ok(())
    }
}
