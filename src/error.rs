//! Error types for the `vidsplit` crate.
//!
//! This module defines [`SplitError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry enough context (paths,
//! codec names, upstream messages) to diagnose a failed run without extra
//! logging at the call site.
//!
//! Not every failure is an error: a timecode string without any recognisable
//! range yields an empty interval list, and a decode failure in the middle of
//! an interval only truncates that interval's output.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `vidsplit` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SplitError {
    /// A supplied video or folder path does not exist or has the wrong type.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// The video file could not be opened by the demuxer.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path passed to [`VideoFile::open`](crate::VideoFile::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The codec identifier is unknown, or the platform has no encoder for it.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// The frame step was zero.
    #[error("Frame step must be at least 1")]
    InvalidStep,

    /// Still-image quality outside of 1–100.
    #[error("Quality {0} is out of range (expected 1-100)")]
    InvalidQuality(u8),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The sub-clip encoder failed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while writing a still frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The output archive could not be written.
    #[error("Archive error: {0}")]
    ArchiveError(#[from] ZipError),
}

impl From<FfmpegError> for SplitError {
    fn from(error: FfmpegError) -> Self {
        SplitError::FfmpegError(error.to_string())
    }
}

impl SplitError {
    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SplitError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
