//! Decoded frame sources.
//!
//! The extractor reads frames through [`FrameSource`]: report the stream
//! [`VideoProperties`], seek to a frame number, then pull frames one at a time
//! in decode order. [`VideoFile`] is the FFmpeg implementation.
//!
//! Seeking lands on the nearest keyframe at or before the target and then
//! decodes forward, discarding frames that come before it. How close that
//! gets depends on the container's timestamps; exact-frame seeking is not
//! guaranteed for every format.
//!
//! # Example
//!
//! ```no_run
//! use vidsplit::{FrameSource, SplitError, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! println!("{:?}", video.properties());
//! video.seek(250)?;
//! if let Some(frame) = video.read_frame()? {
//!     frame.save("frame_250.png")?;
//! }
//! # Ok::<(), SplitError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::SplitError;
use crate::metadata::VideoProperties;

/// A seekable, sequential source of decoded frames.
pub trait FrameSource {
    /// Properties of the video stream.
    fn properties(&self) -> VideoProperties;

    /// Position the source so the next [`read_frame`](FrameSource::read_frame)
    /// returns `frame_number` (or the closest frame the decoder can reach).
    fn seek(&mut self, frame_number: u64) -> Result<(), SplitError>;

    /// Decode the next frame in sequence.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SplitError>;
}

/// An opened video file with a live decoder.
///
/// The demuxer and decoder are held for the lifetime of the value and
/// released on drop.
pub struct VideoFile {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    properties: VideoProperties,
    path: PathBuf,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    /// Frames numbered below this are dropped after a seek.
    skip_before: Option<u64>,
    eof_sent: bool,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("properties", &self.properties)
            .field("stream_index", &self.stream_index)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file and prepare its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// - [`SplitError::FileOpen`] if FFmpeg cannot open or parse the file.
    /// - [`SplitError::NoVideoStream`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SplitError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init().map_err(|error| SplitError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| SplitError::FileOpen {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(SplitError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| SplitError::FileOpen {
                path: path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() > 0 {
            f64::from(frame_rate)
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                f64::from(rate)
            } else {
                0.0
            }
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if input.duration() > 0 && frames_per_second > 0.0 {
            let seconds = input.duration() as f64 / 1_000_000.0;
            (seconds * frames_per_second) as u64
        } else {
            0
        };

        let properties = VideoProperties {
            frames_per_second,
            frame_count,
            width: decoder.width(),
            height: decoder.height(),
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Video stream {stream_index}: {}x{} @ {:.3} fps, {} frames",
            properties.width,
            properties.height,
            properties.frames_per_second,
            properties.frame_count,
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            properties,
            path,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            skip_before: None,
            eof_sent: false,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current_frame_number(&self) -> Option<u64> {
        self.decoded_frame
            .timestamp()
            .or_else(|| self.decoded_frame.pts())
            .map(|pts| {
                crate::utilities::pts_to_frame_number(
                    pts,
                    self.time_base,
                    self.properties.frames_per_second,
                )
            })
    }

    fn convert_current_frame(&mut self) -> Result<DynamicImage, SplitError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let width = self.properties.width;
        let height = self.properties.height;
        let buffer = crate::utilities::frame_to_rgb_buffer(&self.rgb_frame, width, height);
        let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            SplitError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl FrameSource for VideoFile {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn seek(&mut self, frame_number: u64) -> Result<(), SplitError> {
        let timestamp = crate::utilities::frame_number_to_seek_timestamp(
            frame_number,
            self.properties.frames_per_second,
        );
        log::debug!("Seeking to frame {frame_number} (ts={timestamp}us)");

        self.input.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.skip_before = Some(frame_number);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SplitError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                if let (Some(target), Some(current)) = (self.skip_before, self.current_frame_number()) {
                    if current < target {
                        continue;
                    }
                }
                self.skip_before = None;
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            SplitError::VideoDecodeError(format!(
                                "{}: {error}",
                                self.path.display()
                            ))
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    log::debug!("Skipping unreadable packet: {error}");
                }
            }
        }
    }
}
