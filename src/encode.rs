//! Sub-clip encoding.
//!
//! Each extracted part is written as an independent video file. The
//! extractor talks to encoders through two small traits:
//!
//! - [`ClipBackend`] opens a new sink for a path and a set of
//!   [`ClipSettings`];
//! - [`ClipSink`] accepts frames one at a time and is finished explicitly.
//!
//! [`FfmpegClipBackend`] is the production backend; it opens a
//! [`ClipWriter`] that muxes frames into the container implied by the file
//! extension.
//!
//! # Example
//!
//! ```no_run
//! use vidsplit::{ClipBackend, ClipSettings, ClipSink, FfmpegClipBackend, SplitError, VideoCodec};
//!
//! let settings = ClipSettings::new(640, 360, 25.0, VideoCodec::Mpeg4);
//! let mut sink = FfmpegClipBackend.open("part.mp4".as_ref(), &settings)?;
//! let frame = image::DynamicImage::new_rgb8(640, 360);
//! sink.write_frame(&frame)?;
//! let written = sink.finish()?;
//! assert_eq!(written, 1);
//! # Ok::<(), SplitError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Packet, Rational};
use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::SplitError;

/// Codecs available for sub-clips.
///
/// Identifiers follow the four-character codes users already know from
/// other tools and are matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoCodec {
    /// MPEG-4 Part 2 in an MP4 container (`mp4v`). The default.
    #[default]
    Mpeg4,
    /// H.264 / AVC in an MP4 container (`avc1`, `h264`).
    H264,
    /// MPEG-4 Part 2 in an AVI container (`xvid`).
    Xvid,
    /// Motion JPEG in an AVI container (`mjpg`, `mjpeg`).
    Mjpeg,
}

impl VideoCodec {
    /// All supported codecs, default first.
    pub const ALL: [VideoCodec; 4] = [
        VideoCodec::Mpeg4,
        VideoCodec::H264,
        VideoCodec::Xvid,
        VideoCodec::Mjpeg,
    ];

    /// Parse a codec identifier.
    ///
    /// # Errors
    ///
    /// [`SplitError::UnsupportedCodec`] for an unknown identifier.
    pub fn from_identifier(identifier: &str) -> Result<Self, SplitError> {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "mp4v" | "mpeg4" => Ok(VideoCodec::Mpeg4),
            "avc1" | "h264" | "x264" => Ok(VideoCodec::H264),
            "xvid" => Ok(VideoCodec::Xvid),
            "mjpg" | "mjpeg" => Ok(VideoCodec::Mjpeg),
            _ => Err(SplitError::UnsupportedCodec(identifier.to_string())),
        }
    }

    /// Canonical identifier.
    pub fn identifier(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "mp4v",
            VideoCodec::H264 => "avc1",
            VideoCodec::Xvid => "xvid",
            VideoCodec::Mjpeg => "mjpg",
        }
    }

    /// File extension of the container the codec is written into.
    pub fn extension(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 | VideoCodec::H264 => "mp4",
            VideoCodec::Xvid | VideoCodec::Mjpeg => "avi",
        }
    }

    fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::Mpeg4 | VideoCodec::Xvid => Id::MPEG4,
            VideoCodec::H264 => Id::H264,
            VideoCodec::Mjpeg => Id::MJPEG,
        }
    }

    fn input_pixel_format(self) -> Pixel {
        match self {
            VideoCodec::Mjpeg => Pixel::YUVJ420P,
            _ => Pixel::YUV420P,
        }
    }
}

impl Display for VideoCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.identifier())
    }
}

impl FromStr for VideoCodec {
    type Err = SplitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        VideoCodec::from_identifier(value)
    }
}

/// Geometry, rate, and codec of a sub-clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate; normally the source's.
    pub frames_per_second: f64,
    /// Codec to encode with.
    pub codec: VideoCodec,
    /// Target bitrate in bits per second. `None` keeps the encoder default.
    pub bit_rate: Option<usize>,
}

impl ClipSettings {
    /// Settings with the encoder's default bitrate.
    pub fn new(width: u32, height: u32, frames_per_second: f64, codec: VideoCodec) -> Self {
        Self {
            width,
            height,
            frames_per_second,
            codec,
            bit_rate: None,
        }
    }
}

/// A destination for the frames of one sub-clip.
pub trait ClipSink {
    /// Append one frame to the clip.
    fn write_frame(&mut self, frame: &DynamicImage) -> Result<(), SplitError>;

    /// Flush and close the clip, returning the number of frames written.
    fn finish(self) -> Result<u64, SplitError>;
}

/// Opens a [`ClipSink`] per part.
pub trait ClipBackend {
    /// The sink type produced by this backend.
    type Sink: ClipSink;

    /// Open a new clip at `path`.
    ///
    /// # Errors
    ///
    /// [`SplitError::UnsupportedCodec`] when no encoder is available for the
    /// requested codec, or another error when the container cannot be set up.
    fn open(&mut self, path: &Path, settings: &ClipSettings) -> Result<Self::Sink, SplitError>;
}

/// [`ClipBackend`] that encodes with FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegClipBackend;

impl ClipBackend for FfmpegClipBackend {
    type Sink = ClipWriter;

    fn open(&mut self, path: &Path, settings: &ClipSettings) -> Result<ClipWriter, SplitError> {
        ClipWriter::create(path, settings)
    }
}

/// An open FFmpeg muxer + encoder for one sub-clip.
pub struct ClipWriter {
    output: Output,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    width: u32,
    height: u32,
    frames_written: u64,
    path: PathBuf,
}

impl ClipWriter {
    /// Open the container and encoder and write the file header.
    ///
    /// # Errors
    ///
    /// - [`SplitError::UnsupportedCodec`] if FFmpeg has no usable encoder.
    /// - [`SplitError::VideoEncodeError`] on container or scaler setup failure.
    pub fn create(path: &Path, settings: &ClipSettings) -> Result<Self, SplitError> {
        log::debug!(
            "Opening clip {} (codec={}, {}x{} @ {:.3} fps)",
            path.display(),
            settings.codec,
            settings.width,
            settings.height,
            settings.frames_per_second,
        );
        ffmpeg_next::init()?;

        let codec_id = settings.codec.to_codec_id();
        let target_pixel = settings.codec.input_pixel_format();

        let encoder_codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            SplitError::UnsupportedCodec(format!(
                "{} (no {codec_id:?} encoder in this FFmpeg build)",
                settings.codec
            ))
        })?;

        let mut output = ffmpeg_next::format::output(&path)
            .map_err(|e| SplitError::VideoEncodeError(format!("cannot open output: {e}")))?;

        // Read before add_stream borrows the context.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|e| SplitError::VideoEncodeError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| SplitError::VideoEncodeError(format!("cannot create codec context: {e}")))?
            .encoder()
            .video()
            .map_err(|e| SplitError::VideoEncodeError(format!("cannot create video encoder: {e}")))?;

        let frame_rate = if settings.frames_per_second > 0.0 {
            Rational::from(settings.frames_per_second)
        } else {
            Rational::new(30, 1)
        };
        let encoder_time_base = frame_rate.invert();

        encoder.set_width(settings.width);
        encoder.set_height(settings.height);
        encoder.set_format(target_pixel);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(frame_rate));
        if let Some(bit_rate) = settings.bit_rate {
            encoder.set_bit_rate(bit_rate);
        }

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |= ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder.open_as(encoder_codec).map_err(|e| {
            SplitError::UnsupportedCodec(format!("{} (encoder failed to open: {e})", settings.codec))
        })?;

        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|e| SplitError::VideoEncodeError(format!("cannot write header: {e}")))?;

        // The muxer may change the stream time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| SplitError::VideoEncodeError("output stream vanished".to_string()))?;

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            settings.width,
            settings.height,
            target_pixel,
            settings.width,
            settings.height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| SplitError::VideoEncodeError(format!("cannot create scaler: {e}")))?;

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base,
            stream_time_base,
            width: settings.width,
            height: settings.height,
            frames_written: 0,
            path: path.to_path_buf(),
        })
    }

    /// Path of the clip being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn drain_packets(&mut self) -> Result<(), SplitError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| SplitError::VideoEncodeError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }
}

impl ClipSink for ClipWriter {
    fn write_frame(&mut self, frame: &DynamicImage) -> Result<(), SplitError> {
        let rgb = if frame.width() != self.width || frame.height() != self.height {
            frame
                .resize_exact(self.width, self.height, FilterType::Triangle)
                .to_rgb8()
        } else {
            frame.to_rgb8()
        };

        let mut source = VideoFrame::new(Pixel::RGB24, self.width, self.height);
        crate::utilities::rgb_buffer_to_frame(rgb.as_raw(), &mut source, self.width, self.height);

        let mut converted = VideoFrame::empty();
        self.scaler
            .run(&source, &mut converted)
            .map_err(|e| SplitError::VideoEncodeError(format!("scaling failed: {e}")))?;
        converted.set_pts(Some(self.frames_written as i64));

        self.encoder
            .send_frame(&converted)
            .map_err(|e| SplitError::VideoEncodeError(format!("send_frame failed: {e}")))?;
        self.frames_written += 1;

        self.drain_packets()
    }

    fn finish(mut self) -> Result<u64, SplitError> {
        self.encoder
            .send_eof()
            .map_err(|e| SplitError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        self.drain_packets()?;
        self.output
            .write_trailer()
            .map_err(|e| SplitError::VideoEncodeError(format!("cannot write trailer: {e}")))?;

        log::debug!(
            "Closed clip {} after {} frame(s)",
            self.path.display(),
            self.frames_written
        );
        Ok(self.frames_written)
    }
}
