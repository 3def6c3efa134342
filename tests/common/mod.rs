//! In-memory frame sources and clip backends shared by the integration
//! tests, so extraction can be exercised without FFmpeg fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgb, RgbImage};
use vidsplit::{
    ClipBackend, ClipSettings, ClipSink, FrameSource, ProgressCallback, ProgressInfo, SplitError,
    VideoProperties,
};

pub const WIDTH: u32 = 16;
pub const HEIGHT: u32 = 12;

/// A video of solid-colour frames whose red channel encodes the frame
/// number.
pub struct SyntheticVideo {
    properties: VideoProperties,
    position: u64,
    /// Frame numbers at which `read_frame` fails.
    pub fail_at: Option<u64>,
    /// Every seek target, in order.
    pub seeks: Vec<u64>,
}

impl SyntheticVideo {
    pub fn new(frames_per_second: f64, frame_count: u64) -> Self {
        Self {
            properties: VideoProperties {
                frames_per_second,
                frame_count,
                width: WIDTH,
                height: HEIGHT,
            },
            position: 0,
            fail_at: None,
            seeks: Vec::new(),
        }
    }

    pub fn failing_at(mut self, frame_number: u64) -> Self {
        self.fail_at = Some(frame_number);
        self
    }
}

impl FrameSource for SyntheticVideo {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn seek(&mut self, frame_number: u64) -> Result<(), SplitError> {
        self.seeks.push(frame_number);
        self.position = frame_number;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SplitError> {
        if self.fail_at == Some(self.position) {
            return Err(SplitError::VideoDecodeError(format!(
                "corrupt frame {}",
                self.position
            )));
        }
        if self.position >= self.properties.frame_count {
            return Ok(None);
        }
        let shade = (self.position % 256) as u8;
        self.position += 1;
        Ok(Some(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            WIDTH,
            HEIGHT,
            Rgb([shade, 64, 128]),
        ))))
    }
}

/// A finished (or abandoned) clip as seen by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRecord {
    pub path: PathBuf,
    pub settings: ClipSettings,
    pub frames: u64,
    pub finished: bool,
}

/// Clip backend that writes a small placeholder file per clip and records
/// what it was asked to do.
#[derive(Default)]
pub struct RecordingBackend {
    pub clips: Arc<Mutex<Vec<ClipRecord>>>,
    /// Refuse to open any clip, as if the codec were missing.
    pub refuse_open: bool,
    /// Fail the write of this many-th frame (0-based) in every clip.
    pub fail_write_at: Option<u64>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ClipRecord> {
        self.clips.lock().unwrap().clone()
    }
}

pub struct RecordingSink {
    clips: Arc<Mutex<Vec<ClipRecord>>>,
    slot: usize,
    fail_write_at: Option<u64>,
}

impl ClipSink for RecordingSink {
    fn write_frame(&mut self, frame: &DynamicImage) -> Result<(), SplitError> {
        let mut clips = self.clips.lock().unwrap();
        let record = &mut clips[self.slot];
        if self.fail_write_at == Some(record.frames) {
            return Err(SplitError::VideoEncodeError("disk full".to_string()));
        }
        assert_eq!(frame.width(), record.settings.width);
        record.frames += 1;
        Ok(())
    }

    fn finish(self) -> Result<u64, SplitError> {
        let mut clips = self.clips.lock().unwrap();
        let record = &mut clips[self.slot];
        fs::write(&record.path, format!("frames={}", record.frames))?;
        record.finished = true;
        Ok(record.frames)
    }
}

impl ClipBackend for RecordingBackend {
    type Sink = RecordingSink;

    fn open(&mut self, path: &Path, settings: &ClipSettings) -> Result<RecordingSink, SplitError> {
        if self.refuse_open {
            return Err(SplitError::UnsupportedCodec(format!(
                "{} (encoder failed to open)",
                settings.codec
            )));
        }
        let mut clips = self.clips.lock().unwrap();
        clips.push(ClipRecord {
            path: path.to_path_buf(),
            settings: settings.clone(),
            frames: 0,
            finished: false,
        });
        Ok(RecordingSink {
            clips: self.clips.clone(),
            slot: clips.len() - 1,
            fail_write_at: self.fail_write_at,
        })
    }
}

/// Progress callback that keeps every report.
#[derive(Default)]
pub struct RecordingProgress {
    pub infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    pub fn infos(&self) -> Vec<ProgressInfo> {
        self.infos.lock().unwrap().clone()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

/// Every file under `dir`, relative to it, sorted.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect(dir, dir, &mut files);
    files.sort();
    files
}

fn collect(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            files.push(path.strip_prefix(root).unwrap().to_path_buf());
        }
    }
}
