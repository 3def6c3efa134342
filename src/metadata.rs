//! Video stream properties.
//!
//! [`VideoProperties`] is read once when a [`VideoFile`](crate::VideoFile) is
//! opened and drives every frame-number computation of a split run.

use std::time::Duration;

/// Attributes of the decodable video stream of a source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct VideoProperties {
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames, from the container or estimated from duration.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl VideoProperties {
    /// Duration implied by frame count and frame rate.
    pub fn duration(&self) -> Duration {
        if self.frames_per_second > 0.0 {
            Duration::from_secs_f64(self.frame_count as f64 / self.frames_per_second)
        } else {
            Duration::ZERO
        }
    }
}
