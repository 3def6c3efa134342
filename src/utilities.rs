//! Internal utility functions.
//!
//! Pixel-buffer copying and timestamp/frame-number conversions shared by the
//! decoder and the clip writer.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 plane into a tightly packed buffer, dropping row padding.
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Copy a tightly packed RGB24 buffer into a (possibly padded) frame plane.
pub(crate) fn rgb_buffer_to_frame(rgb: &[u8], video_frame: &mut VideoFrame, width: u32, height: u32) {
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * 3;
    let data = video_frame.data_mut(0);
    for row in 0..(height as usize) {
        let src_start = row * row_len;
        let dst_start = row * stride;
        data[dst_start..dst_start + row_len].copy_from_slice(&rgb[src_start..src_start + row_len]);
    }
}

/// Convert a [`Duration`] to the nearest frame number at `frames_per_second`.
pub fn timestamp_to_frame_number(timestamp: Duration, frames_per_second: f64) -> u64 {
    (timestamp.as_secs_f64() * frames_per_second).round().max(0.0) as u64
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to the nearest frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts_to_seconds(pts, time_base);
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` goes through `avformat_seek_file` with stream index -1, which
/// expects AV_TIME_BASE units rather than the stream time base.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}
