//! Timecode parsing.
//!
//! Users enter cut points as free text such as `"00:43-00:52, 01:31-02:09"`.
//! [`parse_timecodes`] scans the string for every `MM:SS-MM:SS` range and
//! returns them as [`TimeInterval`] values in the order they appear. Anything
//! between the ranges (commas, whitespace, notes) is ignored.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use vidsplit::parse_timecodes;
//!
//! let intervals = parse_timecodes("intro 00:00-00:02, outro 00:05-00:07");
//! assert_eq!(intervals.len(), 2);
//! assert_eq!(intervals[1].start, Duration::from_secs(5));
//! assert_eq!(intervals[1].end, Duration::from_secs(7));
//!
//! // No recognisable range is not an error, just nothing to do.
//! assert!(parse_timecodes("hello").is_empty());
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}):(\d{2})-(\d{2}):(\d{2})").expect("range pattern is valid")
});

/// A `(start, end)` pair of offsets into a video.
///
/// `end` is expected to be after `start`, but nothing enforces it: a reversed
/// or empty interval simply produces an empty part when extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    /// Offset of the first frame of the part.
    pub start: Duration,
    /// Offset one past the last frame of the part.
    pub end: Duration,
}

impl TimeInterval {
    /// Create an interval from two offsets.
    pub fn new(start: Duration, end: Duration) -> Self {
        Self { start, end }
    }

    /// Length of the interval, zero when `end <= start`.
    pub fn length(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Convert to a half-open `[start_frame, end_frame)` range at `fps`.
    ///
    /// Both ends are rounded to the nearest frame.
    pub fn frame_bounds(&self, frames_per_second: f64) -> (u64, u64) {
        (
            crate::utilities::timestamp_to_frame_number(self.start, frames_per_second),
            crate::utilities::timestamp_to_frame_number(self.end, frames_per_second),
        )
    }
}

impl Display for TimeInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let start = self.start.as_secs();
        let end = self.end.as_secs();
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            start / 60,
            start % 60,
            end / 60,
            end % 60
        )
    }
}

/// Extract every `MM:SS-MM:SS` range from `input`, in order of appearance.
///
/// Minutes and seconds are read as plain integers, so `00:90` means ninety
/// seconds. Overlapping, unsorted, or out-of-bounds ranges are returned as
/// written; the extractor stops naturally when the video runs out of frames.
pub fn parse_timecodes(input: &str) -> Vec<TimeInterval> {
    RANGE_PATTERN
        .captures_iter(input)
        .map(|captures| {
            let field = |index: usize| -> u64 {
                captures
                    .get(index)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0)
            };
            TimeInterval::new(
                Duration::from_secs(field(1) * 60 + field(2)),
                Duration::from_secs(field(3) * 60 + field(4)),
            )
        })
        .collect()
}
