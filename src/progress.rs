//! Progress reporting.
//!
//! A split run reports once per finished part. Each report carries the
//! completed and total part counts, an integer percentage, and a short status
//! line. The core never renders anything itself: callers implement
//! [`ProgressCallback`] (the CLI drives an `indicatif` bar) or use the
//! passive [`ProgressReporter`], which simply remembers the latest values.
//!
//! Guarantees for a run with `N >= 1` parts: exactly `N` reports,
//! `completed_parts` goes `1, 2, ..., N`, the percentage never decreases,
//! and the last report is at 100% with [`COMPLETE_STATUS`] appended to its
//! part count. A run with no parts reports nothing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidsplit::{ProgressCallback, ProgressInfo, SplitOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:>3}%] {}", info.percent, info.status);
//!     }
//! }
//!
//! let options = SplitOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Appended to the status text of the final report of a run.
pub const COMPLETE_STATUS: &str = "Processing complete!";

/// A snapshot of split progress, delivered after each finished part.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    /// Parts finished so far (1-based in reports).
    pub completed_parts: usize,
    /// Total parts in this run.
    pub total_parts: usize,
    /// `floor(completed_parts / total_parts * 100)`.
    pub percent: u8,
    /// Human-readable status line.
    pub status: String,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on the average time per part so far.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress updates during a split run.
///
/// Callbacks observe but cannot halt the run.
pub trait ProgressCallback: Send + Sync {
    /// Called after each finished part.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Completed/total part counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    /// Parts finished so far.
    pub completed_parts: usize,
    /// Total parts in the run.
    pub total_parts: usize,
}

impl ProgressState {
    /// Integer percentage, rounded down. Zero when there are no parts.
    pub fn percent(&self) -> u8 {
        if self.total_parts == 0 {
            return 0;
        }
        let completed = self.completed_parts.min(self.total_parts);
        (completed * 100 / self.total_parts) as u8
    }

    /// Whether every part has been finished.
    pub fn is_complete(&self) -> bool {
        self.total_parts > 0 && self.completed_parts >= self.total_parts
    }
}

/// Passive progress sink that keeps only the latest report.
///
/// # Example
///
/// ```
/// use vidsplit::{ProgressCallback, ProgressInfo, ProgressReporter};
///
/// let reporter = ProgressReporter::new();
/// assert_eq!(reporter.percent(), 0);
/// assert!(reporter.latest().is_none());
/// ```
#[derive(Debug, Default)]
pub struct ProgressReporter {
    inner: Mutex<ReporterState>,
}

#[derive(Debug, Default)]
struct ReporterState {
    latest: Option<ProgressInfo>,
    events: usize,
}

impl ProgressReporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest report, if any.
    pub fn latest(&self) -> Option<ProgressInfo> {
        self.lock().latest.clone()
    }

    /// Latest percentage, zero before the first report.
    pub fn percent(&self) -> u8 {
        self.lock().latest.as_ref().map_or(0, |info| info.percent)
    }

    /// Latest status line, empty before the first report.
    pub fn status(&self) -> String {
        self.lock()
            .latest
            .as_ref()
            .map(|info| info.status.clone())
            .unwrap_or_default()
    }

    /// Number of reports received.
    pub fn event_count(&self) -> usize {
        self.lock().events
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReporterState> {
        // Poisoned only if another observer panicked; the state is still valid.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressCallback for ProgressReporter {
    fn on_progress(&self, info: &ProgressInfo) {
        let mut state = self.lock();
        state.latest = Some(info.clone());
        state.events += 1;
    }
}

/// Internal helper that owns the [`ProgressState`] of a run and emits
/// callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    state: ProgressState,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total_parts: usize) -> Self {
        Self {
            callback,
            state: ProgressState {
                completed_parts: 0,
                total_parts,
            },
            start_time: Instant::now(),
        }
    }

    pub(crate) fn state(&self) -> ProgressState {
        self.state
    }

    /// Record one finished part and report it.
    pub(crate) fn advance(&mut self) {
        self.state.completed_parts += 1;

        let mut status = format!(
            "Processing part {} of {}...",
            self.state.completed_parts, self.state.total_parts
        );
        if self.state.is_complete() {
            status.push(' ');
            status.push_str(COMPLETE_STATUS);
        }

        let elapsed = self.start_time.elapsed();
        let remaining_parts = self
            .state
            .total_parts
            .saturating_sub(self.state.completed_parts) as u32;
        let estimated_remaining = (self.state.completed_parts > 0)
            .then(|| elapsed / self.state.completed_parts as u32 * remaining_parts);

        let info = ProgressInfo {
            completed_parts: self.state.completed_parts,
            total_parts: self.state.total_parts,
            percent: self.state.percent(),
            status,
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}
