//! Job bookkeeping.
//!
//! A [`JobTable`] remembers which (video, parameters) combinations have
//! already been split during the lifetime of a [`VideoSplitter`](crate::VideoSplitter),
//! so asking for the same work twice is a cheap no-op. Parameters are reduced
//! to a hash of the parsed intervals and every option that affects the
//! output.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::configuration::SplitOptions;
use crate::timecode::TimeInterval;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Registered but not started.
    Pending,
    /// Extraction in progress.
    Running,
    /// Extraction finished and the outputs are on disk.
    Done,
}

/// Identity of a job: which video, with which parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    /// The source video.
    pub video: PathBuf,
    /// Hash of the intervals and output-affecting options.
    pub parameters: u64,
}

impl JobKey {
    /// Build the key for splitting `video` into `intervals` with `options`.
    pub fn new(video: &Path, intervals: &[TimeInterval], options: &SplitOptions) -> Self {
        let mut hasher = DefaultHasher::new();
        intervals.hash(&mut hasher);
        options.frame_step.hash(&mut hasher);
        options.codec.hash(&mut hasher);
        options.quality.hash(&mut hasher);
        options.bit_rate.hash(&mut hasher);
        options.output_root.hash(&mut hasher);
        options.archive.hash(&mut hasher);
        options.archive_layout.hash(&mut hasher);

        Self {
            video: video.to_path_buf(),
            parameters: hasher.finish(),
        }
    }
}

/// State of every job seen in a session.
#[derive(Debug, Default)]
pub struct JobTable {
    states: HashMap<JobKey, JobState>,
}

impl JobTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `None` for a job never registered.
    pub fn state(&self, key: &JobKey) -> Option<JobState> {
        self.states.get(key).copied()
    }

    /// Register a job as pending unless it is already known. Returns its
    /// state after registration.
    pub fn register(&mut self, key: JobKey) -> JobState {
        *self.states.entry(key).or_insert(JobState::Pending)
    }

    /// Move a job to running. Returns `false` (and changes nothing) if the
    /// job is already running or done.
    pub fn begin(&mut self, key: &JobKey) -> bool {
        match self.states.get_mut(key) {
            Some(state) if *state == JobState::Pending => {
                *state = JobState::Running;
                true
            }
            Some(_) => false,
            None => {
                self.states.insert(key.clone(), JobState::Running);
                true
            }
        }
    }

    /// Mark a job as done.
    pub fn complete(&mut self, key: &JobKey) {
        self.states.insert(key.clone(), JobState::Done);
    }

    /// Return a failed job to pending so it can be attempted again.
    pub fn fail(&mut self, key: &JobKey) {
        self.states.insert(key.clone(), JobState::Pending);
    }

    /// Number of jobs in `state`.
    pub fn count(&self, state: JobState) -> usize {
        self.states.values().filter(|&&s| s == state).count()
    }

    /// Iterate over all jobs.
    pub fn iter(&self) -> impl Iterator<Item = (&JobKey, JobState)> {
        self.states.iter().map(|(key, state)| (key, *state))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::encode::VideoCodec;
    use crate::timecode::parse_timecodes;

    fn key(options: &SplitOptions) -> JobKey {
        JobKey::new(Path::new("a.mp4"), &parse_timecodes("00:00-00:02"), options)
    }

    #[test]
    fn key_changes_with_parameters() {
        let base = key(&SplitOptions::new());
        assert_eq!(base, key(&SplitOptions::new()));
        assert_ne!(base, key(&SplitOptions::new().with_frame_step(2)));
        assert_ne!(base, key(&SplitOptions::new().with_codec(VideoCodec::Mjpeg)));
        assert_ne!(
            base,
            JobKey::new(Path::new("a.mp4"), &parse_timecodes("00:00-00:03"), &SplitOptions::new())
        );
    }

    #[test]
    fn lifecycle() {
        let mut table = JobTable::new();
        let job = key(&SplitOptions::new());

        assert_eq!(table.state(&job), None);
        assert_eq!(table.register(job.clone()), JobState::Pending);
        assert!(table.begin(&job));
        assert!(!table.begin(&job));
        assert_eq!(table.state(&job), Some(JobState::Running));

        table.complete(&job);
        assert_eq!(table.register(job.clone()), JobState::Done);
        assert!(!table.begin(&job));
        assert_eq!(table.count(JobState::Done), 1);
    }

    #[test]
    fn failed_job_can_be_retried() {
        let mut table = JobTable::new();
        let job = key(&SplitOptions::new());
        assert!(table.begin(&job));
        table.fail(&job);
        assert_eq!(table.state(&job), Some(JobState::Pending));
        assert!(table.begin(&job));
    }
}
