//! [`WatchState`]: the last observed modification time of a watched file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Result of a single successful poll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// First successful observation; recorded, not a change.
    Baseline,
    /// Same modification time as last observed.
    Unchanged,
    /// Modification time differs from the recorded one.
    Changed,
}

/// Polling state for one file.
#[derive(Debug, Clone)]
pub struct WatchState {
    path: PathBuf,
    interval: Duration,
    last_modified: Option<SystemTime>,
}

impl WatchState {
    pub fn new(path: PathBuf, interval: Duration) -> Self {
        Self {
            path,
            interval,
            last_modified: None,
        }
    }

    /// Stat the file once and compare against the recorded timestamp.
    ///
    /// On error the recorded timestamp is left untouched.
    pub fn poll(&mut self) -> io::Result<PollOutcome> {
        let modified = fs::metadata(&self.path)?.modified()?;

        Ok(match self.last_modified.replace(modified) {
            None => PollOutcome::Baseline,
            Some(previous) if previous == modified => PollOutcome::Unchanged,
            Some(_) => PollOutcome::Changed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }
}
