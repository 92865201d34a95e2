//! Commit timing
//!
//! Each revision carries the timestamps of the commit attempt that produced
//! it: when the attempt started, when layout started and finished, and when
//! the commit finished.

use std::time::{Duration, Instant};

/// Timestamps of one successful commit attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitTelemetry {
    commit_start: Option<Instant>,
    layout_start: Option<Instant>,
    layout_end: Option<Instant>,
    commit_end: Option<Instant>,
}

impl CommitTelemetry {
    /// Create empty telemetry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of the commit attempt
    pub fn will_commit(&mut self) {
        self.commit_start = Some(Instant::now());
    }

    /// Record the start of layout
    pub fn will_layout(&mut self) {
        self.layout_start = Some(Instant::now());
    }

    /// Record the end of layout
    pub fn did_layout(&mut self) {
        self.layout_end = Some(Instant::now());
    }

    /// Record the end of the commit
    pub fn did_commit(&mut self) {
        self.commit_end = Some(Instant::now());
    }

    /// When the attempt started
    pub fn commit_start_time(&self) -> Option<Instant> {
        self.commit_start
    }

    /// When the commit finished
    pub fn commit_end_time(&self) -> Option<Instant> {
        self.commit_end
    }

    /// Time spent in layout
    pub fn layout_duration(&self) -> Option<Duration> {
        Some(self.layout_end?.saturating_duration_since(self.layout_start?))
    }

    /// Time from the start of the attempt to the end of the commit
    pub fn commit_duration(&self) -> Option<Duration> {
        Some(self.commit_end?.saturating_duration_since(self.commit_start?))
    }
}
