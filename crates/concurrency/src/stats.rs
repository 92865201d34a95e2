//! Commit statistics
//!
//! Counters use Relaxed ordering: they are observational and synchronize
//! nothing else.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a tree's commit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Successful attempts
    pub committed: u64,
    /// Attempts whose transaction aborted
    pub aborted: u64,
    /// Attempts that lost the race and were retried
    pub conflicts: u64,
}

#[derive(Debug, Default)]
pub(crate) struct CommitCounters {
    committed: AtomicU64,
    aborted: AtomicU64,
    conflicts: AtomicU64,
}

impl CommitCounters {
    pub(crate) fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CommitStats {
        CommitStats {
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }
}
