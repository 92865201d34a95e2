//! Commit transactions
//!
//! A transaction is any `Fn(&SharedRootNode) -> Option<RootNode>`. It maps a
//! snapshot of the current root to a candidate root, or declines by returning
//! `None` (abort). It runs outside every lock, so by the time it returns the
//! snapshot may be stale; the engine then discards the candidate and invokes
//! the transaction again against the fresh root.
//!
//! ## Contract
//!
//! - Pure function of the snapshot: may be invoked once per retry
//! - Must not mutate anything outside the candidate it returns
//! - `None` aborts the commit: no revision, no retry, no error

use canopy_core::Revision;

/// Result of a single optimistic commit attempt
#[derive(Debug, Clone)]
pub enum CommitStatus {
    /// The candidate was swapped in and published as this revision
    Committed(Revision),
    /// Another commit landed first; the attempt can be retried
    Conflict,
    /// The transaction declined to produce a tree
    Aborted,
}

impl CommitStatus {
    /// Check if the attempt committed
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitStatus::Committed(_))
    }

    /// Check if the attempt lost a race
    pub fn is_conflict(&self) -> bool {
        matches!(self, CommitStatus::Conflict)
    }
}

/// Result of a retried commit
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// The transaction was applied on top of the latest root
    Committed(Revision),
    /// The transaction aborted; nothing changed
    Aborted,
}

impl CommitOutcome {
    /// The committed revision, if any
    pub fn revision(&self) -> Option<&Revision> {
        match self {
            CommitOutcome::Committed(revision) => Some(revision),
            CommitOutcome::Aborted => None,
        }
    }

    /// Check if the commit aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self, CommitOutcome::Aborted)
    }
}
