//! Committed revisions
//!
//! A `Revision` is the immutable result of one successful commit: the sealed
//! root, its sequence number, and the commit's timing. Revisions are cheap to
//! clone (the root is shared) and outlive the commit engine's interest in
//! them: a consumer holding a revision keeps the whole tree alive.
//!
//! ## Invariants
//!
//! - Revision numbers start at 0 for the initial tree of a surface
//! - Each successful commit produces exactly the next number
//! - The root of a revision is sealed

use crate::node::SharedRootNode;
use crate::telemetry::CommitTelemetry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number of a revision within one surface
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RevisionNumber(u64);

impl RevisionNumber {
    /// Number of the initial revision
    pub const INITIAL: RevisionNumber = RevisionNumber(0);

    /// Create a revision number
    pub const fn new(n: u64) -> Self {
        RevisionNumber(n)
    }

    /// Get the numeric value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The number that follows this one
    #[inline]
    pub const fn next(&self) -> Self {
        RevisionNumber(self.0 + 1)
    }
}

impl fmt::Display for RevisionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// An immutable, numbered snapshot of a whole tree
#[derive(Debug, Clone)]
pub struct Revision {
    root: SharedRootNode,
    number: RevisionNumber,
    telemetry: CommitTelemetry,
}

impl Revision {
    /// Create a revision
    pub fn new(root: SharedRootNode, number: RevisionNumber, telemetry: CommitTelemetry) -> Self {
        debug_assert!(root.is_sealed(), "revision {} built from unsealed root", number);
        Revision {
            root,
            number,
            telemetry,
        }
    }

    /// Root of the tree
    #[inline]
    pub fn root(&self) -> &SharedRootNode {
        &self.root
    }

    /// Sequence number
    #[inline]
    pub fn number(&self) -> RevisionNumber {
        self.number
    }

    /// Timing of the commit that produced this revision
    #[inline]
    pub fn telemetry(&self) -> &CommitTelemetry {
        &self.telemetry
    }
}
