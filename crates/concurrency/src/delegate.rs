//! Delegate notification
//!
//! The owner of a [`SurfaceTree`] (usually a surface controller) is told
//! synchronously about every successful commit so it can schedule mounting
//! work from the [`RevisionFeed`].

use crate::feed::RevisionFeed;
use crate::tree::SurfaceTree;
use std::sync::Arc;

/// Receives a callback after every successful commit
///
/// # Re-entrancy
///
/// The callback runs on the committing thread after every lock has been
/// released. Calling [`SurfaceTree::commit`] on the same tree from inside the
/// callback is therefore legal and will not deadlock. Nothing bounds such a
/// chain: a delegate that commits unconditionally recurses forever.
///
/// A delegate that needs the tree later should hold a `Weak` reference to
/// it; the tree already holds the delegate.
pub trait TreeDelegate: Send + Sync {
    /// A transaction was committed and its revision pushed to `feed`
    fn tree_did_finish_transaction(&self, tree: &SurfaceTree, feed: &Arc<RevisionFeed>);
}

/// Delegate that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelegate;

impl TreeDelegate for NoopDelegate {
    fn tree_did_finish_transaction(&self, _tree: &SurfaceTree, _feed: &Arc<RevisionFeed>) {}
}
