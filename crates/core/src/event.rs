//! Event collaborator and the dispatch critical section
//!
//! Event dispatch inspects whether nodes are mounted, so the mount-flag pass
//! must not interleave with it. Both sides take the same [`DispatchMutex`].
//! The mutex is injected into the commit engine rather than being a process
//! global, so each tree (or each test) can decide which dispatcher it
//! serializes against.

use crate::layout::LayoutMetrics;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// Receives events for one node
pub trait EventEmitter: Send + Sync + fmt::Debug {
    /// The node's layout changed in a committed revision
    fn on_layout(&self, metrics: &LayoutMetrics);
}

/// Event emitter that drops every event
///
/// Used by the initial root of every surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn on_layout(&self, _metrics: &LayoutMetrics) {}
}

/// Critical section shared between mount-flag updates and event dispatch
///
/// Cloning yields a handle to the same mutex.
#[derive(Clone, Default)]
pub struct DispatchMutex(Arc<Mutex<()>>);

impl DispatchMutex {
    /// Create a new, independent critical section
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock()
    }

    /// Check whether some thread is inside the critical section
    pub fn is_locked(&self) -> bool {
        self.0.is_locked()
    }

    /// Check whether two handles refer to the same critical section
    pub fn same_as(&self, other: &DispatchMutex) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DispatchMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchMutex")
            .field("locked", &self.is_locked())
            .finish()
    }
}
