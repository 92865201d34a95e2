//! Revision feed
//!
//! Ordered hand-off of committed revisions from the commit engine to the
//! external mounting logic.
//!
//! The engine pushes each revision after it has released the commit lock, so
//! two concurrent commits can reach `push` in either order. The feed parks a
//! revision that arrives ahead of its predecessor and releases it once the gap
//! is filled: consumers always observe revisions in strictly increasing,
//! gap-free order.
//!
//! ## Consumption
//!
//! - `current_revision()`: latest revision delivered to the feed
//! - `pull()`: coalescing pull (base revision + latest revision)
//! - `drain()`: every pending revision in order
//! - `wait_for_revision()`: block until something is pending
//!
//! After `revoke()` the feed is dead: reads return nothing and pushes fail.
//!
//! ## Capacity
//!
//! Every pending revision keeps its whole tree alive, so the pending queue is
//! bounded. Once it holds `capacity` revisions the oldest one is dropped for
//! each new delivery. `pull()` is unaffected; `drain()` skips what was
//! dropped. `current_revision()` always reflects the latest delivery.

use canopy_core::{Revision, RevisionNumber, SurfaceId};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Pending revisions a feed keeps unless configured otherwise
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// Parked revisions after which the feed reports a stall
const PARKED_WARN_THRESHOLD: usize = 16;

/// Errors returned by [`RevisionFeed::push`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The feed was revoked; the surface is gone
    #[error("revision feed for {0} has been revoked")]
    Revoked(SurfaceId),

    /// The revision number was already delivered or parked
    #[error("revision {pushed} is not newer than {last}")]
    Stale {
        /// Latest delivered revision number
        last: RevisionNumber,
        /// Rejected revision number
        pushed: RevisionNumber,
    },
}

/// Result of a coalescing pull
#[derive(Debug, Clone)]
pub struct RevisionPull {
    /// Revision the consumer saw last (the one it has mounted)
    pub base: Revision,
    /// Latest revision to move to
    pub revision: Revision,
}

#[derive(Debug)]
struct FeedState {
    /// Last revision handed out through `pull` or `drain`
    base: Revision,
    /// Latest delivered revision
    last: Revision,
    /// Delivered but not yet consumed, in order
    pending: VecDeque<Revision>,
    /// Arrived ahead of a missing predecessor
    parked: BTreeMap<RevisionNumber, Revision>,
    /// Delivered revisions dropped unconsumed because of the capacity
    dropped: u64,
    revoked: bool,
}

/// Ordered channel of committed revisions for one surface
#[derive(Debug)]
pub struct RevisionFeed {
    surface_id: SurfaceId,
    capacity: usize,
    state: Mutex<FeedState>,
    signal: Condvar,
}

impl RevisionFeed {
    /// Create a feed seeded with the surface's initial revision
    pub fn new(surface_id: SurfaceId, initial: Revision) -> Self {
        Self::with_capacity(surface_id, initial, DEFAULT_FEED_CAPACITY)
    }

    /// Create a feed keeping at most `capacity` pending revisions
    ///
    /// A `capacity` of 0 is treated as 1.
    pub fn with_capacity(surface_id: SurfaceId, initial: Revision, capacity: usize) -> Self {
        RevisionFeed {
            surface_id,
            capacity: capacity.max(1),
            state: Mutex::new(FeedState {
                base: initial.clone(),
                last: initial,
                pending: VecDeque::new(),
                parked: BTreeMap::new(),
                dropped: 0,
                revoked: false,
            }),
            signal: Condvar::new(),
        }
    }

    /// Surface the feed belongs to
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Maximum number of pending revisions
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Revisions dropped unconsumed because the pending queue was full
    pub fn dropped_count(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Revisions waiting for a predecessor that has not been pushed yet
    pub fn parked_len(&self) -> usize {
        self.state.lock().parked.len()
    }

    /// Latest delivered revision, or `None` once revoked
    pub fn current_revision(&self) -> Option<Revision> {
        let state = self.state.lock();
        if state.revoked {
            return None;
        }
        Some(state.last.clone())
    }

    /// Deliver a committed revision
    ///
    /// Called by the commit engine only. A revision whose predecessor has not
    /// arrived yet is held back until it does.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Revoked`] after `revoke()`
    /// - [`FeedError::Stale`] if the number was already delivered or parked
    pub fn push(&self, revision: Revision) -> Result<(), FeedError> {
        let mut state = self.state.lock();
        if state.revoked {
            return Err(FeedError::Revoked(self.surface_id));
        }

        let last = state.last.number();
        let pushed = revision.number();
        if pushed <= last || state.parked.contains_key(&pushed) {
            return Err(FeedError::Stale { last, pushed });
        }

        state.parked.insert(pushed, revision);

        let mut delivered = false;
        loop {
            let next = state.last.number().next();
            let Some(revision) = state.parked.remove(&next) else {
                break;
            };
            state.last = revision.clone();
            state.pending.push_back(revision);
            if state.pending.len() > self.capacity {
                state.pending.pop_front();
                state.dropped += 1;
                debug!(
                    surface_id = %self.surface_id,
                    capacity = self.capacity,
                    "feed full, dropped oldest pending revision"
                );
            }
            delivered = true;
        }

        if state.parked.len() == PARKED_WARN_THRESHOLD {
            warn!(
                surface_id = %self.surface_id,
                waiting_for = %state.last.number().next(),
                parked = state.parked.len(),
                "revision feed stalled on a missing revision"
            );
        }

        if delivered {
            self.signal.notify_all();
        }
        Ok(())
    }

    /// Take the latest revision together with the one pulled before it
    ///
    /// Intermediate pending revisions are skipped. Returns `None` when
    /// nothing new was delivered since the last pull, or once revoked.
    pub fn pull(&self) -> Option<RevisionPull> {
        let mut state = self.state.lock();
        if state.revoked || state.pending.is_empty() {
            return None;
        }

        state.pending.clear();
        let revision = state.last.clone();
        let base = std::mem::replace(&mut state.base, revision.clone());
        Some(RevisionPull { base, revision })
    }

    /// Take every pending revision, oldest first
    ///
    /// Revisions dropped because the queue was full are not returned.
    pub fn drain(&self) -> Vec<Revision> {
        let mut state = self.state.lock();
        if state.revoked {
            return Vec::new();
        }

        let drained: Vec<Revision> = state.pending.drain(..).collect();
        if let Some(latest) = drained.last() {
            state.base = latest.clone();
        }
        drained
    }

    /// Block until a revision is pending, the feed is revoked, or `timeout`
    /// elapses
    ///
    /// Returns `true` if a revision is pending.
    pub fn wait_for_revision(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.pending.is_empty() && !state.revoked {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        !state.revoked && !state.pending.is_empty()
    }

    /// Mark the surface as gone
    ///
    /// Drops pending revisions and wakes every waiter. Idempotent.
    pub fn revoke(&self) {
        let mut state = self.state.lock();
        state.revoked = true;
        state.pending.clear();
        state.parked.clear();
        self.signal.notify_all();
    }

    /// Check whether the feed was revoked
    pub fn is_revoked(&self) -> bool {
        self.state.lock().revoked
    }
}
