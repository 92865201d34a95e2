//! Commit engine for one surface's tree
//!
//! `SurfaceTree` owns the single "current root" pointer of a surface and
//! applies transactions to it with optimistic concurrency control:
//!
//! ```text
//! 1. shared lock: snapshot current root, release
//! 2. no lock:     run the transaction (None = abort, done)
//! 3. no lock:     lay out the candidate, collect affected nodes
//! 4. no lock:     seal the candidate
//! 5. exclusive:   if current root != snapshot -> Conflict (retry from 1)
//!                 else swap, update mount flags (under dispatch mutex),
//!                 allocate the next revision number
//! 6. no lock:     emit layout events, push revision to the feed,
//!                 notify the delegate
//! ```
//!
//! Tree construction and layout, the expensive parts, run in parallel on the
//! committing threads. Only the compare-and-swap and the mount-flag pass are
//! serialized.
//!
//! ## Invariants
//!
//! - A transaction is never applied to a stale root
//! - Revision numbers are allocated under the exclusive lock: consecutive,
//!   no gaps, no duplicates
//! - Published roots are sealed
//! - Exceeding `max_commit_attempts` is a programming error and panics

use crate::config::TreeConfig;
use crate::delegate::{NoopDelegate, TreeDelegate};
use crate::feed::RevisionFeed;
use crate::mount::update_mounted_flags;
use crate::stats::{CommitCounters, CommitStats};
use crate::transaction::{CommitOutcome, CommitStatus};
use canopy_core::{
    CommitTelemetry, DispatchMutex, Family, LayoutConstraints, LayoutContext, LayoutEngine, Node,
    NoopEventEmitter, NoopLayoutEngine, Result, Revision, RevisionNumber, RootNode, RootProps,
    SharedNode, SharedRootNode, SurfaceId,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, warn};

struct CommitState {
    root: SharedRootNode,
    revision: RevisionNumber,
}

/// Builder for [`SurfaceTree`]
pub struct SurfaceTreeBuilder {
    surface_id: SurfaceId,
    root_props: RootProps,
    config: TreeConfig,
    layout_engine: Arc<dyn LayoutEngine>,
    delegate: Arc<dyn TreeDelegate>,
    dispatch_mutex: DispatchMutex,
}

impl SurfaceTreeBuilder {
    fn new(surface_id: SurfaceId) -> Self {
        SurfaceTreeBuilder {
            surface_id,
            root_props: RootProps::default(),
            config: TreeConfig::default(),
            layout_engine: Arc::new(NoopLayoutEngine),
            delegate: Arc::new(NoopDelegate),
            dispatch_mutex: DispatchMutex::new(),
        }
    }

    /// Size bounds of the surface
    pub fn layout_constraints(mut self, layout_constraints: LayoutConstraints) -> Self {
        self.root_props.layout_constraints = layout_constraints;
        self
    }

    /// Layout environment of the surface
    pub fn layout_context(mut self, layout_context: LayoutContext) -> Self {
        self.root_props.layout_context = layout_context;
        self
    }

    /// Engine configuration
    pub fn config(mut self, config: TreeConfig) -> Self {
        self.config = config;
        self
    }

    /// Layout collaborator (default: no layout)
    pub fn layout_engine(mut self, layout_engine: Arc<dyn LayoutEngine>) -> Self {
        self.layout_engine = layout_engine;
        self
    }

    /// Commit notification target (default: none)
    pub fn delegate(mut self, delegate: Arc<dyn TreeDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    /// Critical section shared with event dispatch (default: private mutex)
    pub fn dispatch_mutex(mut self, dispatch_mutex: DispatchMutex) -> Self {
        self.dispatch_mutex = dispatch_mutex;
        self
    }

    /// Create the tree with its initial revision 0
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<SurfaceTree> {
        self.config.validate()?;
        Ok(SurfaceTree::from_builder(self))
    }
}

/// The current tree of one surface and the engine that commits to it
pub struct SurfaceTree {
    surface_id: SurfaceId,
    config: TreeConfig,
    state: RwLock<CommitState>,
    layout_engine: Arc<dyn LayoutEngine>,
    delegate: Arc<dyn TreeDelegate>,
    dispatch_mutex: DispatchMutex,
    feed: Arc<RevisionFeed>,
    counters: CommitCounters,
}

impl SurfaceTree {
    /// Create a tree with default configuration and no layout
    pub fn new(
        surface_id: SurfaceId,
        layout_constraints: LayoutConstraints,
        layout_context: LayoutContext,
        delegate: Arc<dyn TreeDelegate>,
    ) -> Self {
        Self::from_builder(
            SurfaceTreeBuilder::new(surface_id)
                .layout_constraints(layout_constraints)
                .layout_context(layout_context)
                .delegate(delegate),
        )
    }

    /// Start building a tree for `surface_id`
    pub fn builder(surface_id: SurfaceId) -> SurfaceTreeBuilder {
        SurfaceTreeBuilder::new(surface_id)
    }

    fn from_builder(builder: SurfaceTreeBuilder) -> Self {
        let surface_id = builder.surface_id;
        let root = RootNode::from_node(
            Node::new(surface_id.as_tag(), Family::new())
                .with_event_emitter(Arc::new(NoopEventEmitter)),
            builder.root_props,
        );
        root.seal_recursive();
        let root = Arc::new(root);

        let initial = Revision::new(
            Arc::clone(&root),
            RevisionNumber::INITIAL,
            CommitTelemetry::new(),
        );
        let feed = Arc::new(RevisionFeed::with_capacity(
            surface_id,
            initial,
            builder.config.feed_capacity,
        ));

        debug!(surface_id = %surface_id, "surface tree created");

        SurfaceTree {
            surface_id,
            config: builder.config,
            state: RwLock::new(CommitState {
                root,
                revision: RevisionNumber::INITIAL,
            }),
            layout_engine: builder.layout_engine,
            delegate: builder.delegate,
            dispatch_mutex: builder.dispatch_mutex,
            feed,
            counters: CommitCounters::default(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Surface this tree belongs to
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Engine configuration
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The committed root
    pub fn current_root(&self) -> SharedRootNode {
        Arc::clone(&self.state.read().root)
    }

    /// Number of the committed revision
    pub fn current_revision_number(&self) -> RevisionNumber {
        self.state.read().revision
    }

    /// The committed root together with its revision number, read atomically
    pub fn current_snapshot(&self) -> (SharedRootNode, RevisionNumber) {
        let state = self.state.read();
        (Arc::clone(&state.root), state.revision)
    }

    /// Feed receiving every committed revision
    pub fn feed(&self) -> &Arc<RevisionFeed> {
        &self.feed
    }

    /// Commit counters
    pub fn stats(&self) -> CommitStats {
        self.counters.snapshot()
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Apply `transaction` to the latest root, retrying on conflict
    ///
    /// The transaction may run several times, each time against a newer
    /// root. Returns once it commits or aborts.
    ///
    /// # Panics
    ///
    /// Panics after `max_commit_attempts` conflicting attempts: a transaction
    /// that can never commit is a bug, and retrying forever would livelock.
    pub fn commit<F>(&self, transaction: F) -> CommitOutcome
    where
        F: Fn(&SharedRootNode) -> Option<RootNode>,
    {
        let mut attempts = 0usize;

        loop {
            attempts += 1;

            match self.try_commit(&transaction) {
                CommitStatus::Committed(revision) => return CommitOutcome::Committed(revision),
                CommitStatus::Aborted => return CommitOutcome::Aborted,
                CommitStatus::Conflict => {}
            }

            if attempts == self.config.conflict_warn_threshold {
                warn!(
                    surface_id = %self.surface_id,
                    attempts,
                    "commit keeps conflicting"
                );
            }

            if attempts >= self.config.max_commit_attempts {
                error!(
                    surface_id = %self.surface_id,
                    attempts,
                    "commit retry budget exhausted"
                );
                panic!(
                    "{}: transaction failed to commit after {} attempts",
                    self.surface_id, attempts
                );
            }
        }
    }

    /// Make one optimistic attempt to apply `transaction`
    pub fn try_commit<F>(&self, transaction: &F) -> CommitStatus
    where
        F: Fn(&SharedRootNode) -> Option<RootNode> + ?Sized,
    {
        let mut telemetry = CommitTelemetry::new();
        telemetry.will_commit();

        let old_root = Arc::clone(&self.state.read().root);

        let Some(mut new_root) = transaction(&old_root) else {
            self.counters.record_abort();
            debug!(surface_id = %self.surface_id, "transaction aborted");
            return CommitStatus::Aborted;
        };

        let mut affected: Vec<SharedNode> = Vec::with_capacity(self.config.affected_nodes_capacity);

        telemetry.will_layout();
        self.layout_engine.layout(&mut new_root, &mut affected);
        telemetry.did_layout();

        new_root.seal_recursive();
        let new_root = Arc::new(new_root);

        let number = {
            let mut state = self.state.write();

            if !Arc::ptr_eq(&state.root, &old_root) {
                drop(state);
                self.counters.record_conflict();
                debug!(surface_id = %self.surface_id, "commit conflict");
                return CommitStatus::Conflict;
            }

            state.root = Arc::clone(&new_root);

            {
                let _dispatch = self.dispatch_mutex.lock();
                update_mounted_flags(old_root.children(), new_root.children());
            }

            state.revision = state.revision.next();
            state.revision
        };

        self.emit_layout_events(&affected);

        telemetry.did_commit();
        self.counters.record_commit();

        let revision = Revision::new(new_root, number, telemetry);
        debug!(
            surface_id = %self.surface_id,
            revision = %number,
            affected = affected.len(),
            "transaction committed"
        );

        if let Err(e) = self.feed.push(revision.clone()) {
            warn!(
                surface_id = %self.surface_id,
                revision = %number,
                error = %e,
                "revision not delivered to feed"
            );
        }

        self.delegate.tree_did_finish_transaction(self, &self.feed);

        CommitStatus::Committed(revision)
    }

    /// Commit a copy of the current root with no children
    pub fn commit_empty_tree(&self) -> CommitOutcome {
        self.commit(|old_root| Some(old_root.clone_with_children(Vec::new())))
    }

    /// Tear the surface down: commit an empty tree, then revoke the feed
    pub fn teardown(&self) {
        self.commit_empty_tree();
        self.feed.revoke();
        debug!(surface_id = %self.surface_id, "surface tree torn down");
    }

    fn emit_layout_events(&self, affected: &[SharedNode]) {
        for node in affected {
            if !node.props().on_layout {
                continue;
            }
            if let Some(emitter) = node.event_emitter() {
                emitter.on_layout(node.layout_metrics());
            }
        }
    }
}

impl Drop for SurfaceTree {
    fn drop(&mut self) {
        self.feed.revoke();
    }
}

impl std::fmt::Debug for SurfaceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceTree")
            .field("surface_id", &self.surface_id)
            .field("revision", &self.current_revision_number())
            .field("config", &self.config)
            .finish()
    }
}
