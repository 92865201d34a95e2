//! Concurrent/Multi-threaded Tests for canopy-concurrency
//!
//! These tests verify correct behavior under actual concurrent execution.
//! They use multiple threads to exercise:
//!
//! 1. **Termination** - N committing threads all finish
//! 2. **Revision Monotonicity** - Numbers are consecutive, gap-free, unique
//! 3. **Atomicity** - Readers only ever see sealed, consistent trees
//! 4. **Feed Ordering** - Consumers observe revisions strictly in order
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --test concurrent_tests
//! cargo test --test concurrent_tests -- --nocapture --test-threads=1  # sequential for debugging
//! ```

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use canopy_concurrency::{RevisionFeed, SurfaceTree, TreeConfig, TreeDelegate};
use canopy_core::{
    Family, LayoutConstraints, LayoutContext, Node, NodeState, Props, RevisionNumber, RootNode,
    SharedNode, SharedRootNode, StackLayoutEngine, SurfaceId, Tag,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_tree() -> Arc<SurfaceTree> {
    Arc::new(
        SurfaceTree::builder(SurfaceId::new(1))
            .layout_constraints(LayoutConstraints::exact(320.0, 640.0))
            .layout_context(LayoutContext::default())
            .build()
            .unwrap(),
    )
}

fn leaf(tag: u64) -> SharedNode {
    Node::new(Tag::new(tag), Family::new())
        .with_props(Props::new().with_height(1.0))
        .into_shared()
}

fn append_transaction(child: SharedNode) -> impl Fn(&SharedRootNode) -> Option<RootNode> {
    move |old_root| {
        let mut root = old_root.clone_unsealed();
        root.append_child(Arc::clone(&child)).ok()?;
        Some(root)
    }
}

fn child_tags(root: &RootNode) -> Vec<u64> {
    root.children().iter().map(|c| c.tag().as_u64()).collect()
}

#[derive(Debug, Default)]
struct CountingState {
    commits: AtomicUsize,
}

impl NodeState for CountingState {
    fn commit(&self, _node: &Node) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// SECTION 1: Termination and Monotonicity
// ============================================================================

mod monotonicity {
    use super::*;

    /// N threads each commit one child; all finish with N consecutive numbers
    #[test]
    fn test_concurrent_commits_all_complete() {
        let tree = create_tree();
        let num_threads = 16;
        let barrier = Arc::new(Barrier::new(num_threads));
        let numbers = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..num_threads)
            .map(|i| {
                let tree = Arc::clone(&tree);
                let barrier = Arc::clone(&barrier);
                let numbers = Arc::clone(&numbers);

                thread::spawn(move || {
                    let child = leaf(100 + i as u64);
                    barrier.wait();

                    let outcome = tree.commit(append_transaction(child));
                    let revision = outcome.revision().expect("append never aborts");
                    numbers.lock().push(revision.number().as_u64());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut numbers = numbers.lock().clone();
        numbers.sort_unstable();
        let expected: Vec<u64> = (1..=num_threads as u64).collect();
        assert_eq!(numbers, expected, "revision numbers must be consecutive");

        assert_eq!(
            tree.current_revision_number(),
            RevisionNumber::new(num_threads as u64)
        );

        // Every child landed exactly once, none lost to a stale root
        let tags: HashSet<u64> = child_tags(&tree.current_root()).into_iter().collect();
        let expected_tags: HashSet<u64> = (0..num_threads as u64).map(|i| 100 + i).collect();
        assert_eq!(tags, expected_tags);
        assert_eq!(tree.current_root().children().len(), num_threads);

        let stats = tree.stats();
        assert_eq!(stats.committed, num_threads as u64);
        assert_eq!(stats.aborted, 0);
    }

    /// Several commits per thread, with layout running off-lock
    #[test]
    fn test_repeated_commits_with_layout() {
        let tree = Arc::new(
            SurfaceTree::builder(SurfaceId::new(2))
                .layout_constraints(LayoutConstraints::exact(100.0, 1000.0))
                .layout_engine(Arc::new(StackLayoutEngine))
                .build()
                .unwrap(),
        );
        let num_threads = 8;
        let commits_per_thread = 25;

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..commits_per_thread {
                        let tag = (t * 1000 + i) as u64;
                        tree.commit(append_transaction(leaf(tag)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let total = num_threads * commits_per_thread;
        assert_eq!(
            tree.current_revision_number(),
            RevisionNumber::new(total as u64)
        );

        // Layout saw the final list: children are stacked without gaps
        let root = tree.current_root();
        for (index, child) in root.children().iter().enumerate() {
            assert_eq!(child.layout_metrics().frame.origin.y, index as f32);
            assert!(child.is_mounted());
        }
    }

    /// Attached state is committed exactly once per mount under contention
    #[test]
    fn test_state_committed_once_per_node() {
        let tree = create_tree();
        let num_threads = 8;
        let barrier = Arc::new(Barrier::new(num_threads));
        let states: Vec<Arc<CountingState>> =
            (0..num_threads).map(|_| Arc::new(CountingState::default())).collect();

        let handles: Vec<_> = states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let tree = Arc::clone(&tree);
                let barrier = Arc::clone(&barrier);
                let state = Arc::clone(state);
                thread::spawn(move || {
                    let child = Node::new(Tag::new(i as u64), Family::new())
                        .with_state(state)
                        .into_shared();
                    barrier.wait();
                    tree.commit(append_transaction(child));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for state in &states {
            assert_eq!(state.commits.load(Ordering::SeqCst), 1);
        }
    }
}

// ============================================================================
// SECTION 2: Atomicity
// ============================================================================

mod atomicity {
    use super::*;

    /// Readers racing with writers always see sealed, consistent snapshots
    #[test]
    fn test_readers_see_sealed_trees() {
        let tree = create_tree();
        let stop = Arc::new(AtomicBool::new(false));
        let num_writers = 4;
        let commits_per_writer = 50;

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let tree = Arc::clone(&tree);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    let mut last = RevisionNumber::INITIAL;
                    let mut observed = 0usize;
                    while !stop.load(Ordering::SeqCst) {
                        let (root, number) = tree.current_snapshot();
                        assert!(root.is_sealed());
                        root.traverse(&mut |node| assert!(node.is_sealed()));
                        // Each commit appends one child, so the count is the number
                        assert_eq!(root.children().len() as u64, number.as_u64());
                        assert!(number >= last, "current revision went backwards");
                        last = number;
                        observed += 1;
                    }
                    observed
                })
            })
            .collect();

        let writers: Vec<_> = (0..num_writers)
            .map(|w| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..commits_per_writer {
                        tree.commit(append_transaction(leaf((w * 1000 + i) as u64)));
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        stop.store(true, Ordering::SeqCst);
        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }

        assert_eq!(
            tree.current_revision_number(),
            RevisionNumber::new((num_writers * commits_per_writer) as u64)
        );
    }

    /// Aborting transactions under contention never produce revisions
    #[test]
    fn test_aborts_interleaved_with_commits() {
        let tree = create_tree();
        let num_threads = 8;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|i| {
                let tree = Arc::clone(&tree);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        tree.commit(append_transaction(leaf(i as u64)));
                    } else {
                        assert!(tree.commit(|_| None).is_aborted());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = tree.stats();
        assert_eq!(stats.committed, (num_threads / 2) as u64);
        assert_eq!(stats.aborted, (num_threads / 2) as u64);
        assert_eq!(
            tree.current_revision_number(),
            RevisionNumber::new((num_threads / 2) as u64)
        );
    }
}

// ============================================================================
// SECTION 3: Feed Ordering
// ============================================================================

mod feed_ordering {
    use super::*;

    /// A consumer draining concurrently sees every revision, in order
    #[test]
    fn test_consumer_sees_gap_free_sequence() {
        let total = 200usize;
        // Room for every revision, so a slow consumer still misses none
        let tree = Arc::new(
            SurfaceTree::builder(SurfaceId::new(4))
                .config(TreeConfig::new().with_feed_capacity(total))
                .build()
                .unwrap(),
        );
        let feed = Arc::clone(tree.feed());
        let num_threads = 4;

        let consumer = {
            let feed = Arc::clone(&feed);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while seen.len() < total {
                    if feed.wait_for_revision(Duration::from_secs(10)) {
                        seen.extend(feed.drain().into_iter().map(|r| r.number().as_u64()));
                    } else {
                        break;
                    }
                }
                seen
            })
        };

        let producers: Vec<_> = (0..num_threads)
            .map(|t| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..total / num_threads {
                        tree.commit(append_transaction(leaf((t * 1000 + i) as u64)));
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }

        let seen = consumer.join().unwrap();
        let expected: Vec<u64> = (1..=total as u64).collect();
        assert_eq!(seen, expected);
    }

    /// The delegate is called once per commit, and the feed already holds
    /// the committed revision when it is
    #[test]
    fn test_delegate_called_once_per_commit() {
        struct Counter {
            calls: AtomicUsize,
        }

        impl TreeDelegate for Counter {
            fn tree_did_finish_transaction(&self, _tree: &SurfaceTree, feed: &Arc<RevisionFeed>) {
                assert!(feed.current_revision().is_some());
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        let delegate = Arc::new(Counter {
            calls: AtomicUsize::new(0),
        });
        let tree = Arc::new(
            SurfaceTree::builder(SurfaceId::new(3))
                .delegate(delegate.clone())
                .config(TreeConfig::new().with_max_commit_attempts(10_000))
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..10 {
                        tree.commit(append_transaction(leaf(t * 100 + i)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(delegate.calls.load(Ordering::SeqCst), 80);
    }

    /// With nobody draining, concurrent commits keep only `feed_capacity`
    /// revisions alive, and the newest ones survive
    #[test]
    fn test_undrained_feed_stays_bounded() {
        let capacity = 8usize;
        let tree = Arc::new(
            SurfaceTree::builder(SurfaceId::new(5))
                .config(TreeConfig::new().with_feed_capacity(capacity))
                .build()
                .unwrap(),
        );
        let num_threads = 4;
        let commits_per_thread = 50;

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    for i in 0..commits_per_thread {
                        tree.commit(append_transaction(leaf((t * 1000 + i) as u64)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let total = (num_threads * commits_per_thread) as u64;
        let feed = tree.feed();
        assert_eq!(feed.dropped_count(), total - capacity as u64);
        assert_eq!(feed.parked_len(), 0);

        let kept: Vec<u64> = feed.drain().iter().map(|r| r.number().as_u64()).collect();
        let expected: Vec<u64> = (total - capacity as u64 + 1..=total).collect();
        assert_eq!(kept, expected);
    }

    /// Teardown wakes a waiting consumer and stops delivery
    #[test]
    fn test_teardown_wakes_consumer() {
        let tree = create_tree();
        let feed = Arc::clone(tree.feed());
        tree.commit(append_transaction(leaf(1)));
        feed.drain();

        let waiter = {
            let feed = Arc::clone(&feed);
            thread::spawn(move || {
                let started = std::time::Instant::now();
                // Woken either by the empty-tree revision or by the revoke
                feed.wait_for_revision(Duration::from_secs(10));
                started.elapsed()
            })
        };

        thread::sleep(Duration::from_millis(20));
        tree.teardown();

        assert!(waiter.join().unwrap() < Duration::from_secs(10));
        assert!(feed.is_revoked());
        assert!(feed.drain().is_empty());
        assert!(tree.current_root().children().is_empty());
    }
}
