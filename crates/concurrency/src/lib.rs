//! Concurrency layer for canopy
//!
//! This crate implements optimistic concurrency control over a surface's
//! immutable tree:
//! - SurfaceTree: the commit engine owning the current root
//! - Mount-flag propagation after every swap
//! - RevisionFeed: ordered hand-off of committed revisions
//! - TreeDelegate: synchronous post-commit notification
//! - TreeConfig: engine configuration (`canopy.toml`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod delegate;
pub mod feed;
pub mod mount;
pub mod stats;
pub mod transaction;
pub mod tree;

pub use config::{TreeConfig, CONFIG_FILE_NAME, MAX_AFFECTED_NODES_CAPACITY};
pub use delegate::{NoopDelegate, TreeDelegate};
pub use feed::{FeedError, RevisionFeed, RevisionPull, DEFAULT_FEED_CAPACITY};
pub use mount::update_mounted_flags;
pub use stats::CommitStats;
pub use transaction::{CommitOutcome, CommitStatus};
pub use tree::{SurfaceTree, SurfaceTreeBuilder};
