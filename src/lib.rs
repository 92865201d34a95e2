//! Canopy - concurrent revision control for immutable UI trees
//!
//! Each surface owns one immutable tree. Any thread may commit a transaction
//! that derives a new tree from the current one; commits are optimistic and
//! retried when another commit won the race. Every committed revision is
//! handed, in order, to the surface's [`RevisionFeed`].
//!
//! # Quick Start
//!
//! ```ignore
//! use canopy::{Family, Node, SurfaceId, SurfaceTree, Tag};
//!
//! let tree = SurfaceTree::builder(SurfaceId::new(1)).build()?;
//!
//! let child = Node::new(Tag::new(2), Family::new()).into_shared();
//! tree.commit(|old_root| {
//!     let mut root = old_root.clone_unsealed();
//!     root.append_child(child.clone()).ok()?;
//!     Some(root)
//! });
//!
//! for revision in tree.feed().drain() {
//!     // hand revision.root() to the mounting layer
//! }
//! ```
//!
//! # Architecture
//!
//! - `canopy-core`: nodes, props, layout, revisions
//! - `canopy-concurrency`: the commit engine, mount flags, revision feed

pub use canopy_concurrency::*;
pub use canopy_core::*;
