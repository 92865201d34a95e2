//! Mount-flag propagation
//!
//! After the current root is swapped, the old and the new child lists are
//! walked in parallel to keep every node's `mounted` flag current and to
//! commit attached state on every node that becomes mounted.
//!
//! This is NOT a keyed reconciliation. Lists are compared by position:
//!
//! ```text
//! Stage 1 (update): while both lists have an entry at `index`
//!     same instance      -> skip, subtree unchanged
//!     different family   -> stop stage 1 here
//!     same family        -> mount new, commit state, unmount old, recurse
//! Stage 2 (insert): new entries past the boundary are mounted recursively
//! Stage 3 (remove): old entries past the boundary are unmounted recursively
//! ```
//!
//! The new node is always mounted before the old one is unmounted, so a node
//! that shares a family with one just unmounted can tell a remount apart from
//! a fresh insertion.
//!
//! Callers must hold the commit lock and the dispatch mutex.

use canopy_core::{Node, SharedNode};
use tracing::trace;

/// Update mount flags for the transition `old_children` -> `new_children`
pub fn update_mounted_flags(old_children: &[SharedNode], new_children: &[SharedNode]) {
    if std::ptr::eq(old_children, new_children) {
        // Same list, nothing below can differ
        return;
    }

    if old_children.is_empty() && new_children.is_empty() {
        return;
    }

    let mut index = 0;

    // Stage 1: updated children
    while index < old_children.len() && index < new_children.len() {
        let old_child = &old_children[index];
        let new_child = &new_children[index];

        if SharedNode::ptr_eq(old_child, new_child) {
            index += 1;
            continue;
        }

        if !Node::same_family(old_child, new_child) {
            break;
        }

        mount(new_child);
        unmount(old_child);

        update_mounted_flags(old_child.children(), new_child.children());
        index += 1;
    }

    let boundary = index;

    // Stage 2: inserted children
    for new_child in &new_children[boundary..] {
        mount(new_child);
        update_mounted_flags(&[], new_child.children());
    }

    // Stage 3: removed children
    for old_child in &old_children[boundary..] {
        unmount(old_child);
        update_mounted_flags(old_child.children(), &[]);
    }
}

fn mount(node: &Node) {
    trace!(tag = %node.tag(), family = %node.family(), "mount");
    node.set_mounted(true);
    if let Some(state) = node.state() {
        state.commit(node);
    }
}

fn unmount(node: &Node) {
    trace!(tag = %node.tag(), family = %node.family(), "unmount");
    node.set_mounted(false);
}
