//! State collaborator
//!
//! A node may carry a handle to mutable state that lives outside the
//! immutable tree. Each time a node becomes mounted (including remounts), the
//! commit engine calls [`NodeState::commit`] exactly once with that node so
//! the state can snapshot itself against its owning node.

use crate::node::Node;
use std::fmt;

/// Mutable state attached to a node
pub trait NodeState: Send + Sync + fmt::Debug {
    /// The node owning this state was mounted in a committed revision
    fn commit(&self, node: &Node);
}
