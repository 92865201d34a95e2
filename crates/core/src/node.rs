//! Immutable tree nodes
//!
//! A `Node` is built (or copied from a node of the previous revision) while a
//! transaction runs, then sealed before the tree is published. After sealing
//! every field is frozen except the `mounted` flag, which the commit engine
//! flips while it holds the commit lock.
//!
//! ## Sharing
//!
//! Nodes are shared between revisions through `Arc`. A subtree untouched by a
//! transaction is the very same allocation in the old and the new tree, and a
//! child list that was not edited is the very same `Arc<Vec<_>>`. Both facts
//! are used as fast paths when mount flags are updated.
//!
//! ## Mutation
//!
//! - `with_*` builders consume a freshly created or freshly copied node
//! - `set_*` mutators return [`Error::NodeSealed`] once the node is sealed

use crate::error::{Error, Result};
use crate::event::EventEmitter;
use crate::layout::LayoutMetrics;
use crate::props::{Props, RootProps};
use crate::state::NodeState;
use crate::types::{Family, SurfaceId, Tag};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A node shared between revisions
pub type SharedNode = Arc<Node>;

/// A child list shared between revisions
pub type SharedNodeList = Arc<Vec<SharedNode>>;

/// A root node shared between revisions
pub type SharedRootNode = Arc<RootNode>;

/// Unit of the tree
#[derive(Debug)]
pub struct Node {
    tag: Tag,
    family: Family,
    props: Arc<Props>,
    event_emitter: Option<Arc<dyn EventEmitter>>,
    state: Option<Arc<dyn NodeState>>,
    children: SharedNodeList,
    layout_metrics: LayoutMetrics,
    mounted: AtomicBool,
    sealed: AtomicBool,
}

impl Node {
    /// Create an unsealed node with default props and no children
    pub fn new(tag: Tag, family: Family) -> Self {
        Node {
            tag,
            family,
            props: Arc::new(Props::default()),
            event_emitter: None,
            state: None,
            children: Arc::new(Vec::new()),
            layout_metrics: LayoutMetrics::default(),
            mounted: AtomicBool::new(false),
            sealed: AtomicBool::new(false),
        }
    }

    /// Copy this node for the next revision
    ///
    /// The copy keeps tag, family, props, state, event emitter, layout
    /// metrics and the (shared) child list. It starts unsealed and unmounted.
    pub fn clone_unsealed(&self) -> Self {
        Node {
            tag: self.tag,
            family: self.family,
            props: Arc::clone(&self.props),
            event_emitter: self.event_emitter.clone(),
            state: self.state.clone(),
            children: Arc::clone(&self.children),
            layout_metrics: self.layout_metrics,
            mounted: AtomicBool::new(false),
            sealed: AtomicBool::new(false),
        }
    }

    /// Wrap the node for sharing
    pub fn into_shared(self) -> SharedNode {
        Arc::new(self)
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Replace props
    pub fn with_props(mut self, props: Props) -> Self {
        debug_assert!(!self.is_sealed(), "builder used on sealed node {}", self.tag);
        self.props = Arc::new(props);
        self
    }

    /// Replace the child list
    pub fn with_children(mut self, children: Vec<SharedNode>) -> Self {
        debug_assert!(!self.is_sealed(), "builder used on sealed node {}", self.tag);
        self.children = Arc::new(children);
        self
    }

    /// Attach a mutable-state handle
    pub fn with_state(mut self, state: Arc<dyn NodeState>) -> Self {
        debug_assert!(!self.is_sealed(), "builder used on sealed node {}", self.tag);
        self.state = Some(state);
        self
    }

    /// Attach an event emitter
    pub fn with_event_emitter(mut self, event_emitter: Arc<dyn EventEmitter>) -> Self {
        debug_assert!(!self.is_sealed(), "builder used on sealed node {}", self.tag);
        self.event_emitter = Some(event_emitter);
        self
    }

    /// Replace layout metrics
    pub fn with_layout_metrics(mut self, layout_metrics: LayoutMetrics) -> Self {
        debug_assert!(!self.is_sealed(), "builder used on sealed node {}", self.tag);
        self.layout_metrics = layout_metrics;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Identity within this tree instance
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Identity across revisions
    #[inline]
    pub fn family(&self) -> Family {
        self.family
    }

    /// Node properties
    #[inline]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Event emitter, if the node dispatches events
    pub fn event_emitter(&self) -> Option<&Arc<dyn EventEmitter>> {
        self.event_emitter.as_ref()
    }

    /// Mutable-state handle, if the node carries one
    pub fn state(&self) -> Option<&Arc<dyn NodeState>> {
        self.state.as_ref()
    }

    /// Ordered children
    #[inline]
    pub fn children(&self) -> &[SharedNode] {
        &self.children
    }

    /// The shared child list (identity is preserved across untouched copies)
    #[inline]
    pub fn shared_children(&self) -> &SharedNodeList {
        &self.children
    }

    /// Geometry computed by the last layout pass
    #[inline]
    pub fn layout_metrics(&self) -> &LayoutMetrics {
        &self.layout_metrics
    }

    /// Check whether two nodes represent the same logical element
    #[inline]
    pub fn same_family(a: &Node, b: &Node) -> bool {
        a.family == b.family
    }

    /// Visit this node and every descendant, parents before children
    pub fn traverse<F: FnMut(&Node)>(&self, visit: &mut F) {
        visit(self);
        for child in self.children.iter() {
            child.traverse(visit);
        }
    }

    // =========================================================================
    // Mutators (unsealed only)
    // =========================================================================

    fn ensure_unsealed(&self) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::NodeSealed { tag: self.tag });
        }
        Ok(())
    }

    /// Replace props
    pub fn set_props(&mut self, props: Props) -> Result<()> {
        self.ensure_unsealed()?;
        self.props = Arc::new(props);
        Ok(())
    }

    /// Replace the child list
    pub fn set_children(&mut self, children: Vec<SharedNode>) -> Result<()> {
        self.ensure_unsealed()?;
        self.children = Arc::new(children);
        Ok(())
    }

    /// Append a child
    ///
    /// A child list still shared with another node is copied first.
    pub fn append_child(&mut self, child: SharedNode) -> Result<()> {
        self.ensure_unsealed()?;
        Arc::make_mut(&mut self.children).push(child);
        Ok(())
    }

    /// Replace the child at `index`, returning the previous child
    ///
    /// Returns `Ok(None)` (and changes nothing) when `index` is out of bounds.
    pub fn replace_child(&mut self, index: usize, child: SharedNode) -> Result<Option<SharedNode>> {
        self.ensure_unsealed()?;
        if index >= self.children.len() {
            return Ok(None);
        }
        let children = Arc::make_mut(&mut self.children);
        Ok(Some(std::mem::replace(&mut children[index], child)))
    }

    /// Remove the child at `index`
    ///
    /// Returns `Ok(None)` when `index` is out of bounds.
    pub fn remove_child(&mut self, index: usize) -> Result<Option<SharedNode>> {
        self.ensure_unsealed()?;
        if index >= self.children.len() {
            return Ok(None);
        }
        Ok(Some(Arc::make_mut(&mut self.children).remove(index)))
    }

    /// Replace layout metrics
    pub fn set_layout_metrics(&mut self, layout_metrics: LayoutMetrics) -> Result<()> {
        self.ensure_unsealed()?;
        self.layout_metrics = layout_metrics;
        Ok(())
    }

    // =========================================================================
    // Sealing
    // =========================================================================

    /// Check whether the node is sealed
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Seal this node only
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Seal this node and its whole subtree
    ///
    /// Stops at nodes that are already sealed: a sealed node's subtree was
    /// sealed along with it.
    pub fn seal_recursive(&self) {
        if self.is_sealed() {
            return;
        }
        self.seal();
        for child in self.children.iter() {
            child.seal_recursive();
        }
    }

    // =========================================================================
    // Mount flag
    // =========================================================================

    /// Whether the node is part of the committed tree
    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Set the mount flag
    ///
    /// This is the only mutation allowed on a sealed node. The commit engine
    /// calls it while holding both the commit lock and the dispatch mutex.
    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.store(mounted, Ordering::Release);
    }
}

/// Root of one surface's tree
///
/// Derefs to the underlying [`Node`]; root-specific props carry the layout
/// constraints and context for the surface.
#[derive(Debug)]
pub struct RootNode {
    node: Node,
    root_props: Arc<RootProps>,
}

impl RootNode {
    /// Create the initial root for a surface
    pub fn new(surface_id: SurfaceId, family: Family, root_props: RootProps) -> Self {
        RootNode {
            node: Node::new(surface_id.as_tag(), family),
            root_props: Arc::new(root_props),
        }
    }

    /// Wrap an existing node as a root
    pub fn from_node(node: Node, root_props: RootProps) -> Self {
        RootNode {
            node,
            root_props: Arc::new(root_props),
        }
    }

    /// Copy this root for the next revision
    pub fn clone_unsealed(&self) -> Self {
        RootNode {
            node: self.node.clone_unsealed(),
            root_props: Arc::clone(&self.root_props),
        }
    }

    /// Copy this root for the next revision with a new child list
    pub fn clone_with_children(&self, children: Vec<SharedNode>) -> Self {
        RootNode {
            node: self.node.clone_unsealed().with_children(children),
            root_props: Arc::clone(&self.root_props),
        }
    }

    /// Root-specific props
    #[inline]
    pub fn root_props(&self) -> &RootProps {
        &self.root_props
    }

    /// Replace root-specific props
    pub fn set_root_props(&mut self, root_props: RootProps) -> Result<()> {
        self.node.ensure_unsealed()?;
        self.root_props = Arc::new(root_props);
        Ok(())
    }

    /// The underlying node
    #[inline]
    pub fn as_node(&self) -> &Node {
        &self.node
    }
}

impl Deref for RootNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl DerefMut for RootNode {
    fn deref_mut(&mut self) -> &mut Node {
        &mut self.node
    }
}
