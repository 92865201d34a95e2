//! Layout primitives and the layout collaborator
//!
//! The commit engine runs layout on every candidate tree before sealing it,
//! outside of any lock. A [`LayoutEngine`] writes geometry into the candidate
//! (copying shared nodes whose metrics change) and reports the nodes whose
//! metrics changed so `on_layout` events can be emitted after the commit.

use crate::node::{RootNode, SharedNode};
use serde::{Deserialize, Serialize};

/// A point in surface coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
}

/// A two-dimensional size
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Size {
    /// Create a size
    pub const fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner, relative to the parent
    pub origin: Point,
    /// Extent
    pub size: Size,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }
}

/// Geometry of one node as computed by the layout pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    /// Frame relative to the parent
    pub frame: Rect,
}

impl LayoutMetrics {
    /// Create metrics for a frame
    pub const fn new(frame: Rect) -> Self {
        LayoutMetrics { frame }
    }
}

/// Size bounds of a surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConstraints {
    /// Smallest allowed size
    pub minimum_size: Size,
    /// Largest allowed size (may be infinite)
    pub maximum_size: Size,
}

impl LayoutConstraints {
    /// Constraints that pin the surface to one size
    pub const fn exact(width: f32, height: f32) -> Self {
        LayoutConstraints {
            minimum_size: Size::new(width, height),
            maximum_size: Size::new(width, height),
        }
    }

    /// Clamp a size into these bounds
    pub fn clamp(&self, size: Size) -> Size {
        Size {
            width: size
                .width
                .max(self.minimum_size.width)
                .min(self.maximum_size.width),
            height: size
                .height
                .max(self.minimum_size.height)
                .min(self.maximum_size.height),
        }
    }
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        LayoutConstraints {
            minimum_size: Size::default(),
            maximum_size: Size::new(f32::INFINITY, f32::INFINITY),
        }
    }
}

/// Environment of a layout pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutContext {
    /// Physical pixels per layout point; frames are rounded to this grid
    pub point_scale_factor: f32,
}

impl Default for LayoutContext {
    fn default() -> Self {
        LayoutContext {
            point_scale_factor: 1.0,
        }
    }
}

impl LayoutContext {
    /// Round a coordinate to the physical pixel grid
    pub fn round_to_pixel(&self, value: f32) -> f32 {
        if self.point_scale_factor <= 0.0 {
            return value;
        }
        (value * self.point_scale_factor).round() / self.point_scale_factor
    }
}

/// Layout collaborator
///
/// Implementations must not fail and must only modify the candidate tree they
/// are given: nodes shared with earlier revisions are sealed and have to be
/// copied (`Node::clone_unsealed`) before new metrics are written.
pub trait LayoutEngine: Send + Sync {
    /// Lay out `root`, pushing every node whose metrics changed to `affected`
    fn layout(&self, root: &mut RootNode, affected: &mut Vec<SharedNode>);
}

/// Layout engine that leaves the tree untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLayoutEngine;

impl LayoutEngine for NoopLayoutEngine {
    fn layout(&self, _root: &mut RootNode, _affected: &mut Vec<SharedNode>) {}
}

/// Vertical stack layout
///
/// Children fill their parent's width and are stacked top to bottom. A node's
/// height is `props.height` when set, otherwise the sum of its children's
/// heights. The root spans the surface width and is clamped to the root's
/// layout constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackLayoutEngine;

impl StackLayoutEngine {
    /// Lay out a child list; returns the new list if any child was replaced
    fn layout_children(
        &self,
        children: &[SharedNode],
        width: f32,
        round: &dyn Fn(f32) -> f32,
        affected: &mut Vec<SharedNode>,
    ) -> (Option<Vec<SharedNode>>, f32) {
        let mut replaced: Option<Vec<SharedNode>> = None;
        let mut offset = 0.0;

        for (index, child) in children.iter().enumerate() {
            let (laid_out, height) = self.layout_node(child, offset, width, round, affected);
            if let Some(node) = laid_out {
                replaced.get_or_insert_with(|| children.to_vec())[index] = node;
            }
            offset += height;
        }

        (replaced, offset)
    }

    /// Lay out one node; returns its replacement if metrics or children changed
    fn layout_node(
        &self,
        node: &SharedNode,
        y: f32,
        width: f32,
        round: &dyn Fn(f32) -> f32,
        affected: &mut Vec<SharedNode>,
    ) -> (Option<SharedNode>, f32) {
        let (children, content_height) =
            self.layout_children(node.children(), width, round, affected);
        let height = node.props().height.unwrap_or(content_height);
        let metrics = LayoutMetrics::new(Rect::new(0.0, round(y), round(width), round(height)));

        let metrics_changed = metrics != *node.layout_metrics();
        if !metrics_changed && children.is_none() {
            return (None, height);
        }

        let mut updated = node.clone_unsealed().with_layout_metrics(metrics);
        if let Some(children) = children {
            updated = updated.with_children(children);
        }
        let updated = updated.into_shared();
        if metrics_changed {
            affected.push(SharedNode::clone(&updated));
        }
        (Some(updated), height)
    }
}

impl LayoutEngine for StackLayoutEngine {
    fn layout(&self, root: &mut RootNode, affected: &mut Vec<SharedNode>) {
        if root.is_sealed() {
            return;
        }

        let constraints = root.root_props().layout_constraints;
        let context = root.root_props().layout_context;
        let round = |value: f32| context.round_to_pixel(value);

        let width = if constraints.maximum_size.width.is_finite() {
            constraints.maximum_size.width
        } else {
            constraints.minimum_size.width
        };

        let (replaced, content_height) =
            self.layout_children(root.children(), width, &round, affected);
        let size = constraints.clamp(Size::new(width, content_height));

        let metrics = LayoutMetrics::new(Rect::new(
            0.0,
            0.0,
            round(size.width),
            round(size.height),
        ));
        let applied = replaced
            .map_or(Ok(()), |children| root.set_children(children))
            .and_then(|()| root.set_layout_metrics(metrics));
        debug_assert!(applied.is_ok(), "layout wrote to sealed root {}", root.tag());
    }
}
