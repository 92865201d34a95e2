//! Node properties
//!
//! Props are frozen once attached to a node: nodes hold them behind an `Arc`
//! and a new revision that changes a prop attaches a new `Props` value.

use crate::layout::{LayoutConstraints, LayoutContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Properties of a regular node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Props {
    /// Whether the node wants `on_layout` events when its geometry changes
    #[serde(default)]
    pub on_layout: bool,

    /// Fixed height; when absent the height is derived from the children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,

    /// Free-form attributes owned by the component that produced the node
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Props {
    /// Create empty props
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `on_layout` events
    pub fn with_on_layout(mut self, on_layout: bool) -> Self {
        self.on_layout = on_layout;
        self
    }

    /// Set a fixed height
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }
}

/// Properties of a root node
///
/// The root carries the constraints and context the layout engine lays the
/// whole surface out against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootProps {
    /// Size bounds of the surface
    pub layout_constraints: LayoutConstraints,
    /// Environment of the layout pass
    pub layout_context: LayoutContext,
}

impl RootProps {
    /// Create root props
    pub fn new(layout_constraints: LayoutConstraints, layout_context: LayoutContext) -> Self {
        Self {
            layout_constraints,
            layout_context,
        }
    }
}
