//! Identifier types for tree nodes
//!
//! - `Tag`: identity of a node within one tree instance
//! - `SurfaceId`: identity of the surface that owns a tree
//! - `Family`: identity of a logical UI element across revisions
//!
//! Family matching is a value comparison. Two nodes allocated in different
//! revisions (different addresses, different props) with the same `Family`
//! represent the same element over time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a node within one tree instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag(u64);

impl Tag {
    /// Create a tag from its raw value
    pub const fn new(raw: u64) -> Self {
        Tag(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of the surface a tree renders into
///
/// The root node of a surface's tree uses the surface id as its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Create a surface id from its raw value
    pub const fn new(raw: u64) -> Self {
        SurfaceId(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Tag used by the root node of this surface
    #[inline]
    pub const fn as_tag(&self) -> Tag {
        Tag(self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Identity of a logical element, stable across revisions
///
/// Copies of a node made for the next revision keep the family of the node
/// they were copied from. Freshly created elements get a new family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Family(u64);

static NEXT_FAMILY: AtomicU64 = AtomicU64::new(1);

impl Family {
    /// Allocate a new, process-unique family
    pub fn new() -> Self {
        Family(NEXT_FAMILY.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a family from a raw value
    ///
    /// Callers that mint their own identifiers must keep them distinct from
    /// families allocated with [`Family::new`].
    pub const fn from_raw(raw: u64) -> Self {
        Family(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for Family {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "family-{}", self.0)
    }
}
