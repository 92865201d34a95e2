//! Core types and traits for canopy
//!
//! This crate defines the foundational types used throughout the system:
//! - Tag, SurfaceId, Family: node and element identity
//! - Node, RootNode: immutable tree nodes with a mutable mount flag
//! - Props, RootProps: node properties
//! - Layout primitives and the LayoutEngine collaborator
//! - EventEmitter, NodeState: event and state collaborators
//! - DispatchMutex: critical section shared with event dispatch
//! - Revision, RevisionNumber, CommitTelemetry: committed snapshots
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod layout;
pub mod node;
pub mod props;
pub mod revision;
pub mod state;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};
pub use event::{DispatchMutex, EventEmitter, NoopEventEmitter};
pub use layout::{
    LayoutConstraints, LayoutContext, LayoutEngine, LayoutMetrics, NoopLayoutEngine, Point, Rect,
    Size, StackLayoutEngine,
};
pub use node::{Node, RootNode, SharedNode, SharedNodeList, SharedRootNode};
pub use props::{Props, RootProps};
pub use revision::{Revision, RevisionNumber};
pub use state::NodeState;
pub use telemetry::CommitTelemetry;
pub use types::{Family, SurfaceId, Tag};
