//! Error types for canopy
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Commit conflicts and transaction aborts are not errors: they are ordinary
//! outcomes of an optimistic commit attempt and are reported as values by the
//! commit engine.

use crate::types::Tag;
use std::io;
use thiserror::Error;

/// Result type alias for canopy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for canopy
#[derive(Debug, Error)]
pub enum Error {
    /// Attempted to mutate a node after it was sealed
    #[error("Node {tag} is sealed and can no longer be mutated")]
    NodeSealed {
        /// Tag of the sealed node
        tag: Tag,
    },

    /// Configuration failed to parse or validate
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (reading configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }
}
