//! Commit engine configuration via `canopy.toml`
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock behavior. Settings can also be adjusted in code with the
//! `with_*` builders.

use crate::feed::DEFAULT_FEED_CAPACITY;
use canopy_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "canopy.toml";

fn default_max_commit_attempts() -> usize {
    1024
}

fn default_affected_nodes_capacity() -> usize {
    1024
}

fn default_conflict_warn_threshold() -> usize {
    64
}

fn default_feed_capacity() -> usize {
    DEFAULT_FEED_CAPACITY
}

/// Largest accepted `affected_nodes_capacity`
pub const MAX_AFFECTED_NODES_CAPACITY: usize = 1 << 20;

/// Configuration of a [`SurfaceTree`](crate::SurfaceTree)
///
/// # Example
///
/// ```toml
/// # Commit attempts before a transaction is declared unable to ever succeed
/// max_commit_attempts = 1024
///
/// # Capacity reserved for the list of nodes whose layout changed
/// affected_nodes_capacity = 1024
///
/// # Attempts after which a single commit logs a contention warning
/// conflict_warn_threshold = 64
///
/// # Undelivered revisions the feed keeps before dropping the oldest
/// feed_capacity = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Hard cap on attempts for one `commit`; exceeding it is fatal
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: usize,

    /// Capacity reserved up front for layout-affected nodes per attempt
    #[serde(default = "default_affected_nodes_capacity")]
    pub affected_nodes_capacity: usize,

    /// Attempts after which a commit logs a contention warning (0 = never)
    #[serde(default = "default_conflict_warn_threshold")]
    pub conflict_warn_threshold: usize,

    /// Pending revisions kept by the feed; older ones are dropped past it
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: default_max_commit_attempts(),
            affected_nodes_capacity: default_affected_nodes_capacity(),
            conflict_warn_threshold: default_conflict_warn_threshold(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

impl TreeConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hard cap on commit attempts
    pub fn with_max_commit_attempts(mut self, max_commit_attempts: usize) -> Self {
        self.max_commit_attempts = max_commit_attempts;
        self
    }

    /// Set the capacity reserved for layout-affected nodes
    pub fn with_affected_nodes_capacity(mut self, affected_nodes_capacity: usize) -> Self {
        self.affected_nodes_capacity = affected_nodes_capacity;
        self
    }

    /// Set the contention warning threshold
    pub fn with_conflict_warn_threshold(mut self, conflict_warn_threshold: usize) -> Self {
        self.conflict_warn_threshold = conflict_warn_threshold;
        self
    }

    /// Set how many undelivered revisions the feed keeps
    pub fn with_feed_capacity(mut self, feed_capacity: usize) -> Self {
        self.feed_capacity = feed_capacity;
        self
    }

    /// Check the values are usable
    ///
    /// # Errors
    ///
    /// Returns an error if `max_commit_attempts` or `feed_capacity` is 0, or
    /// if `affected_nodes_capacity` exceeds [`MAX_AFFECTED_NODES_CAPACITY`].
    pub fn validate(&self) -> Result<()> {
        if self.max_commit_attempts == 0 {
            return Err(Error::invalid_config(
                "max_commit_attempts must be at least 1",
            ));
        }
        if self.affected_nodes_capacity > MAX_AFFECTED_NODES_CAPACITY {
            return Err(Error::invalid_config(format!(
                "affected_nodes_capacity must be at most {}, got {}",
                MAX_AFFECTED_NODES_CAPACITY, self.affected_nodes_capacity
            )));
        }
        if self.feed_capacity == 0 {
            return Err(Error::invalid_config("feed_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TreeConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(message) => {
                Error::invalid_config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    /// Serialize to TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::invalid_config(format!("Failed to serialize config: {}", e)))
    }

    /// The default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# Canopy commit engine configuration
#
# Commit attempts before a transaction is declared unable to ever succeed.
# Exceeding the cap halts the caller: it indicates a bug, not contention.
max_commit_attempts = 1024

# Capacity reserved for the list of nodes whose layout changed in one attempt
affected_nodes_capacity = 1024

# Attempts after which a single commit logs a contention warning (0 = never)
conflict_warn_threshold = 64

# Undelivered revisions the feed keeps; the oldest are dropped past this.
# Each one keeps its whole tree alive.
feed_capacity = 64
"#
    }
}
