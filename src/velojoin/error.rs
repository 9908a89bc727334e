//! Join error types
//!
//! Every error surfaced by this crate is structural: it is raised while a
//! join or topology is being constructed, before any record is processed.
//! Once a [`JoinCoordinator`](crate::velojoin::execution::join::JoinCoordinator)
//! exists, its buffer and matching operations are total and never fail.
//! The only runtime variants belong to the partition worker driver.

use std::path::PathBuf;

/// Main error type for join construction and topology validation
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// Invalid window bounds or serializer/deserializer pairing
    #[error("Invalid configuration for join '{join}': {reason}")]
    Configuration { join: String, reason: String },

    /// Sources in one co-partition group are not partitioned identically
    #[error("Co-partitioning violation for sources {sources:?}: {details}")]
    CopartitioningViolation {
        sources: Vec<String>,
        details: String,
    },

    /// Unknown or duplicate node names in a topology declaration
    #[error("Invalid topology: {reason}")]
    Topology { reason: String },

    /// Topology file could not be read
    #[error("Failed to read topology file '{}'", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Topology file is not valid YAML for the expected schema
    #[error("Failed to parse topology file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A partition worker stopped accepting input
    #[error("Partition {partition} input channel is closed")]
    ChannelClosed { partition: usize },

    /// A partition worker task panicked or was aborted
    #[error("Partition {partition} worker failed: {reason}")]
    WorkerFailed { partition: usize, reason: String },
}

impl JoinError {
    /// Shorthand for a configuration error on a named join window
    pub fn configuration(join: impl Into<String>, reason: impl Into<String>) -> Self {
        JoinError::Configuration {
            join: join.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a topology declaration error
    pub fn topology(reason: impl Into<String>) -> Self {
        JoinError::Topology {
            reason: reason.into(),
        }
    }

    /// True for errors raised while building a join or topology
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            JoinError::Configuration { .. }
                | JoinError::CopartitioningViolation { .. }
                | JoinError::Topology { .. }
                | JoinError::ConfigLoad { .. }
                | JoinError::ConfigParse { .. }
        )
    }
}

/// Result alias used across the crate
pub type JoinResult<T> = Result<T, JoinError>;
