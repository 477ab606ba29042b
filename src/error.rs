//! Custom error types for hardsnap
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for hardsnap operations
#[derive(Error, Debug)]
pub enum HardsnapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// An external command exited with a nonzero status
    #[error("Command failed ({status}): {command}\n >> {}", .output.join("\n >> "))]
    Command {
        command: String,
        status: i32,
        output: Vec<String>,
    },

    /// Malformed input that could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// An operation was called with arguments violating its contract
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A bounded retry loop ran out of attempts
    #[error("Resource exhausted: {0}")]
    Exhausted(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },
}

impl HardsnapError {
    /// Create a "not found" error for snapshots
    pub fn snapshot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Snapshot",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from a failed external command
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }

    /// Check if this is a precondition violation
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for HardsnapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for hardsnap operations
pub type HardsnapResult<T> = Result<T, HardsnapError>;
