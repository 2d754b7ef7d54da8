//! Error types for the MCP process supervisor
//!
//! Only failures that make an operation impossible are errors. Outcomes of a
//! command that reached the child (timeouts, malformed replies, broken pipes
//! during the exchange) are reported as [`Reply`](crate::types::Reply) values.

use thiserror::Error;

/// Main error type for the supervisor
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The child process could not be launched
    #[error("Failed to launch child process: {0}")]
    Launch(String),

    /// A command was issued while the supervisor is not running
    #[error("Child process is not running")]
    NotRunning,

    /// I/O error outside of a command exchange
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Command could not be serialized to a single JSON line
    #[error("Failed to serialize command: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;

impl SupervisorError {
    /// Create a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error means the child is simply not available
    #[must_use]
    pub fn is_not_running(&self) -> bool {
        matches!(self, Self::NotRunning)
    }
}
