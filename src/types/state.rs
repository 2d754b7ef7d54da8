//! Supervisor lifecycle state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`ProcessSupervisor`](crate::ProcessSupervisor)
///
/// The child handle exists exactly when the state is not `Stopped`: `Starting`
/// is entered only after a successful spawn, and `Stopped` only after teardown
/// has released the handle. The pipe readers only run while `Running` or while
/// leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// No child process
    #[default]
    Stopped,
    /// Child is being spawned
    Starting,
    /// Child is running and accepting commands
    Running,
    /// Child is being terminated
    Stopping,
}

impl SupervisorState {
    /// Lowercase name of the state
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
