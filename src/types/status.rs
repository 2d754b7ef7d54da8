//! Point-in-time snapshot of a supervisor

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::identifiers::SupervisorId;
use super::state::SupervisorState;

/// Serializable snapshot returned by [`ProcessSupervisor::status`](crate::ProcessSupervisor::status)
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorStatus {
    /// Instance identifier
    pub id: SupervisorId,
    /// Current lifecycle state
    pub state: SupervisorState,
    /// OS process id of the child, while it exists
    pub pid: Option<u32>,
    /// When the current child was spawned
    pub started_at: Option<DateTime<Utc>>,
    /// Milliseconds since `started_at`
    pub uptime_ms: Option<u64>,
    /// Lines written to the child since the supervisor was created
    pub commands_sent: u64,
    /// Replies handed to callers since the supervisor was created
    pub responses_received: u64,
}
