//! Newtype wrappers for type safety
//!
//! This module contains newtype wrappers that keep supervisor instance ids and
//! per-command request ids from being mixed with other integers and strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Newtype Wrappers for Type Safety
// ============================================================================

/// Identifier of one supervisor instance, used to tell instances apart in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupervisorId(Uuid);

impl SupervisorId {
    /// Create a new random supervisor ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form used as a log prefix
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SupervisorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SupervisorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request ID stamped onto commands for id-based correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Create a new request ID
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether a JSON `id` field refers to this request
    ///
    /// Children commonly echo numeric ids back as numbers, some as strings.
    #[must_use]
    pub fn matches(self, value: &serde_json::Value) -> bool {
        match value {
            serde_json::Value::Number(n) => n.as_u64() == Some(self.0),
            serde_json::Value::String(s) => s.parse::<u64>().ok() == Some(self.0),
            _ => false,
        }
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
