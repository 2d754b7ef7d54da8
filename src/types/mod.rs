//! Type definitions for the supervisor
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SupervisorId`, `RequestId`)
//! - [`state`] - Lifecycle state machine values
//! - [`options`] - Configuration options and builder
//! - [`reply`] - Structured outcome of one command exchange
//! - [`status`] - Serializable status snapshot

pub mod identifiers;
pub mod options;
pub mod reply;
pub mod state;
pub mod status;

// Re-export commonly used types
pub use identifiers::{RequestId, SupervisorId};
pub use options::{Correlation, LaunchCommand, SupervisorOptions, SupervisorOptionsBuilder};
pub use reply::Reply;
pub use state::SupervisorState;
pub use status::SupervisorStatus;
