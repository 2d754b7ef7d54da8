//! # MCP Process Supervisor
//!
//! Owns a long-running MCP server child process (by default
//! `npx -y @mobilenext/mobile-mcp@latest`) and exchanges line-delimited JSON
//! with it over stdin/stdout, while continuously draining its stderr.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mcp_process_supervisor::{ProcessSupervisor, Reply, SupervisorOptions};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = SupervisorOptions::builder()
//!         .shell_command("npx -y @mobilenext/mobile-mcp@latest")
//!         .response_timeout(Duration::from_secs(10))
//!         .build();
//!
//!     let supervisor = ProcessSupervisor::new(options);
//!     supervisor.start().await?;
//!
//!     match supervisor.send(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await? {
//!         Reply::Response { value } => log::info!("tools: {value}"),
//!         Reply::Timeout { .. } => log::warn!("no answer"),
//!         other => log::error!("exchange failed: {other:?}"),
//!     }
//!
//!     supervisor.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`supervisor`]: [`ProcessSupervisor`] lifecycle, pipe readers, and correlation
//! - [`diagnostics`]: where the child's stderr lines go
//! - [`message`]: reply line parsing
//! - [`mcp`]: JSON-RPC envelopes and a small MCP client
//! - [`types`]: options, state, replies, identifiers
//! - [`error`]: error types
//!
//! ## Contract
//!
//! - Call [`ProcessSupervisor::start`] before sending anything.
//! - [`ProcessSupervisor::send`] is serialized internally; concurrent callers
//!   queue behind each other.
//! - With the default positional correlation the child must answer commands in
//!   order and never write unsolicited lines to stdout. Use
//!   [`Correlation::ById`] for children that echo request ids.
//! - Call [`ProcessSupervisor::stop`] on shutdown; dropping a running
//!   supervisor only makes a best-effort kill.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostics;
pub mod error;
pub mod mcp;
pub mod message;
pub mod supervisor;
pub mod types;

// Re-export commonly used types for external API
pub use diagnostics::{ChannelSink, DiagnosticSink, LogSink};
pub use error::{Result, SupervisorError};
pub use mcp::McpClient;
pub use message::parse_reply;
pub use supervisor::ProcessSupervisor;
pub use types::{
    Correlation, LaunchCommand, Reply, RequestId, SupervisorId, SupervisorOptions,
    SupervisorOptionsBuilder, SupervisorState, SupervisorStatus,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
