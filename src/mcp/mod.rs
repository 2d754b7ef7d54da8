//! MCP (Model Context Protocol) helpers on top of the supervisor
//!
//! The supervisor itself never looks inside commands. This module builds the
//! JSON-RPC envelopes an MCP stdio server expects and wraps a supervisor in a
//! small [`McpClient`] for the common calls.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcp_process_supervisor::{McpClient, ProcessSupervisor, SupervisorOptions};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let supervisor = Arc::new(ProcessSupervisor::new(SupervisorOptions::default()));
//! supervisor.start().await?;
//!
//! let client = McpClient::new(Arc::clone(&supervisor));
//! client.initialize("mobile-agent", "0.1.0").await?;
//! let reply = client
//!     .call_tool("mobile_launch_app", json!({"packageName": "com.tencent.mm"}))
//!     .await?;
//! log::info!("launch: {:?}", reply.into_value());
//!
//! supervisor.stop().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod envelope;

pub use client::McpClient;
pub use envelope::{
    JSONRPC_VERSION, JsonRpcNotification, JsonRpcRequest, PROTOCOL_VERSION, ToolCallParams,
};
