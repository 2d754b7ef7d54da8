//! Thin MCP client over a shared supervisor

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::supervisor::ProcessSupervisor;
use crate::types::Reply;

use super::envelope::{JsonRpcNotification, JsonRpcRequest};

/// MCP calls issued through a [`ProcessSupervisor`]
///
/// Request ids come from the supervisor, so several clients sharing one
/// supervisor never reuse an id.
#[derive(Debug, Clone)]
pub struct McpClient {
    supervisor: Arc<ProcessSupervisor>,
}

impl McpClient {
    /// Wrap a supervisor
    #[must_use]
    pub fn new(supervisor: Arc<ProcessSupervisor>) -> Self {
        Self { supervisor }
    }

    /// The underlying supervisor
    #[must_use]
    pub fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    /// Perform the MCP handshake
    ///
    /// Sends `initialize` and, if a well-formed reply comes back, the
    /// `notifications/initialized` notification. The handshake reply is
    /// returned either way.
    ///
    /// # Errors
    /// Returns error if the supervisor is not running or a write fails
    pub async fn initialize(&self, client_name: &str, client_version: &str) -> Result<Reply> {
        let id = self.supervisor.next_request_id();
        let request = JsonRpcRequest::initialize(id, client_name, client_version);
        let reply = self.supervisor.send(&request.to_value()?).await?;

        if reply.is_success() {
            self.supervisor
                .notify(&JsonRpcNotification::initialized().to_value()?)
                .await?;
        }
        Ok(reply)
    }

    /// Invoke a tool via `tools/call`
    ///
    /// # Errors
    /// Returns error if the supervisor is not running or the envelope cannot be built
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Reply> {
        let id = self.supervisor.next_request_id();
        let request = JsonRpcRequest::tool_call(id, name, arguments)?;
        log::info!("Calling MCP tool {name} (request {id})");
        self.supervisor.send(&request.to_value()?).await
    }

    /// List the tools the server offers
    ///
    /// # Errors
    /// Returns error if the supervisor is not running
    pub async fn list_tools(&self) -> Result<Reply> {
        let id = self.supervisor.next_request_id();
        self.supervisor
            .send(&JsonRpcRequest::list_tools(id).to_value()?)
            .await
    }
}
