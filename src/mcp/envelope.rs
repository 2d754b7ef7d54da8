//! JSON-RPC 2.0 envelopes used by MCP stdio servers

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::types::RequestId;

/// JSON-RPC version string carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision announced in `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// A request that expects exactly one reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// Request id echoed by the server
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A message the server never answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Parameters of a `tools/call` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    /// Tool name
    pub name: String,
    /// Tool arguments object
    pub arguments: Value,
}

impl JsonRpcRequest {
    /// Create a request
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// `tools/call` request for one tool invocation
    ///
    /// A `null` argument value is sent as an empty object; servers reject a
    /// missing arguments object for tools without parameters.
    ///
    /// # Errors
    /// Returns error if the parameters cannot be serialized
    pub fn tool_call(id: RequestId, name: impl Into<String>, arguments: Value) -> Result<Self> {
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        let params = serde_json::to_value(ToolCallParams {
            name: name.into(),
            arguments,
        })?;
        Ok(Self::new(id, "tools/call", Some(params)))
    }

    /// `tools/list` request
    #[must_use]
    pub fn list_tools(id: RequestId) -> Self {
        Self::new(id, "tools/list", None)
    }

    /// `initialize` handshake request
    #[must_use]
    pub fn initialize(id: RequestId, client_name: &str, client_version: &str) -> Self {
        Self::new(
            id,
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": client_name, "version": client_version },
            })),
        )
    }

    /// Convert into a JSON value for [`ProcessSupervisor::send`](crate::ProcessSupervisor::send)
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl JsonRpcNotification {
    /// Create a notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }

    /// `notifications/initialized`, sent once the handshake reply arrived
    #[must_use]
    pub fn initialized() -> Self {
        Self::new("notifications/initialized", None)
    }

    /// Convert into a JSON value for [`ProcessSupervisor::notify`](crate::ProcessSupervisor::notify)
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
