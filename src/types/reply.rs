//! Structured outcome of a single command exchange

use serde::Serialize;
use serde_json::{Value, json};

/// What came back from the child for one `send`
///
/// Everything that can go wrong after the supervisor accepted a command is a
/// variant here rather than an error, so a caller running a sequence of
/// commands can decide per step whether to carry on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// A well-formed JSON reply
    Response {
        /// Parsed reply line
        value: Value,
    },
    /// No line arrived within the response timeout
    Timeout {
        /// Timeout that elapsed, in milliseconds
        waited_ms: u64,
    },
    /// A line arrived but was not valid JSON
    Malformed {
        /// The raw line as read from stdout
        raw: String,
        /// Parser error message
        error: String,
    },
    /// Writing the command or reading the reply failed
    Io {
        /// Underlying failure
        message: String,
    },
}

impl Reply {
    /// Wrap a parsed reply
    #[must_use]
    pub const fn response(value: Value) -> Self {
        Self::Response { value }
    }

    /// Create an I/O failure reply
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Whether the child produced a well-formed reply
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Response { .. })
    }

    /// Whether the wait ran out without a reply
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Borrow the reply value, if any
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Response { value } => Some(value),
            _ => None,
        }
    }

    /// Convert into the parsed reply or the failure description
    ///
    /// # Errors
    /// Returns the failure message for every variant except `Response`
    pub fn into_result(self) -> std::result::Result<Value, String> {
        match self {
            Self::Response { value } => Ok(value),
            other => Err(other.failure_message()),
        }
    }

    /// Render the reply as the JSON object handed to callers
    ///
    /// Failures become `{"status":"error","message":...}`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Response { value } => value,
            other => json!({ "status": "error", "message": other.failure_message() }),
        }
    }

    fn failure_message(&self) -> String {
        match self {
            Self::Response { .. } => String::new(),
            Self::Timeout { waited_ms } => {
                format!("No response from MCP process after {waited_ms} ms.")
            }
            Self::Malformed { raw, error } => {
                format!("Malformed response from MCP process ({error}): {raw}")
            }
            Self::Io { message } => message.clone(),
        }
    }
}
