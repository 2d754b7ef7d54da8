//! Reply line parser

use serde_json::Value;

use crate::types::reply::Reply;

/// Parse one stdout line into a [`Reply`]
///
/// A line that is not valid JSON becomes [`Reply::Malformed`] carrying the raw
/// text, so callers always receive a well-formed result.
///
/// # Arguments
/// * `line` - Raw line from the Response Channel, without its newline
#[must_use]
pub fn parse_reply(line: String) -> Reply {
    match serde_json::from_str::<Value>(line.trim()) {
        Ok(value) => Reply::response(value),
        Err(e) => Reply::Malformed {
            raw: line,
            error: e.to_string(),
        },
    }
}

/// The `id` member of a JSON-RPC style reply, if present
#[must_use]
pub fn reply_id(value: &Value) -> Option<&Value> {
    value.as_object().and_then(|obj| obj.get("id"))
}
