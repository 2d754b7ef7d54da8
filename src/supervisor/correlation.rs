//! Command/reply correlation for `send` and `notify`

use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

use crate::error::{Result, SupervisorError};
use crate::message::{parse_reply, reply_id};
use crate::types::{Correlation, Reply, RequestId};

use super::channel::RecvOutcome;
use super::codec::Frame;
use super::{CommandPipe, ProcessSupervisor};

impl ProcessSupervisor {
    /// Write a command and wait for the reply that belongs to it
    pub(super) async fn send_impl(&self, command: &Value) -> Result<Reply> {
        self.ensure_running().await?;

        let mut guard = self.pipe.lock().await;
        let pipe = guard.as_mut().ok_or(SupervisorError::NotRunning)?;

        let (payload, expected) = self.encode(command)?;
        let tag = self.tag();
        log::debug!("[{tag}] -> {payload}");

        if let Err(e) = pipe.write_line(&payload).await {
            log::warn!("[{tag}] Failed to write command: {e}");
            return Ok(Reply::io(format!("Failed to write to MCP process: {e}")));
        }
        self.commands_sent.fetch_add(1, Ordering::SeqCst);

        let timeout = self.options.response_timeout;
        let deadline = Instant::now() + timeout;
        let reply = match expected {
            Some(id) => await_matching(pipe, id, deadline, timeout, &tag).await,
            None => await_next(pipe, deadline, timeout).await,
        };

        match &reply {
            Reply::Response { .. } => {
                self.responses_received.fetch_add(1, Ordering::SeqCst);
            }
            Reply::Timeout { .. } => log::warn!("[{tag}] No response from MCP process."),
            Reply::Malformed { raw, error } => {
                log::warn!("[{tag}] Reply is not valid JSON ({error}): {raw}");
            }
            Reply::Io { message } => log::warn!("[{tag}] {message}"),
        }
        Ok(reply)
    }

    /// Write a line that expects no reply
    pub(super) async fn notify_impl(&self, message: &Value) -> Result<()> {
        self.ensure_running().await?;

        let mut guard = self.pipe.lock().await;
        let pipe = guard.as_mut().ok_or(SupervisorError::NotRunning)?;

        let payload = serde_json::to_string(message)?;
        log::debug!("[{}] -> {payload}", self.tag());
        pipe.write_line(&payload).await?;
        self.commands_sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Serialize a command, stamping an id when correlating by id
    fn encode(&self, command: &Value) -> Result<(String, Option<RequestId>)> {
        match (self.options.correlation, command) {
            (Correlation::ById, Value::Object(fields)) => {
                let id = self.next_request_id();
                let mut fields = fields.clone();
                fields.insert("id".to_string(), Value::from(id.get()));
                Ok((serde_json::to_string(&fields)?, Some(id)))
            }
            _ => Ok((serde_json::to_string(command)?, None)),
        }
    }
}

impl CommandPipe {
    /// Write `payload` plus a newline and flush, giving up if the supervisor stops
    async fn write_line(&mut self, payload: &str) -> std::io::Result<()> {
        let mut line = String::with_capacity(payload.len() + 1);
        line.push_str(payload);
        line.push('\n');

        let Self { stdin, cancel, .. } = self;
        let write = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "supervisor is stopping",
            )),
            result = write => result,
        }
    }
}

/// Positional correlation: the next line is the reply
async fn await_next(pipe: &mut CommandPipe, deadline: Instant, timeout: Duration) -> Reply {
    match pipe.responses.recv_until(deadline).await {
        RecvOutcome::Frame(frame) => frame_reply(frame),
        RecvOutcome::TimedOut => timed_out(timeout),
        RecvOutcome::Closed => output_closed(),
    }
}

/// Id correlation: skip replies to other (stale) requests until ours arrives
async fn await_matching(
    pipe: &mut CommandPipe,
    id: RequestId,
    deadline: Instant,
    timeout: Duration,
    tag: &str,
) -> Reply {
    loop {
        let frame = match pipe.responses.recv_until(deadline).await {
            RecvOutcome::Frame(frame) => frame,
            RecvOutcome::TimedOut => return timed_out(timeout),
            RecvOutcome::Closed => return output_closed(),
        };

        match frame_reply(frame) {
            Reply::Response { value } if reply_id(&value).is_some_and(|v| id.matches(v)) => {
                return Reply::response(value);
            }
            Reply::Response { value } => {
                log::debug!("[{tag}] Discarding reply not addressed to request {id}: {value}");
            }
            other => return other,
        }
    }
}

/// Turn a stdout frame into the caller-facing reply
fn frame_reply(frame: Frame) -> Reply {
    match frame {
        Frame::Line(line) => parse_reply(line),
        Frame::Oversized { preview, limit } => Reply::Malformed {
            raw: preview,
            error: format!("reply line exceeded {limit} bytes and was discarded"),
        },
    }
}

fn timed_out(timeout: Duration) -> Reply {
    Reply::Timeout {
        waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

fn output_closed() -> Reply {
    Reply::io("MCP process closed its output stream")
}
