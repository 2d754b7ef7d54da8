//! Process supervisor for a long-running MCP server child
//!
//! [`ProcessSupervisor`] owns one child process at a time. It writes one JSON
//! command per line to the child's stdin and hands back the matching line from
//! stdout, while two background readers drain stdout into the Response Channel
//! and stderr into a [`DiagnosticSink`](crate::diagnostics::DiagnosticSink).
//!
//! # Locking
//!
//! - `process` guards the child handle. `start`, `stop` and the liveness check
//!   take it; `start` holds it through the settle delay so `stop` cannot
//!   interleave with a start.
//! - `pipe` guards stdin and the reply receiver. Holding it for a whole
//!   write-then-wait cycle is what serializes concurrent `send` calls.
//! - Lock order is always `process` then `pipe`; `send` never holds `pipe`
//!   while waiting for `process`.

pub(crate) mod channel;
pub(crate) mod codec;
mod command;
pub mod config;
mod correlation;
mod lifecycle;
pub(crate) mod reader;
mod signal;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::process::{Child, ChildStdin};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::Result;
use crate::types::{
    RequestId, Reply, SupervisorId, SupervisorOptions, SupervisorState, SupervisorStatus,
};

use channel::ResponseReceiver;
use reader::ReaderExit;

/// The running child and everything tied to its lifetime
pub(super) struct ChildProcess {
    pub(super) child: Child,
    pub(super) pid: Option<u32>,
    pub(super) cancel: CancellationToken,
    pub(super) stdout_task: JoinHandle<ReaderExit>,
    pub(super) stderr_task: JoinHandle<ReaderExit>,
}

/// Write side of the child plus the reply queue, used by one caller at a time
pub(super) struct CommandPipe {
    pub(super) stdin: ChildStdin,
    pub(super) responses: ResponseReceiver,
    pub(super) cancel: CancellationToken,
}

/// Synchronously readable snapshot of the lifecycle
#[derive(Debug, Default)]
pub(super) struct RunState {
    pub(super) state: SupervisorState,
    pub(super) pid: Option<u32>,
    pub(super) started_at: Option<DateTime<Utc>>,
}

/// Supervisor for one external MCP server process
///
/// Create one per child you want to manage and share it with `Arc` if several
/// tasks issue commands; `send` is internally serialized.
///
/// ```no_run
/// use mcp_process_supervisor::{ProcessSupervisor, SupervisorOptions};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let supervisor = ProcessSupervisor::new(SupervisorOptions::default());
/// supervisor.start().await?;
///
/// let reply = supervisor.send(&json!({"method": "ping"})).await?;
/// if let Some(value) = reply.value() {
///     log::info!("child answered: {value}");
/// }
///
/// supervisor.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct ProcessSupervisor {
    pub(super) id: SupervisorId,
    pub(super) options: SupervisorOptions,
    pub(super) sink: Arc<dyn DiagnosticSink>,
    pub(super) run: Mutex<RunState>,
    pub(super) process: tokio::sync::Mutex<Option<ChildProcess>>,
    pub(super) pipe: tokio::sync::Mutex<Option<CommandPipe>>,
    pub(super) next_request_id: AtomicU64,
    pub(super) commands_sent: AtomicU64,
    pub(super) responses_received: AtomicU64,
}

impl ProcessSupervisor {
    /// Create a stopped supervisor
    #[must_use]
    pub fn new(options: SupervisorOptions) -> Self {
        let sink = options
            .diagnostics
            .clone()
            .unwrap_or_else(|| Arc::new(LogSink));

        Self {
            id: SupervisorId::new(),
            options,
            sink,
            run: Mutex::new(RunState::default()),
            process: tokio::sync::Mutex::new(None),
            pipe: tokio::sync::Mutex::new(None),
            next_request_id: AtomicU64::new(1),
            commands_sent: AtomicU64::new(0),
            responses_received: AtomicU64::new(0),
        }
    }

    /// Spawn the child and its pipe readers
    ///
    /// Does nothing (beyond a log line) if the child is already running. Waits
    /// for the configured settle delay before returning so the child can get
    /// ready for its first command.
    ///
    /// # Errors
    /// Returns `SupervisorError::Launch` if the child cannot be spawned or dies
    /// during the settle delay; the supervisor is then left stopped.
    pub async fn start(&self) -> Result<()> {
        self.start_impl().await
    }

    /// Send one command and wait for its reply
    ///
    /// The command is written as a single JSON line and flushed. The returned
    /// [`Reply`] is a timeout, malformed-line, or I/O outcome when the exchange
    /// did not produce a well-formed reply.
    ///
    /// # Errors
    /// Returns `SupervisorError::NotRunning` without writing anything if the
    /// child is not running, and `SupervisorError::Serialize` if the command
    /// cannot be encoded.
    pub async fn send(&self, command: &serde_json::Value) -> Result<Reply> {
        self.send_impl(command).await
    }

    /// Write one line without waiting for a reply
    ///
    /// For JSON-RPC notifications, which the child never answers.
    ///
    /// # Errors
    /// Returns `SupervisorError::NotRunning` if the child is not running and
    /// `SupervisorError::Io` if the write fails.
    pub async fn notify(&self, message: &serde_json::Value) -> Result<()> {
        self.notify_impl(message).await
    }

    /// Terminate the child and its readers
    ///
    /// Idempotent. Escalates to a forced kill after the grace period, so it
    /// always returns within roughly grace period + reader join timeout.
    pub async fn stop(&self) {
        self.stop_impl().await;
    }

    /// Check whether the child is still alive, tearing down after an unexpected exit
    pub async fn is_alive(&self) -> bool {
        self.ensure_running().await.is_ok()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        self.run.lock().state
    }

    /// Whether the supervisor currently accepts commands
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == SupervisorState::Running
    }

    /// OS process id of the child, if one exists
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.run.lock().pid
    }

    /// Instance identifier
    #[must_use]
    pub fn id(&self) -> SupervisorId {
        self.id
    }

    /// Options this supervisor was created with
    #[must_use]
    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    /// Serializable status snapshot
    #[must_use]
    pub fn status(&self) -> SupervisorStatus {
        let run = self.run.lock();
        let uptime_ms = run.started_at.map(|started| {
            u64::try_from(Utc::now().signed_duration_since(started).num_milliseconds())
                .unwrap_or(0)
        });

        SupervisorStatus {
            id: self.id,
            state: run.state,
            pid: run.pid,
            started_at: run.started_at,
            uptime_ms,
            commands_sent: self.commands_sent.load(Ordering::SeqCst),
            responses_received: self.responses_received.load(Ordering::SeqCst),
        }
    }

    /// Allocate the next request id
    #[must_use]
    pub fn next_request_id(&self) -> RequestId {
        RequestId::new(self.next_request_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(super) fn set_state(&self, state: SupervisorState) {
        let mut run = self.run.lock();
        log::debug!("[{}] {} -> {}", self.tag(), run.state, state);
        run.state = state;
        if state == SupervisorState::Stopped {
            run.pid = None;
            run.started_at = None;
        }
    }

    pub(super) fn tag(&self) -> String {
        format!("mcp-{}", self.id.short())
    }
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("pid", &self.pid())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.drop_impl();
    }
}
