//! Diagnostic sinks for the child's stderr
//!
//! The stderr reader hands every line it drains to a [`DiagnosticSink`]. The
//! default [`LogSink`] writes them through the `log` facade under the
//! `mcp_stderr` target, so `RUST_LOG=mcp_stderr=off` silences a chatty child.

use tokio::sync::mpsc;

/// Log target used by [`LogSink`]
pub const STDERR_LOG_TARGET: &str = "mcp_stderr";

/// Receiver of stderr lines from the child process
///
/// Implementations must not block: the sink is called from the drain task and
/// a slow sink lets the child's stderr pipe fill up.
pub trait DiagnosticSink: Send + Sync {
    /// Handle one line, without its trailing newline
    fn line(&self, line: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn line(&self, line: &str) {
        self(line);
    }
}

/// Default sink: every line becomes an `info` record
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn line(&self, line: &str) {
        log::info!(target: STDERR_LOG_TARGET, "[MCP Stderr] {line}");
    }
}

/// Sink forwarding lines into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiver its lines arrive on
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DiagnosticSink for ChannelSink {
    fn line(&self, line: &str) {
        // Receiver gone means nobody is listening; draining must continue regardless
        let _ = self.tx.send(line.to_string());
    }
}
