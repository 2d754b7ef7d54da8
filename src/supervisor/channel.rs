//! Response Channel between the stdout reader and `send`
//!
//! Unbounded FIFO: the reader never blocks on push, and the consumer waits
//! with a deadline. A new channel is created for every running period.

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::codec::Frame;

/// Producer half, owned by the stdout reader
#[derive(Debug)]
pub(crate) struct ResponseSender {
    tx: mpsc::UnboundedSender<Frame>,
}

/// Consumer half, owned by the command pipe
#[derive(Debug)]
pub(crate) struct ResponseReceiver {
    rx: mpsc::UnboundedReceiver<Frame>,
}

/// Result of waiting on the channel
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RecvOutcome {
    /// The oldest queued frame
    Frame(Frame),
    /// Deadline passed with nothing queued
    TimedOut,
    /// The reader has exited and everything queued has been consumed
    Closed,
}

/// Create a connected sender/receiver pair
pub(crate) fn response_channel() -> (ResponseSender, ResponseReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResponseSender { tx }, ResponseReceiver { rx })
}

impl ResponseSender {
    /// Enqueue a frame; `false` once the receiver is gone
    pub(crate) fn push(&self, frame: Frame) -> bool {
        self.tx.send(frame).is_ok()
    }
}

impl ResponseReceiver {
    /// Wait for the next frame until `deadline`
    pub(crate) async fn recv_until(&mut self, deadline: Instant) -> RecvOutcome {
        match tokio::time::timeout_at(deadline, self.rx.recv()).await {
            Ok(Some(frame)) => RecvOutcome::Frame(frame),
            Ok(None) => RecvOutcome::Closed,
            Err(_) => RecvOutcome::TimedOut,
        }
    }
}
