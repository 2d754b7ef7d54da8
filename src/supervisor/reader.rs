//! Pipe readers for the child's stdout and stderr
//!
//! Each reader is a tokio task framing its pipe into lines. It stops on EOF,
//! on a read error, or when the supervisor's cancellation token fires; the
//! pipe is dropped with the task, so a pending read never outlives `stop`.
//! An over-long line is reported and skipped without ending the reader.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::DiagnosticSink;

use super::channel::ResponseSender;
use super::codec::{CappedLines, Frame};

/// Why a reader loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReaderExit {
    /// The pipe reached end-of-stream
    Eof,
    /// The cancellation token fired
    Cancelled,
    /// Reading failed
    Failed,
    /// Nobody consumes lines any more
    Abandoned,
}

/// Spawn the stdout reader: every non-empty line goes onto the Response Channel
///
/// Over-long lines are enqueued as [`Frame::Oversized`] so the waiting `send`
/// fails fast instead of timing out.
pub(crate) fn spawn_stdout_reader<R>(
    stdout: R,
    responses: ResponseSender,
    cancel: CancellationToken,
    max_line_bytes: usize,
    tag: String,
) -> JoinHandle<ReaderExit>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let exit = read_lines(stdout, &cancel, max_line_bytes, &tag, "stdout", |frame| {
            if let Frame::Line(ref line) = frame {
                log::debug!("[{tag}] <- {line}");
            }
            responses.push(frame)
        })
        .await;
        log::debug!("[{tag}] stdout reader finished: {exit:?}");
        exit
    })
}

/// Spawn the stderr reader: lines go to the diagnostic sink and are never replies
pub(crate) fn spawn_stderr_reader<R>(
    stderr: R,
    sink: Arc<dyn DiagnosticSink>,
    cancel: CancellationToken,
    max_line_bytes: usize,
    tag: String,
) -> JoinHandle<ReaderExit>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let exit = read_lines(stderr, &cancel, max_line_bytes, &tag, "stderr", |frame| {
            match frame {
                Frame::Line(line) => sink.line(&line),
                Frame::Oversized { preview, .. } => sink.line(&preview),
            }
            true
        })
        .await;
        log::debug!("[{tag}] stderr reader finished: {exit:?}");
        exit
    })
}

async fn read_lines<R, F>(
    pipe: R,
    cancel: &CancellationToken,
    max_line_bytes: usize,
    tag: &str,
    stream: &str,
    mut on_line: F,
) -> ReaderExit
where
    R: AsyncRead + Unpin,
    F: FnMut(Frame) -> bool,
{
    let mut frames = FramedRead::new(pipe, CappedLines::new(max_line_bytes));

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReaderExit::Cancelled,
            next = frames.next() => next,
        };

        match next {
            Some(Ok(Frame::Line(line))) if line.trim().is_empty() => {}
            Some(Ok(frame)) => {
                if let Frame::Oversized { limit, .. } = &frame {
                    log::warn!("[{tag}] {stream} line exceeded {limit} bytes, skipped");
                }
                if !on_line(frame) {
                    return ReaderExit::Abandoned;
                }
            }
            Some(Err(e)) => {
                log::warn!("[{tag}] {stream} read failed: {e}");
                return ReaderExit::Failed;
            }
            None => return ReaderExit::Eof,
        }
    }
}
