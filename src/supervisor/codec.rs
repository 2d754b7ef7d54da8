//! Line framing for the child's pipes
//!
//! Like `LinesCodec` with a length cap, except that an over-long line does not
//! end the stream: it is reported as [`Frame::Oversized`] with a short preview,
//! the rest of it is discarded up to the next newline, and framing carries on.
//! Invalid UTF-8 is replaced rather than treated as a read error.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// Bytes of an over-long line kept for diagnostics
pub(crate) const OVERSIZED_PREVIEW_BYTES: usize = 256;

/// One framed unit read from a pipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    /// A complete line without its terminator
    Line(String),
    /// A line longer than the cap; only its beginning is kept
    Oversized {
        /// First bytes of the line
        preview: String,
        /// Cap that was exceeded, in bytes
        limit: usize,
    },
}

/// Newline framing with a per-line byte cap
#[derive(Debug)]
pub(crate) struct CappedLines {
    max_length: usize,
    /// Where the newline search resumes in the buffer
    next_index: usize,
    /// Inside an over-long line, dropping bytes until its newline
    discarding: bool,
}

impl CappedLines {
    pub(crate) fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for CappedLines {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        loop {
            if self.discarding {
                match buf.iter().position(|b| *b == b'\n') {
                    Some(offset) => {
                        buf.advance(offset + 1);
                        self.discarding = false;
                    }
                    None => {
                        buf.clear();
                        return Ok(None);
                    }
                }
            }

            let read_to = buf.len().min(self.max_length.saturating_add(1));
            let newline = buf[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n');

            match newline {
                Some(offset) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let line = buf.split_to(end + 1);
                    return Ok(Some(Frame::Line(decode_line(&line[..end]))));
                }
                None if buf.len() > self.max_length => {
                    let preview_len = buf.len().min(OVERSIZED_PREVIEW_BYTES);
                    let preview = String::from_utf8_lossy(&buf[..preview_len]).into_owned();
                    buf.advance(self.max_length);
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(Some(Frame::Oversized {
                        preview,
                        limit: self.max_length,
                    }));
                }
                None => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        if self.discarding || buf.is_empty() {
            self.discarding = false;
            buf.clear();
            return Ok(None);
        }
        // Final line without a trailing newline
        let line = buf.split_to(buf.len());
        Ok(Some(Frame::Line(decode_line(&line))))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
