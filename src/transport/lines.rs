//! Bounded newline-delimited reader for inbound client lines
//!
//! Never buffers more than `max_len` bytes of one line. A line over the cap
//! is reported once and its remaining bytes are skipped up to the next
//! newline. Bytes that are not UTF-8 are reported without closing the stream.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// One inbound line, or the reason it was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    Text(String),
    InvalidUtf8,
    TooLong,
}

pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_len: usize,
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R, max_len: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
            max_len: max_len.max(1),
            discarding: false,
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    ///
    /// Cancel safe: partial input stays buffered for the next call.
    pub async fn next_line(&mut self) -> io::Result<Option<InboundLine>> {
        loop {
            // Holds at most max_len + 1 bytes, one past the cap to detect overflow
            let limit = (self.max_len + 1).saturating_sub(self.buf.len()) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buf)
                .await?;

            if self.buf.last() == Some(&b'\n') {
                let tail_of_oversized = std::mem::replace(&mut self.discarding, false);
                let line = self.take_line();
                if tail_of_oversized {
                    continue;
                }
                return Ok(Some(line));
            }

            if read == 0 {
                if self.buf.is_empty() || self.discarding {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            if self.buf.len() > self.max_len {
                self.buf.clear();
                if !self.discarding {
                    self.discarding = true;
                    return Ok(Some(InboundLine::TooLong));
                }
            }
        }
    }

    fn take_line(&mut self) -> InboundLine {
        let mut bytes = std::mem::take(&mut self.buf);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        match String::from_utf8(bytes) {
            Ok(text) => InboundLine::Text(text),
            Err(_) => InboundLine::InvalidUtf8,
        }
    }
}
