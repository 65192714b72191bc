//! Scanner for the chunk-size line of chunked transfer encoding.
//!
//! The grammar is `chunk-size [ chunk-ext ] CRLF` as in
//! [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1). Extensions
//! are not interpreted: every byte between the last hex digit and the CR is counted and
//! skipped, and only the combined size of digits and extension bytes is bounded.

use bytes::{Buf, BytesMut};
use std::task::Poll;
use tracing::debug;

use crate::ensure;
use crate::protocol::FramingError;

/// Maximum combined number of digit and extension bytes in one chunk-size line
pub const MAX_CHUNK_HEADER_SIZE: usize = 2050;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Incremental chunk-size line parser.
///
/// The scanner keeps its cursor between calls, so a chunk-size line may be split over
/// any number of input buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSizeScanner {
    partial_length: u64,
    digits: usize,
    extension: usize,
    saw_cr: bool,
    max_header_size: usize,
}

impl ChunkSizeScanner {
    pub fn new() -> Self {
        Self::with_max_header_size(MAX_CHUNK_HEADER_SIZE)
    }

    pub fn with_max_header_size(max_header_size: usize) -> Self {
        Self { partial_length: 0, digits: 0, extension: 0, saw_cr: false, max_header_size }
    }

    /// Consumes bytes from `src` until a full chunk-size line has been read.
    ///
    /// # Returns
    /// - `Poll::Ready(Ok(len))` once the terminating LF was consumed; the cursor is reset
    /// - `Poll::Pending` if `src` ran out first; call again with the next buffer
    /// - `Poll::Ready(Err(_))` if the line is malformed or too long
    pub fn scan(&mut self, src: &mut BytesMut) -> Poll<Result<u64, FramingError>> {
        while src.has_remaining() {
            match self.scan_byte(src.get_u8()) {
                Ok(Some(length)) => return Poll::Ready(Ok(length)),
                Ok(None) => {}
                Err(e) => return Poll::Ready(Err(e)),
            }
        }

        Poll::Pending
    }

    fn scan_byte(&mut self, b: u8) -> Result<Option<u64>, FramingError> {
        let header_size = self.digits + self.extension;
        ensure!(header_size < self.max_header_size, FramingError::chunk_header_too_long(header_size));

        if self.saw_cr {
            ensure!(b == LF, FramingError::InvalidChunkHeader);
            let length = self.partial_length;
            self.reset();
            return Ok(Some(length));
        }

        if b == CR {
            if self.digits == 0 {
                debug!("chunk-size line without digits, reading it as the last chunk");
            }
            self.saw_cr = true;
        } else if self.extension > 0 {
            self.extension += 1;
        } else if let Some(digit) = hex_digit(b) {
            self.partial_length = self
                .partial_length
                .checked_mul(16)
                .and_then(|l| l.checked_add(u64::from(digit)))
                .ok_or(FramingError::ChunkSizeOverflow)?;
            self.digits += 1;
        } else if self.digits > 0 {
            debug!(byte = b, "skipping chunk extension");
            self.extension += 1;
        } else {
            return Err(FramingError::invalid_chunk_size(b));
        }

        Ok(None)
    }

    fn reset(&mut self) {
        self.partial_length = 0;
        self.digits = 0;
        self.extension = 0;
        self.saw_cr = false;
    }
}

impl Default for ChunkSizeScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
