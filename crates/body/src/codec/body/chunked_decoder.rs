//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module provides functionality to decode HTTP bodies that use chunked transfer encoding
//! as specified in [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! The decoder is fed whole input buffers. Each call consumes as much of the buffer as the
//! current body needs and returns every data "hunk" found in it as one [`PayloadBatch`].
//! Chunk-size lines, trailing CRLFs and the last chunk may be split across buffers at any byte.

use std::fmt;
use std::task::Poll;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::body::chunk_size::ChunkSizeScanner;
use crate::protocol::{Decoded, FramingError, PayloadBatch};
use ChunkedState::*;

/// Number of bytes terminating a chunk's data, and the last chunk
const CRLF_LEN: u8 = 2;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal, optionally followed by extensions
/// - Then the chunk data and CRLF
/// - A zero-sized chunk followed by CRLF ends the body
///
/// The CRLF after chunk data and after the last chunk is skipped by count. Trailer fields
/// after the last chunk are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    scanner: ChunkSizeScanner,
    remaining_in_chunk: u64,
    bytes_to_consume: u8,
    last_chunk: bool,
    received: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read a chunk-size line, or the CRLF after the last chunk
    ReadingLength,
    /// Read chunk data, then the CRLF after it
    ReadingData,
    /// The last chunk and its CRLF were read
    Done,
}

impl ChunkedDecoder {
    /// Creates a new `ChunkedDecoder` ready to read the size of the first chunk.
    pub fn new() -> Self {
        Self::with_scanner(ChunkSizeScanner::new())
    }

    /// Creates a decoder whose chunk-size lines may hold at most `max_header_size`
    /// digit and extension bytes.
    pub fn with_max_header_size(max_header_size: usize) -> Self {
        Self::with_scanner(ChunkSizeScanner::with_max_header_size(max_header_size))
    }

    fn with_scanner(scanner: ChunkSizeScanner) -> Self {
        Self { state: ReadingLength, scanner, remaining_in_chunk: 0, bytes_to_consume: 0, last_chunk: false, received: 0 }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.state == Done
    }

    /// Number of chunk data bytes decoded so far.
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Decodes as much of `src` as this body needs.
    ///
    /// Consumed bytes are split off `src`; once the body is complete, any bytes after the
    /// last CRLF are left in `src` for the next message.
    ///
    /// # Returns
    /// - `Ok(Decoded::Partial(batch))` when `src` was exhausted before the body ended
    /// - `Ok(Decoded::Complete(batch))` when the last chunk was read
    /// - `Err(FramingError)` if the chunked encoding is invalid; the batch for this call is dropped
    pub fn decode_buf(&mut self, src: &mut BytesMut) -> Result<Decoded, FramingError> {
        let mut batch = PayloadBatch::new();

        loop {
            if self.bytes_to_consume > 0 {
                if self.consume_crlf(src) > 0 {
                    trace!(bytes_to_consume = self.bytes_to_consume, "need more data for CRLF");
                    break;
                }

                if self.last_chunk {
                    debug!("read last chunk, chunked body finished");
                    self.state = Done;
                } else {
                    trace!("ready to read next chunk");
                    self.state = ReadingLength;
                }
            }

            match self.state {
                Done => return Ok(Decoded::Complete(batch)),

                ReadingLength => match self.scanner.scan(src) {
                    Poll::Pending => break,
                    Poll::Ready(Ok(0)) => {
                        self.last_chunk = true;
                        self.bytes_to_consume = CRLF_LEN;
                    }
                    Poll::Ready(Ok(length)) => {
                        trace!(length, "read chunk size");
                        self.remaining_in_chunk = length;
                        self.state = ReadingData;
                    }
                    Poll::Ready(Err(e)) => {
                        debug!(cause = %e, "invalid chunk size line");
                        return Err(e);
                    }
                },

                ReadingData => {
                    if src.is_empty() {
                        break;
                    }

                    // cap remaining bytes at the max capacity of usize
                    let remaining = usize::try_from(self.remaining_in_chunk).unwrap_or(usize::MAX);
                    let read_size = remaining.min(src.len());
                    let bytes = src.split_to(read_size).freeze();
                    trace!(len = bytes.len(), "read chunked bytes");

                    self.remaining_in_chunk -= read_size as u64;
                    self.received += read_size as u64;
                    batch.push(bytes);

                    if self.remaining_in_chunk == 0 {
                        self.bytes_to_consume = CRLF_LEN;
                    }
                }
            }
        }

        Ok(Decoded::Partial(batch))
    }

    /// Skips up to `bytes_to_consume` bytes of CRLF, returning how many are still missing.
    fn consume_crlf(&mut self, src: &mut BytesMut) -> u8 {
        let expected: &[u8] = &b"\r\n"[usize::from(CRLF_LEN - self.bytes_to_consume)..];
        let n = expected.len().min(src.len());

        if src[..n] != expected[..n] {
            debug!(got = ?&src[..n], "unexpected bytes in place of CRLF, skipping them");
        }

        src.advance(n);
        // n is at most 2
        self.bytes_to_consume -= n as u8;
        self.bytes_to_consume
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChunkedDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunked transfer encoding, state: {:?}", self.state)
    }
}
