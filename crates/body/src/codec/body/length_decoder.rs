//! Decoder implementation for HTTP bodies with a Content-Length header.
//!
//! This module provides functionality to decode bodies whose size is specified by the
//! Content-Length header, as defined in
//! [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112#section-6.3).

use std::fmt;

use bytes::BytesMut;
use tracing::trace;

use crate::protocol::{Decoded, PayloadBatch};

/// A decoder for handling HTTP bodies with a known content length.
///
/// The decoder counts bytes only; no line delimiters are involved, and bytes past the
/// declared length are never consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The total content length, specified by the Content-Length header
    length: u64,
    /// The number of bytes remaining to be read from the body
    remaining: u64,
}

impl LengthDecoder {
    /// Creates a new `LengthDecoder` instance.
    ///
    /// # Arguments
    /// * `length` - The total content length to decode, specified by Content-Length header
    pub fn new(length: u64) -> Self {
        Self { length, remaining: length }
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    #[inline]
    pub fn received(&self) -> u64 {
        self.length - self.remaining
    }

    /// Splits at most the remaining number of bytes off `src`.
    ///
    /// A zero-length body completes on the first call, whatever `src` holds.
    pub fn decode_buf(&mut self, src: &mut BytesMut) -> Decoded {
        let mut batch = PayloadBatch::new();

        if self.remaining > 0 && !src.is_empty() {
            // Read the minimum of remaining length and available bytes
            let len = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(src.len());
            batch.push(src.split_to(len).freeze());
            self.remaining -= len as u64;
            trace!(len, remaining = self.remaining, length = self.length, "read fixed length bytes");
        }

        if self.remaining == 0 {
            trace!(length = self.length, "got all expected bytes");
            Decoded::Complete(batch)
        } else {
            Decoded::Partial(batch)
        }
    }
}

impl fmt::Display for LengthDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fixed content-length: {}, bytes received: {}", self.length, self.received())
    }
}
