//! Decoder for bodies delimited by the connection closing.
//!
//! Used when a response declares neither a Content-Length nor a chunked transfer
//! encoding, typically HTTP/1.0 responses. The body never ends on its own; the transport
//! has to report that no more bytes will arrive.

use std::fmt;

use bytes::BytesMut;
use tracing::trace;

use crate::protocol::{Decoded, PayloadBatch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UntilCloseDecoder {
    received: u64,
    closed: bool,
}

impl UntilCloseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Passes all of `src` through as one unit.
    pub fn decode_buf(&mut self, src: &mut BytesMut) -> Decoded {
        let mut batch = PayloadBatch::new();
        if !src.is_empty() {
            let bytes = src.split().freeze();
            trace!(len = bytes.len(), "read until close bytes");
            self.received += bytes.len() as u64;
            batch.push(bytes);
        }

        if self.closed { Decoded::Complete(batch) } else { Decoded::Partial(batch) }
    }

    /// Marks the connection as closed; the body is complete.
    pub fn close(&mut self) -> Decoded {
        trace!(received = self.received, "connection closed, completing body");
        self.closed = true;
        Decoded::Complete(PayloadBatch::new())
    }
}

impl fmt::Display for UntilCloseDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read until close content, bytes received: {}", self.received)
    }
}
