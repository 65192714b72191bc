//! Decoder implementation for HTTP message bodies.
//!
//! This module provides a unified decoder for the three ways a response body can be framed:
//! - Content-Length based bodies
//! - Chunked transfer encoding
//! - Bodies delimited by the connection closing
//!
//! The framer is selected once per body from its [`FramingDeclaration`].

use std::fmt;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::chunk_size::MAX_CHUNK_HEADER_SIZE;
use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::codec::body::until_close_decoder::UntilCloseDecoder;
use crate::protocol::{
    BodyError, ContentLength, Decoded, FramingDeclaration, FramingError, PayloadItem, PayloadSize, TransferEncoding,
};

/// A unified decoder for handling HTTP message bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
    /// Set once `Eof` was handed out by the streaming decoder
    eof: bool,
    /// The streaming decoder still owes an `Eof` after a final data item
    pending_eof: bool,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode body with a fixed content length
    Length(LengthDecoder),

    /// Decode body using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Pass the body through until the connection closes
    UntilClose(UntilCloseDecoder),
}

impl PayloadDecoder {
    fn new(kind: Kind) -> Self {
        Self { kind, eof: false, pending_eof: false }
    }

    /// Creates a PayloadDecoder for chunked transfer encoding.
    pub fn chunked() -> Self {
        Self::new(Kind::Chunked(ChunkedDecoder::new()))
    }

    /// Creates a PayloadDecoder for a fixed-length body.
    ///
    /// # Arguments
    /// * `size` - The expected content length in bytes
    pub fn fix_length(size: u64) -> Self {
        Self::new(Kind::Length(LengthDecoder::new(size)))
    }

    /// Creates a PayloadDecoder for a body delimited by the connection closing.
    pub fn until_close() -> Self {
        Self::new(Kind::UntilClose(UntilCloseDecoder::new()))
    }

    /// Selects the decoder for a body from its framing declaration.
    ///
    /// | content length | transfer-encoding | decoder |
    /// |---|---|---|
    /// | until close | ignored | until close |
    /// | from headers | chunked | chunked |
    /// | from headers | absent or other | error |
    /// | known | ignored | fixed length |
    pub fn from_declaration(declaration: &FramingDeclaration) -> Result<Self, FramingError> {
        Self::from_declaration_with_limit(declaration, MAX_CHUNK_HEADER_SIZE)
    }

    /// Same as [`PayloadDecoder::from_declaration`], bounding chunk-size lines to
    /// `max_chunk_header_size` bytes.
    pub fn from_declaration_with_limit(
        declaration: &FramingDeclaration,
        max_chunk_header_size: usize,
    ) -> Result<Self, FramingError> {
        let kind = match (declaration.content_length(), declaration.transfer_encoding()) {
            (ContentLength::UntilClose, _) => Kind::UntilClose(UntilCloseDecoder::new()),
            (ContentLength::Known(length), _) => Kind::Length(LengthDecoder::new(length)),
            (ContentLength::FromHeaders, TransferEncoding::Chunked) => {
                Kind::Chunked(ChunkedDecoder::with_max_header_size(max_chunk_header_size))
            }
            (ContentLength::FromHeaders, TransferEncoding::Absent) => {
                return Err(FramingError::invalid_content("neither content-length nor transfer-encoding declared"));
            }
            (ContentLength::FromHeaders, TransferEncoding::Other(coding)) => {
                return Err(FramingError::invalid_content(format!("unsupported transfer-encoding {coding}")));
            }
        };

        let decoder = Self::new(kind);
        trace!(%decoder, "selected body decoder");
        Ok(decoder)
    }

    /// The size of the body, as far as it is known before decoding.
    pub fn payload_size(&self) -> PayloadSize {
        match &self.kind {
            Kind::Length(length_decoder) => PayloadSize::Length(length_decoder.length()),
            Kind::Chunked(_) => PayloadSize::Chunked,
            Kind::UntilClose(_) => PayloadSize::UntilClose,
        }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this decoder handles fixed-length bodies.
    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    /// Returns whether this decoder reads until the connection closes.
    pub fn is_until_close(&self) -> bool {
        matches!(self.kind, Kind::UntilClose(_))
    }

    /// Number of body bytes decoded so far.
    pub fn received(&self) -> u64 {
        match &self.kind {
            Kind::Length(length_decoder) => length_decoder.received(),
            Kind::UntilClose(until_close_decoder) => until_close_decoder.received(),
            Kind::Chunked(chunked_decoder) => chunked_decoder.received(),
        }
    }

    /// Decodes as much of one input buffer as the body needs.
    ///
    /// Delegates to the selected framer; see [`Decoded`] for the result.
    pub fn decode_buf(&mut self, src: &mut BytesMut) -> Result<Decoded, FramingError> {
        match &mut self.kind {
            Kind::Length(length_decoder) => Ok(length_decoder.decode_buf(src)),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode_buf(src),
            Kind::UntilClose(until_close_decoder) => Ok(until_close_decoder.decode_buf(src)),
        }
    }

    /// Reports that no more bytes will arrive.
    ///
    /// Completes a body read until close; for the other framings an unfinished body
    /// has been truncated.
    pub fn decode_close(&mut self) -> Result<Decoded, BodyError> {
        let received = self.received();
        match &mut self.kind {
            Kind::UntilClose(until_close_decoder) => Ok(until_close_decoder.close()),
            Kind::Length(length_decoder) if length_decoder.remaining() == 0 => Ok(Decoded::Complete(Default::default())),
            Kind::Chunked(chunked_decoder) if chunked_decoder.is_done() => Ok(Decoded::Complete(Default::default())),
            _ => Err(BodyError::unexpected_eof(received)),
        }
    }
}

impl fmt::Display for PayloadDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Length(length_decoder) => fmt::Display::fmt(length_decoder, f),
            Kind::Chunked(chunked_decoder) => fmt::Display::fmt(chunked_decoder, f),
            Kind::UntilClose(until_close_decoder) => fmt::Display::fmt(until_close_decoder, f),
        }
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => PayloadDecoder::fix_length(size),
            PayloadSize::Chunked => PayloadDecoder::chunked(),
            PayloadSize::UntilClose => PayloadDecoder::until_close(),
        }
    }
}

/// Streaming form of the decoder, for reading a body through `FramedRead`.
///
/// Each non-empty batch becomes one [`PayloadItem::Data`], followed by a single
/// [`PayloadItem::Eof`] once the body is complete.
impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = BodyError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.eof {
            return Ok(None);
        }

        if self.pending_eof {
            self.pending_eof = false;
            self.eof = true;
            return Ok(Some(PayloadItem::Eof));
        }

        let decoded = self.decode_buf(src)?;
        Ok(self.next_item(decoded))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }

        if self.eof {
            return Ok(None);
        }

        let decoded = self.decode_close()?;
        Ok(self.next_item(decoded))
    }
}

impl PayloadDecoder {
    fn next_item(&mut self, decoded: Decoded) -> Option<PayloadItem> {
        match decoded {
            Decoded::Partial(batch) if batch.is_empty() => None,
            Decoded::Partial(batch) => Some(PayloadItem::Data(batch)),
            Decoded::Complete(batch) if batch.is_empty() => {
                self.eof = true;
                Some(PayloadItem::Eof)
            }
            Decoded::Complete(batch) => {
                self.pending_eof = true;
                Some(PayloadItem::Data(batch))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_selector_table() {
        assert!(PayloadDecoder::from_declaration(&FramingDeclaration::until_close()).unwrap().is_until_close());
        assert!(PayloadDecoder::from_declaration(&FramingDeclaration::chunked()).unwrap().is_chunked());
        assert!(PayloadDecoder::from_declaration(&FramingDeclaration::fixed(3)).unwrap().is_fix_length());

        let declaration = FramingDeclaration::new(ContentLength::Known(3), TransferEncoding::Chunked);
        assert!(PayloadDecoder::from_declaration(&declaration).unwrap().is_fix_length());

        let declaration = FramingDeclaration::new(ContentLength::UntilClose, TransferEncoding::Chunked);
        assert!(PayloadDecoder::from_declaration(&declaration).unwrap().is_until_close());
    }

    #[test]
    fn test_selector_rejects_ambiguous_framing() {
        let declaration = FramingDeclaration::new(ContentLength::FromHeaders, TransferEncoding::Absent);
        assert!(matches!(PayloadDecoder::from_declaration(&declaration), Err(FramingError::InvalidContent { .. })));

        let declaration = FramingDeclaration::new(ContentLength::FromHeaders, TransferEncoding::parse("gzip"));
        assert!(matches!(PayloadDecoder::from_declaration(&declaration), Err(FramingError::InvalidContent { .. })));
    }

    #[test]
    fn test_payload_size() {
        assert_eq!(PayloadDecoder::fix_length(12).payload_size(), PayloadSize::Length(12));
        assert_eq!(PayloadDecoder::chunked().payload_size(), PayloadSize::Chunked);
        assert_eq!(PayloadDecoder::until_close().payload_size(), PayloadSize::UntilClose);
    }

    #[test]
    fn test_streaming_items() {
        let mut decoder = PayloadDecoder::chunked();
        let mut buffer = BytesMut::from(&b"3\r\nfoo\r\n0\r\n\r\n"[..]);

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.into_batch().unwrap().to_bytes(), Bytes::from_static(b"foo"));
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_streaming_needs_more_data() {
        let mut decoder = PayloadDecoder::chunked();
        let mut buffer = BytesMut::from(&b"3\r\n"[..]);
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_eof() {
        let mut decoder = PayloadDecoder::until_close();
        let mut buffer = BytesMut::from(&b"tail"[..]);
        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_data());
        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_eof());
        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());

        let mut decoder = PayloadDecoder::fix_length(10);
        let mut buffer = BytesMut::from(&b"short"[..]);
        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_data());
        assert!(matches!(decoder.decode_eof(&mut buffer), Err(BodyError::UnexpectedEof { received: 5 })));
    }

    #[test]
    fn test_truncated_chunked_reports_received() {
        let mut decoder = PayloadDecoder::chunked();
        let mut buffer = BytesMut::from(&b"4\r\nWiki\r\n5\r\nped"[..]);
        assert_eq!(decoder.decode_buf(&mut buffer).unwrap().batch().byte_len(), 7);
        assert_eq!(decoder.received(), 7);
        assert!(matches!(decoder.decode_close(), Err(BodyError::UnexpectedEof { received: 7 })));
    }

    #[test]
    fn test_zero_length_streams_eof() {
        let mut decoder = PayloadDecoder::fix_length(0);
        assert!(decoder.decode(&mut BytesMut::new()).unwrap().unwrap().is_eof());
    }
}
