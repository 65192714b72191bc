//! Framing declaration of a response body.
//!
//! The declaration is derived once from the already parsed response headers and tells
//! the body parser selector which framer has to reconstruct the body.

use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Version};
use tracing::trace;

use crate::ensure;
use crate::protocol::FramingError;

/// Raw content length meaning "unknown, determine from the transfer-encoding"
pub const LENGTH_FROM_HEADERS: i64 = -1;

/// Raw content length meaning "unknown, read until the connection closes"
pub const LENGTH_UNTIL_CLOSE: i64 = -2;

/// The declared content length of a body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContentLength {
    /// The body is exactly this many bytes long
    Known(u64),
    /// No length was declared, the transfer-encoding decides
    FromHeaders,
    /// The body ends when the connection closes
    UntilClose,
}

impl ContentLength {
    /// Converts the signed wire representation, where `-1` and `-2` are markers.
    pub fn from_raw(raw: i64) -> Result<Self, FramingError> {
        match raw {
            LENGTH_FROM_HEADERS => Ok(ContentLength::FromHeaders),
            LENGTH_UNTIL_CLOSE => Ok(ContentLength::UntilClose),
            n => u64::try_from(n)
                .map(ContentLength::Known)
                .map_err(|_e| FramingError::invalid_content_length(format!("negative length {n}"))),
        }
    }

    /// The signed wire representation of this length.
    ///
    /// Lengths above `i64::MAX` cannot be represented and saturate.
    pub fn as_raw(&self) -> i64 {
        match self {
            ContentLength::Known(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            ContentLength::FromHeaders => LENGTH_FROM_HEADERS,
            ContentLength::UntilClose => LENGTH_UNTIL_CLOSE,
        }
    }
}

/// The transfer-encoding declared for a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEncoding {
    Absent,
    Chunked,
    Other(String),
}

impl TransferEncoding {
    /// Interprets a transfer-encoding header value, comparing case-insensitively.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            TransferEncoding::Absent
        } else if value.eq_ignore_ascii_case("chunked") {
            TransferEncoding::Chunked
        } else {
            TransferEncoding::Other(value.to_owned())
        }
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, TransferEncoding::Chunked)
    }
}

/// Immutable description of how one body is framed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramingDeclaration {
    content_length: ContentLength,
    transfer_encoding: TransferEncoding,
}

impl FramingDeclaration {
    pub fn new(content_length: ContentLength, transfer_encoding: TransferEncoding) -> Self {
        Self { content_length, transfer_encoding }
    }

    /// A body of exactly `length` bytes.
    pub fn fixed(length: u64) -> Self {
        Self::new(ContentLength::Known(length), TransferEncoding::Absent)
    }

    /// A body using chunked transfer encoding.
    pub fn chunked() -> Self {
        Self::new(ContentLength::FromHeaders, TransferEncoding::Chunked)
    }

    /// A body delimited by the connection closing.
    pub fn until_close() -> Self {
        Self::new(ContentLength::UntilClose, TransferEncoding::Absent)
    }

    /// Derives the declaration from parsed response headers.
    ///
    /// A `Content-Length` header yields a known length. Without one, a chunked body is
    /// left to the chunked framing and any other body runs until the connection closes,
    /// whatever the protocol version. Only the last coding of `Transfer-Encoding` decides
    /// the framing.
    pub fn from_headers(headers: &HeaderMap, version: Version) -> Result<Self, FramingError> {
        let transfer_encoding = match headers.get_all(TRANSFER_ENCODING).iter().next_back() {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_e| FramingError::invalid_content("transfer-encoding is not visible ascii"))?;
                TransferEncoding::parse(value.rsplit(',').next().unwrap_or_default())
            }
            None => TransferEncoding::Absent,
        };

        let content_length = match parse_content_length(headers)? {
            Some(length) => ContentLength::Known(length),
            None if transfer_encoding.is_chunked() => ContentLength::FromHeaders,
            None => ContentLength::UntilClose,
        };

        trace!(?version, ?content_length, ?transfer_encoding, "derived body framing from headers");
        Ok(Self { content_length, transfer_encoding })
    }

    #[inline]
    pub fn content_length(&self) -> ContentLength {
        self.content_length
    }

    #[inline]
    pub fn transfer_encoding(&self) -> &TransferEncoding {
        &self.transfer_encoding
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.transfer_encoding.is_chunked()
    }
}

fn parse_content_length(headers: &HeaderMap) -> Result<Option<u64>, FramingError> {
    let mut content_length = None;

    for value in headers.get_all(CONTENT_LENGTH) {
        let bytes = value.as_bytes();
        ensure!(
            !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit),
            FramingError::invalid_content_length("value is not a decimal number")
        );

        let mut length: u64 = 0;
        for b in bytes {
            length = length
                .checked_mul(10)
                .and_then(|l| l.checked_add(u64::from(b - b'0')))
                .ok_or_else(|| FramingError::invalid_content_length("value overflows"))?;
        }

        if let Some(previous) = content_length {
            ensure!(previous == length, FramingError::invalid_content_length("conflicting values"));
        }
        content_length = Some(length);
    }

    Ok(content_length)
}
