use std::io;
use thiserror::Error;

/// Errors raised while interpreting the framing of a body.
///
/// Every variant is terminal for the body it was raised for.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FramingError {
    #[error("illegal character in chunk size: {byte:#04x}")]
    InvalidChunkSize { byte: u8 },

    #[error("invalid chunk header")]
    InvalidChunkHeader,

    #[error("chunk header size too long: {size}")]
    ChunkHeaderTooLong { size: usize },

    #[error("chunk size overflow")]
    ChunkSizeOverflow,

    #[error("invalid content: {reason}")]
    InvalidContent { reason: String },

    #[error("invalid content-length: {reason}")]
    InvalidContentLength { reason: String },
}

impl FramingError {
    pub fn invalid_chunk_size(byte: u8) -> Self {
        Self::InvalidChunkSize { byte }
    }

    pub fn chunk_header_too_long(size: usize) -> Self {
        Self::ChunkHeaderTooLong { size }
    }

    pub fn invalid_content<S: ToString>(str: S) -> Self {
        Self::InvalidContent { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }
}

/// Terminal failure of one body, as seen by the consumer and the transport.
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("framing error: {source}")]
    Framing {
        #[from]
        source: FramingError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("connection closed before the body was complete, received {received} bytes")]
    UnexpectedEof { received: u64 },

    #[error("body subscription canceled")]
    Canceled,
}

impl BodyError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn unexpected_eof(received: u64) -> Self {
        Self::UnexpectedEof { received }
    }

    /// Returns the framing error if this body failed because of malformed framing.
    pub fn as_framing(&self) -> Option<&FramingError> {
        match self {
            BodyError::Framing { source } => Some(source),
            _ => None,
        }
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, BodyError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_error_messages() {
        assert_eq!(FramingError::invalid_chunk_size(b'G').to_string(), "illegal character in chunk size: 0x47");
        assert_eq!(FramingError::chunk_header_too_long(2050).to_string(), "chunk header size too long: 2050");
        assert_eq!(FramingError::invalid_content("gzip").to_string(), "invalid content: gzip");
    }

    #[test]
    fn test_body_error_from_framing() {
        let error: BodyError = FramingError::InvalidChunkHeader.into();
        assert_eq!(error.as_framing(), Some(&FramingError::InvalidChunkHeader));
        assert!(!error.is_canceled());
        assert!(BodyError::Canceled.as_framing().is_none());
    }
}
