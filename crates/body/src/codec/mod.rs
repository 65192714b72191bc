//! HTTP codec module for decoding HTTP message bodies
//!
//! This module provides functionality for incremental body decoding. It uses a state
//! machine per framing to handle partial buffers efficiently.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_body::codec::PayloadDecoder;
//! use micro_body::protocol::FramingDeclaration;
//!
//! let mut decoder = PayloadDecoder::from_declaration(&FramingDeclaration::chunked()).unwrap();
//! let mut buffer = BytesMut::from(&b"5\r\nHELLO\r\n0\r\n\r\n"[..]);
//!
//! let decoded = decoder.decode_buf(&mut buffer).unwrap();
//! assert!(decoded.is_complete());
//! assert_eq!(&decoded.batch().to_bytes()[..], b"HELLO");
//! ```
//!
//! `PayloadDecoder` also implements [`tokio_util::codec::Decoder`], so a body can be
//! read as a stream of [`PayloadItem`](crate::protocol::PayloadItem)s through
//! `FramedRead`.

mod body;

pub use body::{ChunkSizeScanner, ChunkedDecoder, LengthDecoder, PayloadDecoder, UntilCloseDecoder, MAX_CHUNK_HEADER_SIZE};
