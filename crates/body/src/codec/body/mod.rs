//! HTTP body decoding module for processing response payloads
//!
//! This module reconstructs the logical bytes of one message body from wire bytes,
//! using one of three framings.
//!
//! # Components
//!
//! - [`ChunkSizeScanner`]: Parses chunk-size lines, tolerating chunk extensions
//! - [`ChunkedDecoder`]: Handles chunked transfer encoded bodies
//! - [`LengthDecoder`]: Processes fixed-length bodies
//! - [`UntilCloseDecoder`]: Passes bytes through until the connection closes
//! - [`PayloadDecoder`]: Main decoder that selects and drives one of the above
//!
//! # Features
//!
//! - Any input buffer boundary is tolerated, down to single bytes
//! - Decoded units are zero-copy views split off the input `BytesMut`
//! - Bytes following the body are left in the input for the next message

mod chunk_size;
mod chunked_decoder;
mod length_decoder;
mod payload_decoder;
mod until_close_decoder;

pub use chunk_size::{ChunkSizeScanner, MAX_CHUNK_HEADER_SIZE};
pub use chunked_decoder::ChunkedDecoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
pub use until_close_decoder::UntilCloseDecoder;
