//! Incremental HTTP/1.1 response body framing
//!
//! This crate turns the raw bytes that follow a response head into the body they carry.
//! Bodies may be framed by chunked transfer encoding, by a fixed content length, or by the
//! closing of the connection. Decoding tolerates input split at any byte, and decoded data
//! only flows to a consumer as fast as that consumer asks for it.
//!
//! # Features
//!
//! - Chunked, fixed-length and read-until-close framing
//! - Decoding resumes across arbitrarily fragmented input buffers
//! - Zero-copy data units sliced out of the read buffer
//! - Demand-gated delivery: one batch per unit of requested demand
//! - Exactly-once completion and a finished callback for connection reuse
//! - An `http_body::Body` adapter for ready-made consumption
//!
//! # Example
//!
//! ```no_run
//! use http::{HeaderMap, Version};
//! use http_body_util::BodyExt;
//! use micro_body::codec::PayloadDecoder;
//! use micro_body::connection::{BodyReader, ResponseContent};
//! use micro_body::protocol::body::body_channel;
//! use micro_body::protocol::FramingDeclaration;
//! use tokio::net::TcpStream;
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() {
//!     // stream positioned right after a response head
//!     let stream = TcpStream::connect("127.0.0.1:8080").await.unwrap();
//!
//!     let mut headers = HeaderMap::new();
//!     headers.insert(http::header::TRANSFER_ENCODING, "chunked".parse().unwrap());
//!     let declaration = FramingDeclaration::from_headers(&headers, Version::HTTP_11).unwrap();
//!
//!     let decoder = PayloadDecoder::from_declaration(&declaration).unwrap();
//!
//!     let (subscriber, body) = body_channel(decoder.payload_size());
//!     let mut content = ResponseContent::with_decoder(decoder, subscriber).on_finished(|result| match result {
//!         Ok(()) => info!("body finished, connection can be reused"),
//!         Err(e) => error!(cause = %e, "body failed, closing connection"),
//!     });
//!
//!     let reader = tokio::spawn(async move {
//!         let mut reader = BodyReader::new(stream);
//!         reader.read_body(&mut content).await
//!     });
//!
//!     let bytes = body.collect().await.unwrap().to_bytes();
//!     info!(len = bytes.len(), "received body");
//!     reader.await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - [`protocol`]: Framing declarations, decoded data types, errors and the delivery contract
//! - [`codec`]: The incremental framers
//! - [`connection`]: Demand-gated delivery and the async transport driver
//!
//! # Core Components
//!
//! ## Framing Selection
//!
//! [`protocol::FramingDeclaration`] captures the content length and transfer-encoding of a
//! response. [`codec::PayloadDecoder::from_declaration`] picks the framer for it, and rejects
//! declarations that leave the body length ambiguous.
//!
//! ## Decoding
//!
//! Each framer consumes whole input buffers. A call returns every data unit found in the
//! buffer as one [`protocol::PayloadBatch`], and tells whether the body ended with it.
//! Bytes beyond the end of the body are left in the buffer.
//!
//! ## Delivery
//!
//! [`connection::ResponseContent`] hands batches to a
//! [`protocol::body::BodySubscriber`], taking one unit of demand from the subscriber's
//! [`protocol::body::Subscription`] for every non-empty batch.
//!
//! ## Error Handling
//!
//! - [`protocol::FramingError`]: Malformed or ambiguous framing
//! - [`protocol::BodyError`]: Any terminal failure of a body, including I/O errors,
//!   truncation and cancellation
//!
//! # Limitations
//!
//! - Trailer fields after the last chunk are not supported
//! - Chunk extensions are skipped without interpretation
//! - Content codings such as gzip are left to the consumer

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
