//! Core protocol abstractions for HTTP body decoding.
//!
//! This module provides the building blocks shared by the codec and the connection layer:
//! framing declarations, decoded data types, errors and the demand-gated delivery contract.
//!
//! # Architecture
//!
//! - **Framing** ([`framing`]): How a body is delimited on the wire
//!   - [`FramingDeclaration`]: Content length and transfer-encoding of one body
//!   - [`ContentLength`], [`TransferEncoding`]: Its two halves
//!
//! - **Message Handling** ([`message`]): Decoded data
//!   - [`PayloadBatch`]: The units decoded from one input buffer
//!   - [`Decoded`]: Result of feeding one buffer, partial or complete
//!   - [`PayloadItem`]: Items of the streaming decoder
//!   - [`PayloadSize`]: Size information known before decoding
//!
//! - **Body Delivery** ([`body`]): Demand, subscriptions and the `http_body::Body` adapter
//!
//! - **Error Handling** ([`error`]):
//!   - [`FramingError`]: Malformed or ambiguous framing
//!   - [`BodyError`]: Any terminal failure of a body

mod message;
pub use message::Decoded;
pub use message::PayloadBatch;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod framing;
pub use framing::ContentLength;
pub use framing::FramingDeclaration;
pub use framing::TransferEncoding;
pub use framing::{LENGTH_FROM_HEADERS, LENGTH_UNTIL_CLOSE};

mod error;
pub use error::BodyError;
pub use error::FramingError;

pub mod body;
