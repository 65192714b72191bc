//! Delivery of a decoded body to its consumer
//!
//! # Components
//!
//! - [`ResponseContent`]: owns the framer selected for one response and pushes every decoded
//!   batch to a [`BodySubscriber`](crate::protocol::body::BodySubscriber), one batch per unit
//!   of demand. It reports the end of the body to the subscriber and to an optional finished
//!   callback, exactly once.
//! - [`BodyReader`]: drives a `ResponseContent` from any `tokio::io::AsyncRead`, reading only
//!   while demand is outstanding.
//! - [`framed_payload`]: reads a body through `tokio_util::codec::FramedRead` when no demand
//!   gating is needed.

mod body_reader;
mod response_content;

pub use body_reader::{BodyReader, DEFAULT_READ_CAPACITY, framed_payload};
pub use response_content::{BodyStatus, OnFinished, ResponseContent};
