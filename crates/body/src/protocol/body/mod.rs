//! Demand-gated delivery of decoded body batches.
//!
//! This module provides the consumer facing half of body decoding. The design focuses on:
//!
//! - Backpressure: nothing is delivered without demand granted by the consumer
//! - Exactly-once termination: a consumer sees one completion or one error
//! - Cancellation: a consumer may stop the body at any point
//!
//! # Architecture
//!
//! - [`Demand`]: Atomic counter of batches the consumer is willing to receive
//! - [`Subscription`]: Handle shared by producer and consumer, carrying demand and cancellation
//! - [`BodySubscriber`]: The callbacks a consumer implements
//! - [`ResponseBody`]: A ready-made consumer implementing `http_body::Body`, fed through
//!   [`body_channel`]
//!
//! The producer side lives in [`crate::connection`].

mod demand;
mod resp_body;
mod subscription;

pub use demand::Demand;
pub use resp_body::{ChannelSubscriber, ResponseBody, body_channel};
pub use subscription::{BodySubscriber, Subscription};
