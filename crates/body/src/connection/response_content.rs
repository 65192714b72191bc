use std::fmt;

use bytes::BytesMut;
use tracing::{debug, error, trace};

use crate::codec::PayloadDecoder;
use crate::protocol::body::{BodySubscriber, Subscription};
use crate::protocol::{BodyError, Decoded, FramingDeclaration, FramingError, PayloadBatch, PayloadSize};

/// Callback run exactly once when decoding of a body concludes.
///
/// It receives the outcome before the subscriber gets its terminal signal, and is what
/// a transport uses to recycle or close the connection.
pub type OnFinished = Box<dyn FnOnce(Result<(), &BodyError>) + Send>;

/// Lifecycle of a [`ResponseContent`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyStatus {
    /// Created, the subscriber has not been handed its subscription yet
    Unsubscribed,
    /// Decoding is in progress
    Active,
    /// The whole body was delivered
    Completed,
    /// Decoding failed; the subscriber received the error
    Failed,
    /// The subscriber canceled; nothing more was delivered
    Canceled,
}

impl BodyStatus {
    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self, BodyStatus::Completed | BodyStatus::Failed | BodyStatus::Canceled)
    }
}

/// Decodes one response body and pushes it to a [`BodySubscriber`].
///
/// Input buffers are handed over one at a time through [`accept`](ResponseContent::accept).
/// Each call delivers at most one batch, and only after taking one unit of demand from the
/// subscription. The subscriber receives exactly one of `on_complete` or `on_error`, and the
/// finished callback runs exactly once, whichever way the body ends.
pub struct ResponseContent<S> {
    decoder: Option<PayloadDecoder>,
    selection_error: Option<FramingError>,
    subscriber: S,
    subscription: Subscription,
    on_finished: Option<OnFinished>,
    status: BodyStatus,
}

impl<S: BodySubscriber> ResponseContent<S> {
    /// Selects the framer for `declaration`.
    ///
    /// An invalid declaration is not reported here: the subscriber receives it as an
    /// error once it subscribed.
    pub fn new(declaration: &FramingDeclaration, subscriber: S) -> Self {
        match PayloadDecoder::from_declaration(declaration) {
            Ok(decoder) => Self::with_decoder(decoder, subscriber),
            Err(e) => {
                debug!(cause = %e, ?declaration, "invalid body framing");
                Self::build(None, Some(e), subscriber)
            }
        }
    }

    pub fn with_decoder(decoder: PayloadDecoder, subscriber: S) -> Self {
        Self::build(Some(decoder), None, subscriber)
    }

    fn build(decoder: Option<PayloadDecoder>, selection_error: Option<FramingError>, subscriber: S) -> Self {
        Self {
            decoder,
            selection_error,
            subscriber,
            subscription: Subscription::new(),
            on_finished: None,
            status: BodyStatus::Unsubscribed,
        }
    }

    /// Registers the callback run once decoding concludes.
    #[must_use]
    pub fn on_finished<F>(mut self, on_finished: F) -> Self
    where
        F: FnOnce(Result<(), &BodyError>) + Send + 'static,
    {
        self.on_finished = Some(Box::new(on_finished));
        self
    }

    #[inline]
    pub fn status(&self) -> BodyStatus {
        self.status
    }

    #[inline]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn payload_size(&self) -> Option<PayloadSize> {
        self.decoder.as_ref().map(PayloadDecoder::payload_size)
    }

    /// Human readable description of the decoding progress.
    pub fn state_message(&self) -> String {
        match &self.decoder {
            Some(decoder) => decoder.to_string(),
            None => "invalid body framing".to_owned(),
        }
    }

    /// Hands the subscription to the subscriber and starts decoding.
    ///
    /// A zero-length body completes right here, as does an invalid declaration fail.
    pub fn subscribe(&mut self) {
        if self.status != BodyStatus::Unsubscribed {
            debug!(status = ?self.status, "body already subscribed");
            return;
        }

        self.subscriber.on_subscribe(self.subscription.clone());
        self.status = BodyStatus::Active;

        if let Some(e) = self.selection_error.take() {
            self.fail(e.into());
            return;
        }

        self.accept(&mut BytesMut::new());
    }

    /// Decodes one input buffer.
    ///
    /// Consumed bytes are split off `src`. Once the body is complete, the bytes that follow
    /// it stay in `src`.
    pub fn accept(&mut self, src: &mut BytesMut) {
        if !self.is_active() {
            trace!(status = ?self.status, len = src.len(), "body not active, ignoring buffer");
            return;
        }

        if self.observe_cancel() {
            return;
        }

        let Some(decoder) = self.decoder.as_mut() else {
            return;
        };

        match decoder.decode_buf(src) {
            Ok(Decoded::Partial(batch)) => self.deliver(batch),
            Ok(Decoded::Complete(batch)) => {
                self.deliver(batch);
                self.complete();
            }
            Err(e) => {
                debug!(cause = %e, state = %self.state_message(), "error while processing buffer");
                self.fail(e.into());
            }
        }
    }

    /// Reports that the connection closed and no more bytes will arrive.
    ///
    /// Completes a body read until close; any other unfinished body fails as truncated.
    pub fn on_connection_closed(&mut self) {
        if !self.is_active() || self.observe_cancel() {
            return;
        }

        let Some(decoder) = self.decoder.as_mut() else {
            return;
        };

        match decoder.decode_close() {
            Ok(decoded) => {
                self.deliver(decoded.into_batch());
                self.complete();
            }
            Err(e) => self.fail(e),
        }
    }

    /// Fails the body with an error raised by the transport.
    pub fn on_error(&mut self, error: BodyError) {
        if !self.is_active() {
            trace!(status = ?self.status, cause = %error, "body already finished, ignoring error");
            return;
        }
        self.fail(error);
    }

    /// Stops decoding if the subscriber canceled, returning whether it did.
    pub fn observe_cancel(&mut self) -> bool {
        if !self.subscription.is_canceled() {
            return false;
        }
        if self.is_active() {
            debug!(state = %self.state_message(), "subscriber canceled body");
            self.status = BodyStatus::Canceled;
            self.decoder = None;
            self.finish(Err(&BodyError::Canceled));
        }
        true
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.status == BodyStatus::Active
    }

    fn deliver(&mut self, batch: PayloadBatch) {
        if batch.is_empty() {
            return;
        }

        let has_demand = self.subscription.demand().try_decrement();
        if !has_demand {
            error!(units = batch.len(), state = %self.state_message(), "delivering body batch without demand");
        }
        debug_assert!(has_demand, "body batch delivered without demand");

        trace!(units = batch.len(), bytes = batch.byte_len(), "delivering body batch");
        self.subscriber.on_next(batch);
    }

    fn complete(&mut self) {
        debug!(state = %self.state_message(), "body complete");
        self.status = BodyStatus::Completed;
        self.finish(Ok(()));
        self.subscriber.on_complete();
    }

    fn fail(&mut self, error: BodyError) {
        error!(cause = %error, state = %self.state_message(), "body failed");
        self.status = BodyStatus::Failed;
        self.finish(Err(&error));
        self.subscriber.on_error(error);
    }

    fn finish(&mut self, result: Result<(), &BodyError>) {
        if let Some(on_finished) = self.on_finished.take() {
            on_finished(result);
        }
    }
}

impl<S> fmt::Debug for ResponseContent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseContent")
            .field("decoder", &self.decoder)
            .field("status", &self.status)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}
