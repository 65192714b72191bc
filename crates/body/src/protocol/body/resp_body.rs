use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::StreamExt;
use futures::channel::mpsc;
use http_body::{Body, Frame, SizeHint};
use tracing::trace;

use crate::protocol::body::{BodySubscriber, Subscription};
use crate::protocol::{BodyError, PayloadBatch, PayloadSize};

/// Creates a subscriber and the `http_body::Body` it feeds.
///
/// The subscriber may be moved to the task that drives the body; the returned
/// [`ResponseBody`] grants one unit of demand each time it runs out of buffered data.
pub fn body_channel(payload_size: PayloadSize) -> (ChannelSubscriber, ResponseBody) {
    let (sender, receiver) = mpsc::unbounded();
    (ChannelSubscriber { sender }, ResponseBody::new(receiver, payload_size))
}

#[derive(Debug)]
enum Signal {
    Subscribed(Subscription),
    Next(PayloadBatch),
    Error(BodyError),
    Complete,
}

/// Producer side of [`body_channel`].
#[derive(Debug)]
pub struct ChannelSubscriber {
    sender: mpsc::UnboundedSender<Signal>,
}

impl ChannelSubscriber {
    fn send(&self, signal: Signal) {
        if self.sender.unbounded_send(signal).is_err() {
            trace!("response body dropped, discarding signal");
        }
    }
}

impl BodySubscriber for ChannelSubscriber {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.send(Signal::Subscribed(subscription));
    }

    fn on_next(&mut self, batch: PayloadBatch) {
        self.send(Signal::Next(batch));
    }

    fn on_error(&mut self, error: BodyError) {
        self.send(Signal::Error(error));
        self.sender.close_channel();
    }

    fn on_complete(&mut self) {
        self.send(Signal::Complete);
        self.sender.close_channel();
    }
}

/// A decoded response body implementing `http_body::Body`.
///
/// Dropping the body before it finished cancels its subscription, which makes the
/// producer stop decoding.
#[derive(Debug)]
pub struct ResponseBody {
    receiver: mpsc::UnboundedReceiver<Signal>,
    subscription: Option<Subscription>,
    buffered: VecDeque<Bytes>,
    payload_size: PayloadSize,
    received: u64,
    requested: bool,
    finished: bool,
}

impl ResponseBody {
    fn new(receiver: mpsc::UnboundedReceiver<Signal>, payload_size: PayloadSize) -> Self {
        Self {
            receiver,
            subscription: None,
            buffered: VecDeque::new(),
            payload_size,
            received: 0,
            requested: false,
            finished: false,
        }
    }

    fn request_batch(&mut self) {
        if self.requested {
            return;
        }
        if let Some(subscription) = &self.subscription {
            subscription.request(1);
            self.requested = true;
        }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        loop {
            if let Some(bytes) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(Frame::data(bytes))));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            this.request_batch();

            match ready!(this.receiver.poll_next_unpin(cx)) {
                Some(Signal::Subscribed(subscription)) => {
                    this.subscription = Some(subscription);
                }
                Some(Signal::Next(batch)) => {
                    this.requested = false;
                    this.received += batch.byte_len();
                    this.buffered.extend(batch);
                }
                Some(Signal::Error(error)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(error)));
                }
                Some(Signal::Complete) => {
                    this.finished = true;
                }
                None => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(BodyError::unexpected_eof(this.received))));
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished && self.buffered.is_empty()
    }

    fn size_hint(&self) -> SizeHint {
        match self.payload_size.exact() {
            Some(length) => SizeHint::with_exact(length.saturating_sub(self.received)),
            None => SizeHint::default(),
        }
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        if !self.finished
            && let Some(subscription) = &self.subscription
        {
            subscription.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_collects_batches_in_order() {
        let (mut subscriber, body) = body_channel(PayloadSize::Chunked);
        let subscription = Subscription::new();

        subscriber.on_subscribe(subscription.clone());
        subscriber.on_next(PayloadBatch::from(Bytes::from_static(b"hello ")));
        subscriber.on_next(PayloadBatch::from(Bytes::from_static(b"world")));
        subscriber.on_complete();

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn test_requests_one_batch_at_a_time() {
        let (mut subscriber, mut body) = body_channel(PayloadSize::Length(4));
        let subscription = Subscription::new();
        subscriber.on_subscribe(subscription.clone());
        assert_eq!(body.size_hint().exact(), Some(4));

        let poll = futures::poll!(body.frame());
        assert!(poll.is_pending());
        assert_eq!(subscription.demand().get(), 1);

        assert!(subscription.demand().try_decrement());
        subscriber.on_next(PayloadBatch::from(Bytes::from_static(b"abcd")));
        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"abcd"));
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[tokio::test]
    async fn test_error_is_surfaced() {
        let (mut subscriber, body) = body_channel(PayloadSize::Chunked);
        subscriber.on_subscribe(Subscription::new());
        subscriber.on_error(BodyError::Canceled);

        let result = body.collect().await;
        assert!(matches!(result, Err(BodyError::Canceled)));
    }

    #[tokio::test]
    async fn test_dropped_producer_is_unexpected_eof() {
        let (subscriber, body) = body_channel(PayloadSize::Chunked);
        drop(subscriber);

        let result = body.collect().await;
        assert!(matches!(result, Err(BodyError::UnexpectedEof { received: 0 })));
    }

    #[test]
    fn test_drop_cancels_subscription() {
        let (mut subscriber, body) = body_channel(PayloadSize::Chunked);
        let subscription = Subscription::new();
        subscriber.on_subscribe(subscription.clone());

        let mut body = body;
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert!(Pin::new(&mut body).poll_frame(&mut cx).is_pending());

        drop(body);
        assert!(subscription.is_canceled());
    }
}
