use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::trace;

use crate::protocol::PayloadBatch;
use crate::protocol::body::Demand;
use crate::protocol::BodyError;

/// The receiving side of a decoded body.
///
/// A subscriber is handed its [`Subscription`] first, and only receives batches it asked
/// for through [`Subscription::request`]. It then sees exactly one of
/// [`on_complete`](BodySubscriber::on_complete) or [`on_error`](BodySubscriber::on_error),
/// unless it canceled first, in which case it sees neither.
pub trait BodySubscriber: Send {
    fn on_subscribe(&mut self, subscription: Subscription);

    fn on_next(&mut self, batch: PayloadBatch);

    fn on_error(&mut self, error: BodyError);

    fn on_complete(&mut self);
}

/// Handle shared between the body producer and its subscriber.
///
/// Cloning is cheap; all clones refer to the same demand and cancellation state.
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    demand: Demand,
    canceled: AtomicBool,
    notify: Notify,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the producer to deliver `n` more batches.
    pub fn request(&self, n: u64) {
        if n == 0 {
            trace!("ignoring request for zero batches");
            return;
        }
        if self.inner.demand.increase(n) {
            self.inner.notify.notify_one();
        }
    }

    /// Stops delivery. Batches not yet delivered are dropped, and so is outstanding demand.
    pub fn cancel(&self) {
        if !self.inner.canceled.swap(true, Ordering::AcqRel) {
            trace!("body subscription canceled");
            self.inner.demand.reset();
            self.inner.notify.notify_one();
        }
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::Acquire)
    }

    #[inline]
    pub fn demand(&self) -> &Demand {
        &self.inner.demand
    }

    /// Waits until at least one unit of demand is outstanding.
    ///
    /// Returns false if the subscription was canceled instead.
    pub async fn demand_available(&self) -> bool {
        loop {
            if self.is_canceled() {
                return false;
            }
            if !self.inner.demand.is_fulfilled() {
                return true;
            }
            self.inner.notify.notified().await;
        }
    }
}
