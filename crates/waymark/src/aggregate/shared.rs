//! Replay-one multicast channel.
//!
//! A small broadcast primitive: every published value is cached and fanned
//! out to all current subscribers, and a new subscriber immediately receives
//! the most recently published value before any subsequent updates. The
//! aggregator's driver additionally needs to know when the channel goes idle
//! (last subscriber dropped) and when someone rejoins, so both transitions
//! are awaitable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::Notify;

struct State<T> {
    last: Option<T>,
    senders: Vec<mpsc::UnboundedSender<T>>,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    subscribers: AtomicUsize,
    emptied: Notify,
    joined: Notify,
}

/// A broadcast channel with a one-value replay cache.
pub struct Shared<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Shared<T> {
    /// Create an empty channel with no cached value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    last: None,
                    senders: Vec::new(),
                }),
                subscribers: AtomicUsize::new(0),
                emptied: Notify::new(),
                joined: Notify::new(),
            }),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.load(Ordering::SeqCst)
    }

    /// Wait until the channel has no subscribers.
    ///
    /// Resolves immediately if it is already empty.
    pub async fn idle(&self) {
        loop {
            let notified = self.inner.emptied.notified();
            tokio::pin!(notified);
            // Register before checking, so a notify between the check and
            // the await is never lost.
            notified.as_mut().enable();
            if self.subscriber_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait until the channel has at least one subscriber.
    ///
    /// Resolves immediately if someone is already subscribed.
    pub async fn rejoined(&self) {
        loop {
            let notified = self.inner.joined.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.subscriber_count() > 0 {
                return;
            }
            notified.await;
        }
    }
}

impl<T: Clone> Shared<T> {
    /// Publish a value: cache it and deliver it to every live subscriber.
    ///
    /// Subscribers whose receiving half is gone are pruned here.
    pub fn publish(&self, value: T) {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.senders.retain(|tx| tx.send(value.clone()).is_ok());
        state.last = Some(value);
    }

    /// The most recently published value, if any.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last
            .clone()
    }

    /// Subscribe to the channel.
    ///
    /// If a value has been published, it is delivered to the new subscriber
    /// immediately, followed by all subsequent publishes in order.
    #[must_use]
    pub fn subscribe(&self) -> Subscriber<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(last) = &state.last {
                // Delivery cannot fail: we still hold the receiver.
                let _ = tx.send(last.clone());
            }
            state.senders.push(tx);
        }
        self.inner.subscribers.fetch_add(1, Ordering::SeqCst);
        self.inner.joined.notify_waiters();

        Subscriber {
            rx,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// The receiving half of a [`Shared`] subscription.
pub struct Subscriber<T> {
    rx: mpsc::UnboundedReceiver<T>,
    inner: Arc<Inner<T>>,
}

impl<T> std::fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").finish_non_exhaustive()
    }
}

impl<T> Subscriber<T> {
    /// Receive the next value.
    ///
    /// Returns `None` only if the channel itself has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Receive the next value without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if no value is ready or the channel is gone.
    pub fn try_recv(&mut self) -> std::result::Result<T, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }
}

impl<T> Drop for Subscriber<T> {
    fn drop(&mut self) {
        if self.inner.subscribers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.emptied.notify_waiters();
        }
    }
}
