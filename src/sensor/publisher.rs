// src/sensor/publisher.rs

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Single-producer fan-out of one measured quantity.
///
/// Every subscriber owns its own unbounded channel, so a slow subscriber
/// never holds up the producer or its siblings, and a subscriber that went
/// away is pruned on the next publish.
#[derive(Debug)]
pub struct Publisher<T> {
    // `None` once the producer is finished.
    subscribers: Mutex<Option<Vec<UnboundedSender<T>>>>,
}

impl<T: Clone> Publisher<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Some(Vec::new())),
        }
    }

    /// Registers a new subscriber. It receives every value published from now on.
    /// Subscribing after `close` yields an already finished subscription.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = unbounded_channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = subscribers.as_mut() {
            list.push(tx);
        }
        Subscription { rx }
    }

    /// Delivers `value` to every live subscriber, in subscription order.
    /// Returns the number of subscribers reached.
    pub fn publish(&self, value: T) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        match subscribers.as_mut() {
            Some(list) => {
                list.retain(|tx| tx.send(value.clone()).is_ok());
                list.len()
            }
            None => 0,
        }
    }

    /// Ends every subscription once its buffered values are drained.
    pub fn close(&self) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl<T: Clone> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving end of one subscriber.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// The next value, or `None` once the producer finished and the
    /// backlog is drained. Cancel safe.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}
