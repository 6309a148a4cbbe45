//! Drainable FIFO queue
//!
//! The synthesis and playback queues must support two operations tokio's
//! mpsc channels cannot combine: a single worker blocking on `pop`, and the
//! barge-in coordinator synchronously emptying the queue from another task.
//! Items already popped but still in flight are covered by the stale
//! generation check, not by the drain.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// FIFO queue with exactly one consumer and external draining
#[derive(Debug, Default)]
pub struct DrainQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> DrainQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Append an item, waking the consumer if it is waiting
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Remove and return the oldest item, waiting until one is available
    ///
    /// Intended for a single consumer; the stored-permit semantics of
    /// [`Notify`] close the check-then-wait race with `push`.
    pub async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.items.lock().pop_front() {
                return item;
            }
            self.notify.notified().await;
        }
    }

    /// Drop every queued item, returning how many were discarded
    pub fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let dropped = items.len();
        items.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
