//! Fixed-capacity per-stream delivery queue with a drop-on-full push.

use tokio::sync::mpsc;

/// Default capacity for per-connection push queues. Overflow favors the
/// most recent live state: the durable store remains the source of truth,
/// so a dropped push is only a lost convenience copy.
pub const DELIVERY_QUEUE_CAPACITY: usize = 10;

/// Write half of a delivery queue. Cloneable; any task may enqueue, only the
/// owning stream task ever drains.
#[derive(Clone)]
pub struct DeliverySender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> DeliverySender<T> {
    /// Non-blocking enqueue. Returns whether the item was accepted; a full
    /// or closed queue drops the item.
    pub fn try_push(&self, item: T) -> bool {
        self.tx.try_send(item).is_ok()
    }
}

/// Read half, owned exclusively by the serving task of one open stream.
pub struct DeliveryQueue<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> DeliveryQueue<T> {
    /// Await the next queued item; `None` once every sender is gone or the
    /// queue was closed through [`DeliveryQueue::close`].
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Administrative close; pending items are discarded.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Build a bounded delivery queue pair.
pub fn delivery_queue<T>(capacity: usize) -> (DeliverySender<T>, DeliveryQueue<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (DeliverySender { tx }, DeliveryQueue { rx })
}
