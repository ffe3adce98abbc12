//! Live-connection registry and bounded delivery queues.
//!
//! Both delivery paths (chat and notifications) keep a concurrently-mutated
//! table from recipient identity to the write half of that recipient's open
//! stream. The registry itself never performs I/O: the actual send happens
//! after `lookup`, outside the critical section.

pub mod queue;
pub mod registry;

pub use queue::{delivery_queue, DeliveryQueue, DeliverySender, DELIVERY_QUEUE_CAPACITY};
pub use registry::{ConnectionId, ConnectionRegistry};
