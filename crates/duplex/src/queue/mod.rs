//! Bounded message queues sitting between the producers and the chunk stream.
//!
//! Any number of producer threads enqueue [`Message`]s while exactly one consumer, the
//! [`ChunkStream`](crate::sender::ChunkStream), dequeues them. The queue is the only
//! mutable state shared between the two sides, so implementations must be thread safe.
//!
//! [`BoundedQueue`] is the default implementation. What happens when it is full is decided
//! by its [`OverflowPolicy`]: fail the enqueue right away, or block the producer until the
//! consumer makes room.

mod bounded_queue;

pub use bounded_queue::{BoundedQueue, DEFAULT_CAPACITY};

use crate::protocol::{Message, SenderError};
use serde::Deserialize;
use std::time::Duration;

/// What a full queue does with one more message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Reject the message with [`SenderError::QueueFull`]
    #[default]
    FailFast,
    /// Suspend the producer until capacity is available
    Block,
}

/// A thread-safe FIFO of messages with a single consumer.
pub trait MessageQueue: Send + Sync {
    /// Appends a message, applying the overflow policy when the queue is full.
    ///
    /// Fails with [`SenderError::InvalidState`] once the terminal message has been enqueued,
    /// and with [`SenderError::Interrupted`] once the queue has been interrupted.
    fn enqueue(&self, message: Message) -> Result<(), SenderError>;

    /// Appends the terminal message. Never fails for capacity reasons and never blocks;
    /// after it succeeds, every [`MessageQueue::enqueue`] fails.
    fn enqueue_last(&self, message: Message) -> Result<(), SenderError>;

    /// Waits up to `timeout` for the next message.
    ///
    /// `Ok(None)` means the wait elapsed without a message; it is not an error.
    fn dequeue(&self, timeout: Duration) -> Result<Option<Message>, SenderError>;

    /// Wakes every waiter; all current and future waits fail with [`SenderError::Interrupted`].
    fn interrupt(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;
}
