use crate::protocol::{Chunk, SenderError};
use crate::queue::{BoundedQueue, MessageQueue};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// The single-use, lazily produced sequence of chunks of a [`MessageSender`](crate::MessageSender).
///
/// Each pull blocks until the next message is queued and hands it out as a [`Chunk`]. The
/// stream ends right after the zero-length terminal chunk enqueued by `close`: that chunk is
/// yielded like any other, then [`ChunkStream::has_next`] turns false and
/// [`ChunkStream::next_chunk`] fails with [`SenderError::InvalidState`].
///
/// As an [`Iterator`] the stream yields `None` once exhausted.
#[derive(Debug)]
pub struct ChunkStream<Q: ?Sized = BoundedQueue> {
    queue: Arc<Q>,
    poll_interval: Duration,
    has_more: bool,
}

impl<Q: MessageQueue + ?Sized> ChunkStream<Q> {
    pub(crate) fn new(queue: Arc<Q>, poll_interval: Duration) -> Self {
        Self { queue, poll_interval, has_more: true }
    }

    /// Returns true until the terminal chunk has been produced or the wait was interrupted
    #[inline]
    pub fn has_next(&self) -> bool {
        self.has_more
    }

    /// Blocks until the next chunk is available.
    ///
    /// # Errors
    ///
    /// - [`SenderError::InvalidState`] if the stream is exhausted
    /// - [`SenderError::Interrupted`] if the wait was interrupted; the stream is then exhausted
    pub fn next_chunk(&mut self) -> Result<Chunk, SenderError> {
        if !self.has_more {
            return Err(SenderError::invalid_state("No more chunks are available"));
        }

        let message = loop {
            match self.queue.dequeue(self.poll_interval) {
                Ok(Some(message)) => break message,
                Ok(None) => {
                    trace!(poll_interval = ?self.poll_interval, "no message queued yet, keep waiting");
                }
                Err(e) => {
                    error!(cause = %e, "failed to wait for the next message, abort chunk stream");
                    self.has_more = false;
                    return Err(e);
                }
            }
        };

        let chunk = Chunk::from(message);
        self.has_more = !chunk.is_last();
        if self.has_more {
            trace!(size = chunk.size(), "produced chunk");
        } else {
            debug!("produced terminal chunk, chunk stream finished");
        }

        Ok(chunk)
    }

    /// Returns a handle able to interrupt the stream from another thread or task.
    pub fn interrupt_handle(&self) -> InterruptHandle<Q> {
        InterruptHandle { queue: Arc::clone(&self.queue) }
    }
}

impl<Q: MessageQueue + ?Sized> Iterator for ChunkStream<Q> {
    type Item = Result<Chunk, SenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_more.then(|| self.next_chunk())
    }
}

impl<Q: MessageQueue + ?Sized> FusedIterator for ChunkStream<Q> {}

/// Interrupts the blocking wait of a [`ChunkStream`], typically because the connection the
/// chunks were written to is gone.
///
/// Interruption is fatal: the pending or next pull fails with [`SenderError::Interrupted`]
/// and producers blocked on a full queue are released with the same error.
#[derive(Debug)]
pub struct InterruptHandle<Q: ?Sized = BoundedQueue> {
    queue: Arc<Q>,
}

impl<Q: MessageQueue + ?Sized> InterruptHandle<Q> {
    pub fn interrupt(&self) {
        warn!(queued = self.queue.len(), "interrupting chunk stream");
        self.queue.interrupt();
    }
}

impl<Q: ?Sized> Clone for InterruptHandle<Q> {
    fn clone(&self) -> Self {
        Self { queue: Arc::clone(&self.queue) }
    }
}
