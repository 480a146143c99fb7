use crate::protocol::{Message, SenderError};
use crate::queue::{MessageQueue, OverflowPolicy};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Number of messages a queue holds when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// A fixed capacity FIFO guarded by a mutex, with condition variables for both directions.
///
/// One slot beyond `capacity` is kept for the terminal message so closing a full queue
/// neither fails nor blocks.
#[derive(Debug)]
pub struct BoundedQueue {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
}

#[derive(Debug, Default)]
struct State {
    messages: VecDeque<Message>,
    terminated: bool,
    interrupted: bool,
}

impl State {
    fn check_open(&self) -> Result<(), SenderError> {
        if self.interrupted {
            return Err(SenderError::Interrupted);
        }
        if self.terminated {
            return Err(SenderError::invalid_state("message queue already holds the terminal message"));
        }
        Ok(())
    }
}

impl BoundedQueue {
    /// Creates a queue holding at most `capacity` messages.
    ///
    /// A zero capacity rejects (or blocks) every enqueue, [`SenderConfig`](crate::SenderConfig)
    /// refuses it for that reason.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            state: Mutex::new(State::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            policy,
        }
    }

    pub fn fail_fast(capacity: usize) -> Self {
        Self::new(capacity, OverflowPolicy::FailFast)
    }

    pub fn blocking(capacity: usize) -> Self {
        Self::new(capacity, OverflowPolicy::Block)
    }
}

impl Default for BoundedQueue {
    fn default() -> Self {
        Self::fail_fast(DEFAULT_CAPACITY)
    }
}

impl MessageQueue for BoundedQueue {
    fn enqueue(&self, message: Message) -> Result<(), SenderError> {
        let mut state = self.state.lock();
        loop {
            state.check_open()?;

            if state.messages.len() < self.capacity {
                state.messages.push_back(message);
                drop(state);
                self.not_empty.notify_one();
                return Ok(());
            }

            match self.policy {
                OverflowPolicy::FailFast => {
                    warn!(capacity = self.capacity, "message queue is full, rejecting message");
                    return Err(SenderError::queue_full(self.capacity));
                }
                OverflowPolicy::Block => {
                    trace!(capacity = self.capacity, "message queue is full, waiting for capacity");
                    self.not_full.wait(&mut state);
                }
            }
        }
    }

    fn enqueue_last(&self, message: Message) -> Result<(), SenderError> {
        let mut state = self.state.lock();
        state.check_open()?;

        state.messages.push_back(message);
        state.terminated = true;
        drop(state);

        self.not_empty.notify_one();
        // producers blocked on a full queue must observe the termination
        self.not_full.notify_all();
        Ok(())
    }

    fn dequeue(&self, timeout: Duration) -> Result<Option<Message>, SenderError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        loop {
            if state.interrupted {
                return Err(SenderError::Interrupted);
            }

            if let Some(message) = state.messages.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Ok(Some(message));
            }

            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut state, deadline).timed_out()
                        && state.messages.is_empty()
                        && !state.interrupted
                    {
                        return Ok(None);
                    }
                }
                None => self.not_empty.wait(&mut state),
            }
        }
    }

    fn interrupt(&self) {
        let mut state = self.state.lock();
        state.interrupted = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
