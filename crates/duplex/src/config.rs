//! Sender configuration.
//!
//! The queue capacity and its overflow policy are the only tunables that change behavior;
//! `poll_interval` only decides how often an idle consumer wakes up to log that it is
//! still waiting. All three are fixed when the sender is built.
//!
//! ```
//! use micro_duplex::{OverflowPolicy, SenderConfig};
//!
//! let config = SenderConfig::default().with_capacity(64).with_overflow(OverflowPolicy::Block);
//! assert_eq!(config.capacity, 64);
//! ```

use crate::protocol::SenderError;
use crate::queue::{BoundedQueue, DEFAULT_CAPACITY, OverflowPolicy};
use crate::utils::ensure;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// How long the consumer waits on an empty queue before it logs and waits again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
    #[serde(rename = "poll_interval_ms", deserialize_with = "deserialize_millis")]
    pub poll_interval: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            overflow: OverflowPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SenderConfig {
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn validate(&self) -> Result<(), SenderError> {
        ensure!(self.capacity > 0, SenderError::invalid_config("capacity must be greater than zero"));
        ensure!(!self.poll_interval.is_zero(), SenderError::invalid_config("poll interval must be greater than zero"));
        Ok(())
    }

    pub(crate) fn build_queue(&self) -> BoundedQueue {
        BoundedQueue::new(self.capacity, self.overflow)
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
