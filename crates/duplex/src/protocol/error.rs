use std::io;
use thiserror::Error;

/// Failures surfaced by the message sender, its queue and its chunk stream.
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("message queue is full, capacity: {capacity}")]
    QueueFull { capacity: usize },

    #[error("waiting on the message queue was interrupted")]
    Interrupted,

    #[error("invalid sender config: {reason}")]
    InvalidConfig { reason: String },
}

impl SenderError {
    pub fn invalid_state<S: ToString>(str: S) -> Self {
        Self::InvalidState { reason: str.to_string() }
    }

    pub fn queue_full(capacity: usize) -> Self {
        Self::QueueFull { capacity }
    }

    pub fn invalid_config<S: ToString>(str: S) -> Self {
        Self::InvalidConfig { reason: str.to_string() }
    }

    #[inline]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    #[inline]
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// Failures raised while framing and writing chunks to the transport.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("chunk stream error: {source}")]
    Stream {
        #[from]
        source: SenderError,
    },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
