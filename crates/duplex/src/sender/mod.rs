//! The duplex message sender and the chunk stream it feeds.
//!
//! Producer threads call [`MessageSender::send_text`], [`MessageSender::send_binary`],
//! [`MessageSender::ping`] and [`MessageSender::close`]; the transport pulls the queued
//! messages, in order, from the [`ChunkStream`] returned by
//! [`MessageSender::chunk_stream`].
//!
//! # Termination
//!
//! A zero-length chunk ends a chunked body, so it doubles as the end of stream signal:
//!
//! - `close` enqueues it exactly once, even when called concurrently from several threads
//! - empty application messages are sent as pings and never reach the queue as empty
//! - nothing can be queued after it, so it is always the last chunk
//!
//! The chunk stream itself is single use: it can be obtained once per sender and it
//! reports exhaustion right after yielding the terminal chunk.

mod chunk_stream;
mod message_sender;

pub use chunk_stream::ChunkStream;
pub use chunk_stream::InterruptHandle;
pub use message_sender::MessageSender;
pub use message_sender::CHARSET;
pub use message_sender::CONTENT_TYPE;
