//! A duplex message sender streaming over chunked HTTP bodies
//!
//! This crate implements the sending half of a duplex session carried by a long-lived
//! HTTP message whose body uses chunked transfer encoding. Application threads send text
//! and binary messages; each message becomes one chunk, with its metadata attached as
//! chunk extensions, and closing the sender ends the body with the zero-length last-chunk.
//!
//! # Features
//!
//! - Any number of producer threads, one consumer
//! - Bounded queue with fail-fast or blocking backpressure, or a custom queue
//! - Strict FIFO from send to chunk
//! - Exactly one end of body chunk, even when closing from several threads at once
//! - Empty messages are sent as pings so they can't end the body by accident
//! - Text messages encoded with the requested charset, falling back to UTF-8
//! - Chunked transfer encoding with chunk extensions
//!
//! # Example
//!
//! ```no_run
//! use micro_duplex::connection::ChunkWriter;
//! use micro_duplex::protocol::Extensions;
//! use micro_duplex::MessageSender;
//! use std::sync::Arc;
//! use std::thread;
//! use tokio::net::TcpStream;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sender = Arc::new(MessageSender::new());
//!     let stream = sender.chunk_stream()?;
//!
//!     let producer = Arc::clone(&sender);
//!     thread::spawn(move || {
//!         producer.send_text_message("hello")?;
//!         producer.send_binary(vec![1u8, 2, 3], Extensions::new().with("Id", "1"))?;
//!         producer.close()
//!     });
//!
//!     let mut tcp_stream = TcpStream::connect("127.0.0.1:8080").await?;
//!     // the request head announcing `Transfer-Encoding: chunked` is written first
//!     let mut writer = ChunkWriter::new(&mut tcp_stream);
//!     writer.send_stream(stream).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: messages, chunks, extensions, charsets and errors
//! - [`queue`]: the bounded queue between producers and the consumer
//! - [`sender`]: [`MessageSender`] and its single-use [`ChunkStream`]
//! - [`codec`]: chunked transfer encoding of chunks
//! - [`connection`]: writing a chunk stream to a tokio writer
//!
//! ## Error Handling
//!
//! - [`SenderError`]: failures of the sender, the queue and the chunk stream
//! - [`protocol::SendError`]: failures while framing or writing chunks
//!
//! # Limitations
//!
//! - Sending side only, receiving messages is not covered
//! - No retry of failed writes; a failed write ends the stream for good

pub mod codec;
pub mod connection;
pub mod protocol;
pub mod queue;
pub mod sender;

mod config;
mod utils;

pub use config::{DEFAULT_POLL_INTERVAL, SenderConfig};
pub use protocol::SenderError;
pub use queue::{BoundedQueue, MessageQueue, OverflowPolicy};
pub use sender::{ChunkStream, MessageSender};
