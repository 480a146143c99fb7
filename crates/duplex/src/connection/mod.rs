//! Transport side of the duplex sender.
//!
//! # Components
//!
//! - [`ChunkWriter`]: drains a [`ChunkStream`](crate::sender::ChunkStream) into any tokio
//!   `AsyncWrite`, framing each chunk with [`ChunkEncoder`](crate::codec::ChunkEncoder)
//!   - flushes every chunk as soon as it is produced
//!   - interrupts the stream when writing fails or the write is abandoned

mod chunk_writer;

pub use chunk_writer::ChunkWriter;
