//! Wire framing of the chunk stream.
//!
//! - [`ChunkEncoder`]: writes chunks, with their extensions, using HTTP chunked transfer
//!   encoding; the zero-length chunk becomes the last-chunk ending the body
//!
//! # Example
//!
//! ```
//! use bytes::{Bytes, BytesMut};
//! use micro_duplex::codec::ChunkEncoder;
//! use micro_duplex::protocol::{Chunk, Extensions};
//! use tokio_util::codec::Encoder;
//!
//! let mut encoder = ChunkEncoder::new();
//! let mut buffer = BytesMut::new();
//! encoder.encode(Chunk::new(Bytes::from_static(b"hi"), Extensions::new().with("Id", "1")), &mut buffer).unwrap();
//! encoder.encode(Chunk::new(Bytes::new(), Extensions::empty()), &mut buffer).unwrap();
//! assert_eq!(&buffer[..], b"2;Id=1\r\nhi\r\n0\r\n\r\n");
//! ```

mod chunk_encoder;

pub use chunk_encoder::ChunkEncoder;
