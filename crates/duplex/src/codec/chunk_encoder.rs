//! Encoder for HTTP chunked transfer encoding with chunk extensions.
//!
//! Writes each [`Chunk`] as described in
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1):
//!
//! ```text
//! chunk      = chunk-size *( ";" chunk-ext-name [ "=" chunk-ext-val ] ) CRLF chunk-data CRLF
//! last-chunk = 1*("0") *( ";" chunk-ext-name [ "=" chunk-ext-val ] ) CRLF
//! ```
//!
//! Extension values that are not tokens are written as quoted strings. The zero-length chunk
//! is written as the last-chunk followed by an empty trailer, after which the encoder is
//! finished and ignores further chunks.

use crate::protocol::{Chunk, Extensions, SendError};
use bytes::{BufMut, BytesMut};
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkEncoder {
    eof: bool,
    send_size: usize,
}

impl ChunkEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the last-chunk has been written
    #[inline]
    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Number of data bytes written so far, framing excluded
    #[inline]
    pub fn send_size(&self) -> usize {
        self.send_size
    }
}

impl Encoder<Chunk> for ChunkEncoder {
    type Error = SendError;

    fn encode(&mut self, chunk: Chunk, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            trace!("chunked body already finished, ignore chunk");
            return Ok(());
        }

        let (data, extensions) = chunk.into_parts();
        validate_extensions(&extensions)?;

        write!(helper::Writer(dst), "{:X}", data.len())?;
        for (name, value) in extensions.iter() {
            write_extension(dst, name, value);
        }
        dst.extend_from_slice(b"\r\n");

        if data.is_empty() {
            // last-chunk, then the empty trailer section
            self.eof = true;
            dst.extend_from_slice(b"\r\n");
            return Ok(());
        }

        dst.reserve(data.len() + 2);
        dst.extend_from_slice(&data);
        dst.extend_from_slice(b"\r\n");
        self.send_size += data.len();
        Ok(())
    }
}

fn validate_extensions(extensions: &Extensions) -> Result<(), SendError> {
    for (name, value) in extensions.iter() {
        if !is_token(name) {
            return Err(SendError::invalid_body(format!("invalid chunk extension name: {name:?}")));
        }
        if !value.bytes().all(is_quotable) {
            return Err(SendError::invalid_body(format!("invalid chunk extension value for {name}")));
        }
    }
    Ok(())
}

fn write_extension(dst: &mut BytesMut, name: &str, value: &str) {
    dst.put_u8(b';');
    dst.put_slice(name.as_bytes());
    dst.put_u8(b'=');

    if is_token(value) {
        dst.put_slice(value.as_bytes());
        return;
    }

    dst.put_u8(b'"');
    for b in value.bytes() {
        if b == b'"' || b == b'\\' {
            dst.put_u8(b'\\');
        }
        dst.put_u8(b);
    }
    dst.put_u8(b'"');
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_tchar)
}

fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Bytes allowed in a quoted-string, either as qdtext or as a quoted-pair
fn is_quotable(b: u8) -> bool {
    b == b'\t' || (b >= 0x20 && b != 0x7F)
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn encode(encoder: &mut ChunkEncoder, chunk: Chunk) -> Result<BytesMut, SendError> {
        let mut dst = BytesMut::new();
        encoder.encode(chunk, &mut dst)?;
        Ok(dst)
    }

    #[test]
    fn test_text_chunk_with_extensions() {
        let mut encoder = ChunkEncoder::new();
        let extensions = Extensions::new().with("Content-Type", "text/plain").with("Charset", "UTF-8");

        let dst = encode(&mut encoder, Chunk::new(Bytes::from_static(b"hello"), extensions)).unwrap();

        assert_eq!(&dst[..], &b"5;Content-Type=\"text/plain\";Charset=UTF-8\r\nhello\r\n"[..]);
        assert_eq!(encoder.send_size(), 5);
        assert!(!encoder.is_finish());
    }

    #[test]
    fn test_size_is_upper_hex() {
        let mut encoder = ChunkEncoder::new();
        let data = Bytes::from(vec![b'A'; 26]);

        let dst = encode(&mut encoder, Chunk::new(data, Extensions::empty())).unwrap();
        assert!(dst.starts_with(b"1A\r\n"));
        assert!(dst.ends_with(b"A\r\n"));
        assert_eq!(dst.len(), 4 + 26 + 2);
    }

    #[test]
    fn test_ping_chunk() {
        let mut encoder = ChunkEncoder::new();
        let dst = encode(&mut encoder, Chunk::new(Bytes::from_static(b"\n"), Extensions::empty())).unwrap();
        assert_eq!(&dst[..], &b"1\r\n\n\r\n"[..]);
    }

    #[test]
    fn test_last_chunk_finishes_encoder() {
        let mut encoder = ChunkEncoder::new();

        let dst = encode(&mut encoder, Chunk::new(Bytes::new(), Extensions::empty())).unwrap();
        assert_eq!(&dst[..], &b"0\r\n\r\n"[..]);
        assert!(encoder.is_finish());

        let dst = encode(&mut encoder, Chunk::new(Bytes::from_static(b"late"), Extensions::empty())).unwrap();
        assert!(dst.is_empty());
    }

    #[test]
    fn test_quoted_value_escapes() {
        let mut encoder = ChunkEncoder::new();
        let extensions = Extensions::new().with("note", r#"say "hi" \o/"#).with("empty", "");

        let dst = encode(&mut encoder, Chunk::new(Bytes::from_static(b"x"), extensions)).unwrap();
        assert_eq!(&dst[..], &b"1;note=\"say \\\"hi\\\" \\\\o/\";empty=\"\"\r\nx\r\n"[..]);
    }

    #[test]
    fn test_invalid_extensions_are_rejected() {
        let mut encoder = ChunkEncoder::new();

        let bad_name = Extensions::new().with("bad name", "v");
        let result = encode(&mut encoder, Chunk::new(Bytes::from_static(b"x"), bad_name));
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));

        let bad_value = Extensions::new().with("name", "line\r\nbreak");
        let result = encode(&mut encoder, Chunk::new(Bytes::from_static(b"x"), bad_value));
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));

        assert_eq!(encoder.send_size(), 0);
    }
}
