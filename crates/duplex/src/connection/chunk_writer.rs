use crate::codec::ChunkEncoder;
use crate::protocol::{Chunk, SendError};
use crate::queue::MessageQueue;
use crate::sender::{ChunkStream, InterruptHandle};
use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::{debug, error};

const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Writes chunks to an async writer using chunked transfer encoding.
///
/// Only the body is written; the response or request head announcing
/// `Transfer-Encoding: chunked` is up to the caller.
#[derive(Debug)]
pub struct ChunkWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ChunkEncoder,
}

impl<W> ChunkWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), encoder: ChunkEncoder::new() }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Returns true once the last-chunk has been written to the buffer
    #[inline]
    pub fn is_finish(&self) -> bool {
        self.encoder.is_finish()
    }

    /// Encodes the chunk into the write buffer, see [`ChunkWriter::flush`].
    #[inline]
    pub fn write(&mut self, chunk: Chunk) -> Result<(), SendError> {
        self.encoder.encode(chunk, &mut self.buffer)
    }

    #[inline]
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(self.writer.flush().await?)
    }

    /// Drains the chunk stream into the writer, flushing every chunk as soon as it is
    /// produced. Returns the number of chunks written, the terminal one included.
    ///
    /// Chunks are pulled on tokio's blocking pool since pulling blocks until a message is
    /// queued. If writing fails, or the returned future is dropped before the stream ends,
    /// the stream is interrupted: its producers get [`SenderError::Interrupted`](crate::SenderError::Interrupted)
    /// from then on.
    pub async fn send_stream<Q>(&mut self, mut stream: ChunkStream<Q>) -> Result<usize, SendError>
    where
        Q: MessageQueue + ?Sized + 'static,
    {
        let guard = InterruptGuard::new(stream.interrupt_handle());
        let mut chunks = 0;

        while stream.has_next() {
            let (returned, result) = tokio::task::spawn_blocking(move || {
                let result = stream.next_chunk();
                (stream, result)
            })
            .await
            .map_err(SendError::io)?;
            stream = returned;

            let chunk = result?;
            let is_last = chunk.is_last();

            self.write(chunk)?;
            if let Err(e) = self.flush().await {
                error!(cause = %e, "failed to write chunk, interrupt chunk stream");
                return Err(e);
            }

            chunks += 1;
            if is_last {
                debug!(chunks, "finished writing chunked body");
            }
        }

        guard.disarm();
        Ok(chunks)
    }
}

/// Interrupts the chunk stream on drop unless disarmed.
struct InterruptGuard<Q: MessageQueue + ?Sized> {
    handle: Option<InterruptHandle<Q>>,
}

impl<Q: MessageQueue + ?Sized> InterruptGuard<Q> {
    fn new(handle: InterruptHandle<Q>) -> Self {
        Self { handle: Some(handle) }
    }

    fn disarm(mut self) {
        self.handle = None;
    }
}

impl<Q: MessageQueue + ?Sized> Drop for InterruptGuard<Q> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.interrupt();
        }
    }
}
