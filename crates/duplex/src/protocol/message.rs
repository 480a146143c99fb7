use crate::protocol::Extensions;
use bytes::Bytes;

/// Payload of the keep-alive message: a single line feed, ignored by receivers.
pub const PING_PAYLOAD: &[u8] = b"\n";

/// A wire-ready message waiting in the sender's queue.
///
/// Messages are immutable once built. A zero-length payload is reserved for the
/// terminal message enqueued by [`MessageSender::close`](crate::sender::MessageSender::close);
/// empty application messages are turned into pings before they ever reach the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
    extensions: Extensions,
}

impl Message {
    pub(crate) fn new(payload: Bytes, extensions: Extensions) -> Self {
        Self { payload, extensions }
    }

    /// The keep-alive message, `[0x0A]` without extensions.
    pub fn ping() -> Self {
        Self::new(Bytes::from_static(PING_PAYLOAD), Extensions::empty())
    }

    /// The end of stream marker, an empty payload without extensions.
    pub fn terminal() -> Self {
        Self::new(Bytes::new(), Extensions::empty())
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns true if this is the end of stream marker
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn into_parts(self) -> (Bytes, Extensions) {
        (self.payload, self.extensions)
    }
}

/// One element of the chunk stream: data plus the extensions framed along with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Bytes,
    extensions: Extensions,
}

impl Chunk {
    pub fn new(data: Bytes, extensions: Extensions) -> Self {
        Self { data, extensions }
    }

    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if this is the zero-length chunk closing the body
    #[inline]
    pub fn is_last(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Bytes, Extensions) {
        (self.data, self.extensions)
    }
}

impl From<Message> for Chunk {
    fn from(message: Message) -> Self {
        let (data, extensions) = message.into_parts();
        Chunk { data, extensions }
    }
}
