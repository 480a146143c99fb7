use crate::config::{DEFAULT_POLL_INTERVAL, SenderConfig};
use crate::protocol::{Charset, Extensions, Message, SenderError};
use crate::queue::{BoundedQueue, MessageQueue};
use crate::sender::ChunkStream;
use crate::utils::ensure;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Extension name carrying the content type of a text message
pub const CONTENT_TYPE: &str = "Content-Type";

/// Extension name carrying the charset a text message was encoded with
pub const CHARSET: &str = "Charset";

/// Sends messages over one duplex session.
///
/// Messages are queued, never written directly: the send methods return as soon as the
/// message is in the queue, and the transport drains it through the [`ChunkStream`]
/// obtained from [`MessageSender::chunk_stream`]. A sender can be shared between threads
/// (wrap it in an `Arc`); only one chunk stream is ever handed out.
///
/// The default queue holds 10 messages and rejects more with [`SenderError::QueueFull`].
/// For real backpressure, build the sender from a [`SenderConfig`] using
/// [`OverflowPolicy::Block`](crate::OverflowPolicy::Block), or inject a custom
/// [`MessageQueue`] with [`MessageSender::with_queue`].
///
/// An empty chunk ends a chunked body, so empty messages are never sent as such: they are
/// turned into a [ping](MessageSender::ping).
///
/// Dropping the sender closes it, so a stream being drained still ends after the last
/// queued message even when no producer called [`MessageSender::close`].
///
/// The queue may be a trait object: `MessageSender<dyn MessageQueue>` is built from an
/// `Arc<dyn MessageQueue>`.
#[derive(Debug)]
pub struct MessageSender<Q: MessageQueue + ?Sized = BoundedQueue> {
    queue: Arc<Q>,
    closed: AtomicBool,
    stream_obtained: AtomicBool,
    poll_interval: Duration,
}

impl MessageSender<BoundedQueue> {
    /// Creates a sender with the default, fail-fast queue of capacity 10.
    pub fn new() -> Self {
        Self::with_queue(Arc::new(BoundedQueue::default()))
    }

    pub fn with_config(config: &SenderConfig) -> Result<Self, SenderError> {
        config.validate()?;
        Self::with_queue(Arc::new(config.build_queue())).poll_interval(config.poll_interval)
    }
}

impl Default for MessageSender<BoundedQueue> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: MessageQueue + ?Sized> MessageSender<Q> {
    /// Creates a sender queuing its messages in the given queue.
    pub fn with_queue(queue: Arc<Q>) -> Self {
        Self {
            queue,
            closed: AtomicBool::new(false),
            stream_obtained: AtomicBool::new(false),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets how long the chunk stream waits on an idle queue between two wake ups.
    ///
    /// # Errors
    ///
    /// [`SenderError::InvalidConfig`] if `poll_interval` is zero: the consumer would never
    /// wait and spin on an idle queue instead.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Result<Self, SenderError> {
        ensure!(!poll_interval.is_zero(), SenderError::invalid_config("poll interval must be greater than zero"));
        self.poll_interval = poll_interval;
        Ok(self)
    }

    /// Sends a text message without extensions.
    pub fn send_text_message(&self, text: &str) -> Result<(), SenderError> {
        self.send_text(text, Extensions::empty())
    }

    /// Sends a text message.
    ///
    /// The chunk carries `Content-Type: text/plain` and a `Charset` extension naming the
    /// charset `text` was encoded with: the one requested through the `Charset` extension,
    /// or UTF-8 when none is requested or the requested one is not supported.
    ///
    /// # Errors
    ///
    /// - [`SenderError::InvalidState`] if the sender has been closed
    /// - [`SenderError::QueueFull`] if the queue is full and does not block
    pub fn send_text(&self, text: &str, extensions: Extensions) -> Result<(), SenderError> {
        self.ensure_open()?;
        if text.is_empty() {
            return self.ping();
        }

        let extensions = extensions.and(&Extensions::new().with(CONTENT_TYPE, mime::TEXT_PLAIN.essence_str()));
        let charset = Charset::resolve_or_default(extensions.get_first(CHARSET));
        let extensions = extensions.and(&Extensions::new().with(CHARSET, charset.name()));

        self.enqueue(Message::new(charset.encode(text), extensions))
    }

    /// Sends a binary message without extensions.
    pub fn send_binary_message<B: Into<Bytes>>(&self, bytes: B) -> Result<(), SenderError> {
        self.send_binary(bytes, Extensions::empty())
    }

    /// Sends a binary message, the extensions are attached to its chunk unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`MessageSender::send_text`].
    pub fn send_binary<B: Into<Bytes>>(&self, bytes: B, extensions: Extensions) -> Result<(), SenderError> {
        self.ensure_open()?;
        let bytes = bytes.into();
        if bytes.is_empty() {
            return self.ping();
        }

        self.enqueue(Message::new(bytes, extensions))
    }

    /// Pings the receiver with a single line feed, which receivers ignore.
    ///
    /// Keeps the connection from timing out during long periods of inactivity.
    pub fn ping(&self) -> Result<(), SenderError> {
        self.ensure_open()?;
        self.enqueue(Message::ping())
    }

    /// Closes the sender, ending the chunk stream once the queued messages are drained.
    ///
    /// Only the first call enqueues the terminal chunk; later calls, from any thread, do
    /// nothing. Messages already queued are still delivered.
    pub fn close(&self) -> Result<(), SenderError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            trace!("sender already closed");
            return Ok(());
        }

        debug!(queued = self.queue.len(), "closing sender");
        self.queue.enqueue_last(Message::terminal())
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the stream of chunks to be written by the transport.
    ///
    /// # Errors
    ///
    /// [`SenderError::InvalidState`] if the stream was already returned, consumed or not.
    pub fn chunk_stream(&self) -> Result<ChunkStream<Q>, SenderError> {
        if self.stream_obtained.swap(true, Ordering::AcqRel) {
            return Err(SenderError::invalid_state("Chunk stream was already returned"));
        }

        Ok(ChunkStream::new(Arc::clone(&self.queue), self.poll_interval))
    }

    fn ensure_open(&self) -> Result<(), SenderError> {
        if self.is_closed() {
            return Err(SenderError::invalid_state("Sender has been closed"));
        }
        Ok(())
    }

    fn enqueue(&self, message: Message) -> Result<(), SenderError> {
        trace!(len = message.payload().len(), extensions = %message.extensions(), "queueing message");
        self.queue.enqueue(message)
    }
}

impl<Q: MessageQueue + ?Sized> Drop for MessageSender<Q> {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }

        debug!("sender dropped without being closed");
        if let Err(e) = self.close() {
            debug!(cause = %e, "failed to end chunk stream of dropped sender");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Chunk;
    use crate::queue::OverflowPolicy;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    /// Counts the dequeue calls made by the chunk stream.
    #[derive(Debug, Default)]
    struct CountingQueue {
        inner: BoundedQueue,
        dequeues: AtomicUsize,
    }

    impl MessageQueue for CountingQueue {
        fn enqueue(&self, message: Message) -> Result<(), SenderError> {
            self.inner.enqueue(message)
        }

        fn enqueue_last(&self, message: Message) -> Result<(), SenderError> {
            self.inner.enqueue_last(message)
        }

        fn dequeue(&self, timeout: Duration) -> Result<Option<Message>, SenderError> {
            self.dequeues.fetch_add(1, Ordering::Relaxed);
            self.inner.dequeue(timeout)
        }

        fn interrupt(&self) {
            self.inner.interrupt();
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn capacity(&self) -> usize {
            self.inner.capacity()
        }
    }

    fn plain_text(charset: &str) -> Extensions {
        Extensions::new().with(CONTENT_TYPE, "text/plain").with(CHARSET, charset)
    }

    fn drain<Q: MessageQueue + ?Sized>(sender: &MessageSender<Q>) -> Vec<Chunk> {
        sender.chunk_stream().unwrap().collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_hello_then_close() {
        let sender = MessageSender::new();
        sender.send_text_message("hello").unwrap();
        sender.close().unwrap();

        let mut stream = sender.chunk_stream().unwrap();

        let first = stream.next_chunk().unwrap();
        assert_eq!(first.data(), &Bytes::from_static(b"hello"));
        assert_eq!(first.extensions(), &plain_text("UTF-8"));
        assert!(stream.has_next());

        let second = stream.next_chunk().unwrap();
        assert!(second.data().is_empty());
        assert!(second.extensions().is_empty());
        assert!(!stream.has_next());

        assert!(stream.next_chunk().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_call_order_is_preserved() {
        let sender = MessageSender::new();
        sender.send_text_message("one").unwrap();
        sender.send_binary(Bytes::from_static(&[1, 2, 3]), Extensions::new().with("Id", "2")).unwrap();
        sender.ping().unwrap();
        sender.send_text_message("four").unwrap();
        sender.close().unwrap();

        let chunks = drain(&sender);
        let data: Vec<&[u8]> = chunks.iter().map(|chunk| chunk.data().as_ref()).collect();
        assert_eq!(data, vec![&b"one"[..], &[1, 2, 3][..], &b"\n"[..], &b"four"[..], &b""[..]]);
        assert_eq!(chunks[1].extensions(), &Extensions::new().with("Id", "2"));
        assert!(chunks.last().unwrap().is_last());
    }

    #[test]
    fn test_empty_messages_become_pings() {
        let sender = MessageSender::new();
        sender.send_text_message("").unwrap();
        sender.send_binary_message(Vec::<u8>::new()).unwrap();
        sender.send_binary(Bytes::new(), Extensions::new().with("Ignored", "yes")).unwrap();
        sender.ping().unwrap();
        sender.close().unwrap();

        let chunks = drain(&sender);
        assert_eq!(chunks.len(), 5);

        let ping = Chunk::new(Bytes::from_static(b"\n"), Extensions::empty());
        for chunk in &chunks[..4] {
            assert_eq!(chunk, &ping);
        }
        assert!(chunks[4].is_last());
    }

    #[test]
    fn test_close_enqueues_one_terminal() {
        let sender = MessageSender::new();
        sender.send_text_message("last").unwrap();
        sender.close().unwrap();
        sender.close().unwrap();
        sender.close().unwrap();

        let mut stream = sender.chunk_stream().unwrap();
        assert_eq!(stream.next_chunk().unwrap().data(), &Bytes::from_static(b"last"));
        assert!(stream.next_chunk().unwrap().is_last());
        assert!(!stream.has_next());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_send_after_close_fails() {
        let sender = MessageSender::new();
        sender.close().unwrap();

        assert!(sender.is_closed());
        assert!(sender.send_text_message("hi").unwrap_err().is_invalid_state());
        assert!(sender.send_text_message("").unwrap_err().is_invalid_state());
        assert!(sender.send_binary_message(&b"hi"[..]).unwrap_err().is_invalid_state());
        assert!(sender.ping().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_chunk_stream_is_returned_once() {
        let sender = MessageSender::new();
        let _unused = sender.chunk_stream().unwrap();

        assert!(sender.chunk_stream().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_unsupported_charset_falls_back_to_utf8() {
        let sender = MessageSender::new();
        sender.send_text("hi", Extensions::new().with(CHARSET, "bogus-charset")).unwrap();
        sender.close().unwrap();

        let chunks = drain(&sender);
        assert_eq!(chunks[0].data(), &Bytes::from_static(b"hi"));
        assert_eq!(chunks[0].extensions().get_first(CONTENT_TYPE), Some("text/plain"));
        assert_eq!(chunks[0].extensions().get_first(CHARSET), Some("UTF-8"));
        assert_eq!(chunks[0].extensions().get_all(CHARSET).count(), 1);
    }

    #[test]
    fn test_requested_charset_is_used() {
        let sender = MessageSender::new();
        let extensions = Extensions::new().with("Id", "9").with("charset", "ISO-8859-1").with(CONTENT_TYPE, "text/html");
        sender.send_text("café", extensions).unwrap();
        sender.close().unwrap();

        let chunks = drain(&sender);
        assert_eq!(chunks[0].data(), &Bytes::from_static(b"caf\xe9"));
        assert_eq!(
            chunks[0].extensions().iter().collect::<Vec<_>>(),
            vec![("Id", "9"), (CONTENT_TYPE, "text/plain"), (CHARSET, "windows-1252")]
        );
    }

    #[test]
    fn test_capacity_one_fail_fast() {
        let sender = MessageSender::with_config(&SenderConfig::default().with_capacity(1)).unwrap();
        sender.send_text_message("a").unwrap();

        let error = sender.send_text_message("b").unwrap_err();
        assert!(matches!(error, SenderError::QueueFull { capacity: 1 }));

        // closing a full queue still terminates the stream
        sender.close().unwrap();
        let chunks = drain(&sender);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].data(), &Bytes::from_static(b"a"));
        assert!(chunks[1].is_last());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = MessageSender::with_config(&SenderConfig::default().with_capacity(0));
        assert!(matches!(result, Err(SenderError::InvalidConfig { .. })));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let result = MessageSender::with_queue(Arc::new(CountingQueue::default())).poll_interval(Duration::ZERO);
        assert!(matches!(result, Err(SenderError::InvalidConfig { .. })));
    }

    #[test]
    fn test_idle_stream_does_not_spin() {
        let queue = Arc::new(CountingQueue::default());
        let sender = Arc::new(
            MessageSender::with_queue(Arc::clone(&queue)).poll_interval(Duration::from_secs(60)).unwrap(),
        );
        let stream = sender.chunk_stream().unwrap();

        let consumer = thread::spawn(move || stream.collect::<Result<Vec<_>, _>>());
        thread::sleep(Duration::from_millis(200));
        sender.close().unwrap();

        let chunks = consumer.join().unwrap().unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_last());
        // one wait, woken by the terminal message
        assert!(queue.dequeues.load(Ordering::Relaxed) <= 2);
    }

    #[test]
    fn test_unmappable_characters_become_question_marks() {
        let sender = MessageSender::new();
        sender.send_text("日本", Extensions::new().with(CHARSET, "ISO-8859-1")).unwrap();
        sender.send_text("a€b", Extensions::new().with(CHARSET, "ISO-8859-1")).unwrap();
        sender.close().unwrap();

        let chunks = drain(&sender);
        assert_eq!(chunks[0].data(), &Bytes::from_static(b"??"));
        assert_eq!(chunks[0].extensions(), &plain_text("windows-1252"));
        // the euro sign exists in windows-1252
        assert_eq!(chunks[1].data(), &Bytes::from_static(b"a\x80b"));
    }

    #[test]
    fn test_queue_trait_object() {
        let queue: Arc<dyn MessageQueue> = Arc::new(BoundedQueue::blocking(4));
        let sender = MessageSender::with_queue(queue);
        sender.send_text_message("dyn").unwrap();
        sender.close().unwrap();

        let chunks = drain(&sender);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].data(), &Bytes::from_static(b"dyn"));
        assert!(chunks[1].is_last());
    }

    #[test]
    fn test_drop_closes_sender() {
        let sender = MessageSender::new();
        let stream = sender.chunk_stream().unwrap();
        sender.send_text_message("a").unwrap();
        drop(sender);

        let chunks = stream.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].data(), &Bytes::from_static(b"a"));
        assert!(chunks[1].is_last());
    }

    #[test]
    fn test_dropping_last_handle_ends_waiting_stream() {
        let sender = Arc::new(MessageSender::new());
        let stream = sender.chunk_stream().unwrap();
        let consumer = thread::spawn(move || stream.collect::<Result<Vec<_>, _>>());

        let producer = {
            let sender = Arc::clone(&sender);
            thread::spawn(move || sender.send_text_message("x").unwrap())
        };
        producer.join().unwrap();
        drop(sender);

        let chunks = consumer.join().unwrap().unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].is_last());
    }

    #[test]
    fn test_concurrent_producers_keep_their_order() {
        const PRODUCERS: usize = 4;
        const MESSAGES: usize = 200;

        let config = SenderConfig::default().with_capacity(8).with_overflow(OverflowPolicy::Block);
        let sender = Arc::new(MessageSender::with_config(&config).unwrap());
        let stream = sender.chunk_stream().unwrap();

        let consumer = thread::spawn(move || stream.collect::<Result<Vec<_>, _>>());

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let sender = Arc::clone(&sender);
                thread::spawn(move || {
                    for i in 0..MESSAGES {
                        let extensions = Extensions::new().with("Producer", producer.to_string());
                        sender.send_text(&i.to_string(), extensions).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let closers: Vec<_> = (0..PRODUCERS)
            .map(|_| {
                let sender = Arc::clone(&sender);
                thread::spawn(move || sender.close())
            })
            .collect();
        for closer in closers {
            closer.join().unwrap().unwrap();
        }

        let chunks = consumer.join().unwrap().unwrap();
        assert_eq!(chunks.len(), PRODUCERS * MESSAGES + 1);
        assert_eq!(chunks.iter().filter(|chunk| chunk.is_last()).count(), 1);
        assert!(chunks.last().unwrap().is_last());

        let mut next_expected: HashMap<String, usize> = HashMap::new();
        for chunk in &chunks[..chunks.len() - 1] {
            let producer = chunk.extensions().get_first("Producer").unwrap().to_string();
            let value: usize = std::str::from_utf8(chunk.data()).unwrap().parse().unwrap();
            let expected = next_expected.entry(producer).or_insert(0);
            assert_eq!(value, *expected);
            *expected += 1;
        }
        assert!(next_expected.values().all(|&count| count == MESSAGES));
    }

    #[test]
    fn test_racing_close_never_lands_a_message_after_terminal() {
        for _ in 0..50 {
            let sender = Arc::new(MessageSender::new());

            let producer = {
                let sender = Arc::clone(&sender);
                thread::spawn(move || {
                    // stops at the first failure, either closed or full
                    while sender.send_text_message("x").is_ok() {}
                })
            };
            let closer = {
                let sender = Arc::clone(&sender);
                thread::spawn(move || sender.close())
            };

            producer.join().unwrap();
            closer.join().unwrap().unwrap();

            let chunks = drain(&sender);
            assert!(chunks.last().unwrap().is_last());
            assert_eq!(chunks.iter().filter(|chunk| chunk.is_last()).count(), 1);
        }
    }
}
