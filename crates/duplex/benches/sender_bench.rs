use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use micro_duplex::codec::ChunkEncoder;
use micro_duplex::protocol::{Chunk, Extensions};
use micro_duplex::{MessageSender, OverflowPolicy, SenderConfig};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use tokio_util::codec::Encoder;

const MESSAGES: usize = 1_000;

fn bench_send_then_drain(c: &mut Criterion) {
    let config = SenderConfig::default().with_capacity(MESSAGES);

    c.bench_function("send_then_drain_text", |b| {
        b.iter(|| {
            let sender = MessageSender::with_config(&config).unwrap();
            for _ in 0..MESSAGES {
                sender.send_text_message(black_box("hello duplex")).unwrap();
            }
            sender.close().unwrap();

            let chunks = sender.chunk_stream().unwrap().count();
            black_box(chunks)
        })
    });
}

fn bench_blocking_producer(c: &mut Criterion) {
    let config = SenderConfig::default().with_capacity(16).with_overflow(OverflowPolicy::Block);

    c.bench_function("blocking_producer_binary", |b| {
        b.iter(|| {
            let sender = Arc::new(MessageSender::with_config(&config).unwrap());
            let stream = sender.chunk_stream().unwrap();

            let producer = {
                let sender = Arc::clone(&sender);
                thread::spawn(move || {
                    for _ in 0..MESSAGES {
                        sender.send_binary_message(Bytes::from_static(b"0123456789abcdef")).unwrap();
                    }
                    sender.close().unwrap();
                })
            };

            let chunks = stream.count();
            producer.join().unwrap();
            black_box(chunks)
        })
    });
}

fn bench_encode_chunks(c: &mut Criterion) {
    let extensions = Extensions::new().with("Content-Type", "text/plain").with("Charset", "UTF-8");
    let data = Bytes::from(vec![b'a'; 1024]);

    c.bench_function("encode_chunks_1k", |b| {
        b.iter(|| {
            let mut encoder = ChunkEncoder::new();
            let mut dst = BytesMut::with_capacity(MESSAGES * 1100);
            for _ in 0..MESSAGES {
                encoder.encode(Chunk::new(data.clone(), extensions.clone()), &mut dst).unwrap();
            }
            encoder.encode(Chunk::new(Bytes::new(), Extensions::empty()), &mut dst).unwrap();
            black_box(dst)
        })
    });
}

criterion_group!(benches, bench_send_then_drain, bench_blocking_producer, bench_encode_chunks);
criterion_main!(benches);
