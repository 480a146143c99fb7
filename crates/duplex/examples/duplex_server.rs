use micro_duplex::connection::ChunkWriter;
use micro_duplex::protocol::Extensions;
use micro_duplex::{MessageSender, OverflowPolicy, SenderConfig, SenderError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const RESPONSE_HEAD: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nTransfer-Encoding: chunked\r\n\r\n";

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let config = SenderConfig::default().with_capacity(4).with_overflow(OverflowPolicy::Block);

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let config = config.clone();
        tokio::spawn(async move {
            match serve(tcp_stream, &config).await {
                Ok(chunks) => info!(%remote_addr, chunks, "finished streaming, connection shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "streaming failed, connection shutdown"),
            }
        });
    }
}

async fn serve(mut tcp_stream: TcpStream, config: &SenderConfig) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    // the request itself is not interpreted
    let mut request = [0u8; 4096];
    let _ = tcp_stream.read(&mut request).await?;
    tcp_stream.write_all(RESPONSE_HEAD).await?;

    let sender = Arc::new(MessageSender::with_config(config)?);
    let stream = sender.chunk_stream()?;

    let producer = Arc::clone(&sender);
    thread::spawn(move || {
        if let Err(e) = produce(&producer) {
            warn!(cause = %e, "producer stopped");
        }
    });

    let mut writer = ChunkWriter::new(&mut tcp_stream);
    let chunks = writer.send_stream(stream).await?;
    tcp_stream.shutdown().await?;
    Ok(chunks)
}

fn produce(sender: &MessageSender) -> Result<(), SenderError> {
    for i in 1..=5 {
        sender.send_text(&format!("message {i}"), Extensions::new().with("Seq", i.to_string()))?;
        thread::sleep(Duration::from_millis(500));
        sender.ping()?;
    }

    sender.send_binary(vec![0xCAu8, 0xFE], Extensions::new().with("Kind", "binary"))?;
    sender.send_text("adiós", Extensions::new().with("Charset", "ISO-8859-1"))?;
    sender.close()
}
