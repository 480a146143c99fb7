//! Core types shared by the sender, its queue and the chunk framing.
//!
//! # Components
//!
//! - **Messages** ([`message`]): what flows through the sender
//!   - [`Message`]: an immutable payload plus extensions, owned by the queue until dequeued
//!   - [`Chunk`]: the same pair as handed to the transport
//!
//! - **Extensions** ([`extensions`]): ordered, duplicate-friendly chunk extension metadata
//!   - [`Extensions`]
//!
//! - **Charsets** ([`charset`]): charset label resolution with a silent UTF-8 fallback
//!   - [`Charset`]
//!
//! - **Error Handling** ([`error`]):
//!   - [`SenderError`]: invalid state, queue full, interrupted wait, bad configuration
//!   - [`SendError`]: failures while framing or writing chunks

mod message;
pub use message::Chunk;
pub use message::Message;
pub use message::PING_PAYLOAD;

mod extensions;
pub use extensions::Extensions;

mod charset;
pub use charset::Charset;

mod error;
pub use error::SendError;
pub use error::SenderError;
