//! Charset resolution for text messages.
//!
//! Charset names are resolved through the WHATWG label table of `encoding_rs`. A label is
//! only accepted when the resolved encoding can actually produce bytes in that charset;
//! `encoding_rs` encodes UTF-16 as UTF-8, so UTF-16BE/LE are encoded here directly.
//! Characters the charset can't represent are replaced with `?`.

use bytes::Bytes;
use encoding_rs::{EncoderResult, Encoding, UTF_8, UTF_16BE, UTF_16LE};
use std::fmt;

/// Written in place of a character the charset can't represent.
const REPLACEMENT: &str = "?";

const ENCODE_BUFFER_SIZE: usize = 1024;

/// A resolved charset able to encode text into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
}

impl Charset {
    /// The fallback charset.
    pub fn utf8() -> Self {
        Self { encoding: UTF_8 }
    }

    /// Resolves a charset label, `None` if the label is unknown or can't be encoded to.
    pub fn for_label(label: &str) -> Option<Self> {
        let encoding = Encoding::for_label(label.as_bytes())?;
        Self::is_encodable(encoding).then_some(Self { encoding })
    }

    /// Resolves the optional label, silently falling back to UTF-8.
    pub fn resolve_or_default(label: Option<&str>) -> Self {
        label.and_then(Self::for_label).unwrap_or_else(Self::utf8)
    }

    /// Canonical name of the charset, e.g. `UTF-8` or `windows-1252`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encodes `text`, replacing every character the charset can't represent with `?`.
    pub fn encode(&self, text: &str) -> Bytes {
        if self.encoding == UTF_8 {
            Bytes::copy_from_slice(text.as_bytes())
        } else if self.encoding == UTF_16BE {
            Bytes::from(text.encode_utf16().flat_map(u16::to_be_bytes).collect::<Vec<u8>>())
        } else if self.encoding == UTF_16LE {
            Bytes::from(text.encode_utf16().flat_map(u16::to_le_bytes).collect::<Vec<u8>>())
        } else {
            Bytes::from(self.encode_with_replacement(text))
        }
    }

    fn encode_with_replacement(&self, text: &str) -> Vec<u8> {
        let mut encoder = self.encoding.new_encoder();
        let mut encoded = Vec::with_capacity(text.len());
        let mut buffer = [0u8; ENCODE_BUFFER_SIZE];
        let mut remaining = text;

        loop {
            let (result, read, written) = encoder.encode_from_utf8_without_replacement(remaining, &mut buffer, true);
            encoded.extend_from_slice(&buffer[..written]);
            remaining = &remaining[read..];

            match result {
                EncoderResult::InputEmpty => return encoded,
                EncoderResult::OutputFull => {}
                // the unmappable character has been consumed; the replacement goes through
                // the encoder so stateful encodings such as ISO-2022-JP switch back to ASCII
                EncoderResult::Unmappable(_) => {
                    let (_, _, written) = encoder.encode_from_utf8_without_replacement(REPLACEMENT, &mut buffer, false);
                    encoded.extend_from_slice(&buffer[..written]);
                }
            }
        }
    }

    fn is_encodable(encoding: &'static Encoding) -> bool {
        encoding.output_encoding() == encoding || encoding == UTF_16BE || encoding == UTF_16LE
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
