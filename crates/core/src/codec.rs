//! Built-in codecs backed by `encoding_rs`.
//!
//! Both variants share one lossy policy: every Unicode scalar the target
//! encoding cannot map is written as a single `?` byte. `encoding_rs` on its
//! own would emit HTML numeric character references instead.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{Encoder, EncoderResult, Encoding};

use crate::error::CodecError;
use crate::Codec;

/// Byte written in place of an unmappable scalar.
const PLACEHOLDER: u8 = b'?';

/// Scratch buffer size for incremental encoding.
const CHUNK_LEN: usize = 4096;

/// Identifier of a target text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict 7-bit US-ASCII.
    ///
    /// Kept apart from WHATWG labels, which resolve "us-ascii" to windows-1252.
    Ascii,
    Whatwg(&'static Encoding),
}

impl TextEncoding {
    /// Look up an encoding by label, case-insensitively.
    pub fn for_label(label: &str) -> Result<Self, CodecError> {
        let trimmed = label.trim();
        if ["ascii", "us-ascii", "iso646-us"]
            .iter()
            .any(|ascii| trimmed.eq_ignore_ascii_case(ascii))
        {
            return Ok(Self::Ascii);
        }
        match Encoding::for_label(trimmed.as_bytes()) {
            // Labels such as "iso-2022-kr" resolve to the decode-only
            // replacement encoding, whose encoder writes UTF-8.
            Some(encoding) if encoding == encoding_rs::REPLACEMENT => {
                Err(CodecError::Unsupported(label.to_string()))
            }
            Some(encoding) => Ok(Self::Whatwg(encoding)),
            None => Err(CodecError::UnknownLabel(label.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "US-ASCII",
            Self::Whatwg(encoding) => encoding.name(),
        }
    }
}

impl From<&'static Encoding> for TextEncoding {
    fn from(encoding: &'static Encoding) -> Self {
        Self::Whatwg(encoding)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode `text`, calling `on_unmappable` for every scalar the encoder rejects.
///
/// Returns `None` as soon as `on_unmappable` returns `false`.
fn encode_with<F>(encoder: &mut Encoder, text: &str, mut on_unmappable: F) -> Option<Vec<u8>>
where
    F: FnMut(char, &mut Vec<u8>) -> bool,
{
    let mut bytes = Vec::with_capacity(text.len());
    let mut chunk = [0u8; CHUNK_LEN];
    let mut src = text;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(src, &mut chunk, true);
        bytes.extend_from_slice(&chunk[..written]);
        src = &src[read..];

        match result {
            EncoderResult::InputEmpty => return Some(bytes),
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(c) => {
                if !on_unmappable(c, &mut bytes) {
                    return None;
                }
            }
        }
    }
}

/// Decode the bytes an `encoding` encoder produced.
fn decode(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, CodecError> {
    // The encoder writes the output encoding, which differs from `encoding`
    // for UTF-16.
    encoding
        .output_encoding()
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| CodecError::Undecodable {
            encoding: encoding.name().to_string(),
        })
}

impl Codec for TextEncoding {
    fn name(&self) -> &str {
        TextEncoding::name(self)
    }

    fn can_represent(&self, text: &str) -> bool {
        match self {
            Self::Ascii => text.is_ascii(),
            // Some mappable scalars still decode to something else, such as
            // the yen sign in Shift_JIS, so the bytes must decode back to the
            // same text.
            Self::Whatwg(encoding) => {
                encode_with(&mut encoding.new_encoder(), text, |_, _| false)
                    .and_then(|bytes| decode(*encoding, &bytes).ok())
                    .map_or(false, |decoded| decoded == text)
            }
        }
    }

    fn lossy_round_trip(&self, text: &str) -> Result<String, CodecError> {
        match self {
            Self::Ascii => Ok(text
                .chars()
                .map(|c| if c.is_ascii() { c } else { PLACEHOLDER as char })
                .collect()),
            Self::Whatwg(encoding) => {
                let bytes = encode_with(&mut encoding.new_encoder(), text, |_, bytes| {
                    bytes.push(PLACEHOLDER);
                    true
                })
                .unwrap_or_default();
                decode(*encoding, &bytes)
            }
        }
    }
}
