//! Best-effort text decoding of host output
//!
//! Job logs and file blobs come from arbitrary repository content, so a
//! response is never assumed to be valid in a single encoding. Strategies are
//! tried in order and the last one always succeeds.

/// A text decoding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Strict UTF-8
    Utf8,
    /// ISO-8859-1, maps every byte to the code point of the same value
    Latin1,
    /// UTF-8 with U+FFFD substituted for invalid sequences
    Utf8Lossy,
}

/// Decoding order. The final entry is total.
pub const DECODE_STRATEGIES: [TextEncoding; 3] = [
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Utf8Lossy,
];

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Self::Latin1 => Some(bytes.iter().copied().map(char::from).collect()),
            Self::Utf8Lossy => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Text together with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

impl DecodedText {
    pub fn is_degraded(&self) -> bool {
        self.encoding != TextEncoding::Utf8
    }
}

pub fn decode_text(bytes: &[u8]) -> DecodedText {
    for encoding in DECODE_STRATEGIES {
        if let Some(text) = encoding.decode(bytes) {
            if encoding != TextEncoding::Utf8 {
                tracing::debug!(
                    "Response of {} bytes is not valid UTF-8, decoded as {:?}",
                    bytes.len(),
                    encoding
                );
            }
            return DecodedText { text, encoding };
        }
    }

    DecodedText {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: TextEncoding::Utf8Lossy,
    }
}
