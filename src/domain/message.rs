//! Opaque text message carried from producers to client sessions.

use std::fmt;
use std::sync::Arc;

/// One relayed message: the decoded text of a single producer chunk.
///
/// Immutable and cheap to clone; every session receiving the same publish
/// shares one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(Arc<str>);

impl Message {
    /// Decodes a raw producer chunk as UTF-8.
    ///
    /// Malformed sequences are replaced with `U+FFFD`; decoding never fails.
    #[must_use]
    pub fn from_chunk(chunk: &[u8]) -> Self {
        Self(Arc::from(&*String::from_utf8_lossy(chunk)))
    }

    /// Returns the message text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_utf8_is_kept_verbatim() {
        let msg = Message::from_chunk("héllo, wörld\n".as_bytes());
        assert_eq!(msg.as_str(), "héllo, wörld\n");
    }

    #[test]
    fn malformed_bytes_are_replaced() {
        let msg = Message::from_chunk(&[b'o', b'k', 0xff, 0xfe, b'!']);
        assert_eq!(msg.as_str(), "ok\u{fffd}\u{fffd}!");
    }

    #[test]
    fn truncated_multibyte_sequence_is_replaced() {
        // First two bytes of a three-byte sequence.
        let msg = Message::from_chunk(&[b'a', 0xe2, 0x82]);
        assert_eq!(msg.as_str(), "a\u{fffd}");
    }

    #[test]
    fn clones_share_text() {
        let a = Message::from("shared");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.to_string(), "shared");
    }
}
