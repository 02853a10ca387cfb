//! UTF-8 decode helpers
//!
//! One-character decoding over raw bytes. Malformed sequences decode to
//! U+FFFD with width 1 so the cursor always makes progress and position
//! accounting stays byte-exact.

/// Maximum encoded width of a character, in bytes.
pub const MAX_CHAR_LEN: usize = 4;

/// Unicode replacement character, substituted for malformed sequences.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Expected sequence length for a UTF-8 lead byte.
///
/// `None` for continuation bytes or bytes outside the encodable range.
pub fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

/// Decode the first character of `bytes`, returning it with its encoded
/// width. Malformed or truncated sequences yield `(REPLACEMENT, 1)`.
///
/// `bytes` must be non-empty.
pub fn decode(bytes: &[u8]) -> (char, usize) {
    let lead = bytes[0];
    let len = match utf8_len(lead) {
        Some(len) if len <= bytes.len() => len,
        _ => return (REPLACEMENT, 1),
    };
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => match s.chars().next() {
            Some(c) => (c, len),
            None => (REPLACEMENT, 1),
        },
        Err(_) => (REPLACEMENT, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_len() {
        assert_eq!(utf8_len(b'a'), Some(1));
        assert_eq!(utf8_len(0xC3), Some(2));
        assert_eq!(utf8_len(0xE4), Some(3));
        assert_eq!(utf8_len(0xF0), Some(4));
        assert_eq!(utf8_len(0x80), None); // continuation byte
        assert_eq!(utf8_len(0xFF), None);
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode(b"abc"), ('a', 1));
    }

    #[test]
    fn test_decode_multibyte() {
        assert_eq!(decode("中文".as_bytes()), ('中', 3));
        assert_eq!(decode("🎉".as_bytes()), ('🎉', 4));
    }

    #[test]
    fn test_decode_invalid_lead() {
        assert_eq!(decode(&[0x80, b'a']), (REPLACEMENT, 1));
    }

    #[test]
    fn test_decode_truncated_sequence() {
        // 4-byte lead with only one byte available
        assert_eq!(decode(&[0xF0]), (REPLACEMENT, 1));
    }

    #[test]
    fn test_decode_bad_continuation() {
        // valid lead, invalid continuation
        assert_eq!(decode(&[0xC3, b'a']), (REPLACEMENT, 1));
    }
}
