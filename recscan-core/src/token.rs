//! Token data model
//!
//! A token is a (kind, position, text) triple. Three kinds are reserved by
//! the driver; all other kinds are caller-defined and travel in
//! [`TokenKind::Field`].

use serde::{Deserialize, Serialize};

/// Kind of a lexed token.
///
/// `Error`, `EndOfRecord` and `EndOfInput` are produced by the lexer
/// itself; `Field` wraps the caller-defined kind declared on a field step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind<K> {
    /// A field failed to scan or the input source failed to read; the
    /// token text carries the human-readable description.
    Error,
    /// All field steps of one record completed (or the record was
    /// abandoned after recovery).
    EndOfRecord,
    /// Terminal marker: no further tokens follow.
    EndOfInput,
    /// A caller-defined field kind.
    Field(K),
}

impl<K> TokenKind<K> {
    pub fn is_error(&self) -> bool {
        matches!(self, TokenKind::Error)
    }

    pub fn is_end_of_record(&self) -> bool {
        matches!(self, TokenKind::EndOfRecord)
    }

    pub fn is_end_of_input(&self) -> bool {
        matches!(self, TokenKind::EndOfInput)
    }
}

/// A lexed token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token<K> {
    /// The kind of this token.
    pub kind: TokenKind<K>,
    /// Byte offset of the first byte of this token in the overall input
    /// stream, independent of buffer compaction.
    pub pos: u64,
    /// The exact text of the token (the error message for `Error` tokens).
    pub text: String,
}

impl<K> Token<K> {
    pub fn new(kind: TokenKind<K>, pos: u64, text: impl Into<String>) -> Self {
        Self {
            kind,
            pos,
            text: text.into(),
        }
    }

    /// Byte length of the token text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    enum TestField {
        Word,
    }

    #[test]
    fn test_token_new() {
        let token = Token::new(TokenKind::Field(TestField::Word), 7, "abc");
        assert_eq!(token.kind, TokenKind::Field(TestField::Word));
        assert_eq!(token.pos, 7);
        assert_eq!(token.len(), 3);
    }

    #[test]
    fn test_reserved_kind_predicates() {
        assert!(TokenKind::<TestField>::Error.is_error());
        assert!(TokenKind::<TestField>::EndOfRecord.is_end_of_record());
        assert!(TokenKind::<TestField>::EndOfInput.is_end_of_input());
        assert!(!TokenKind::Field(TestField::Word).is_error());
    }

    #[test]
    fn test_token_serialize_roundtrip() {
        let token = Token::new(TokenKind::Field(TestField::Word), 42, "xyz");
        let json = serde_json::to_string(&token).unwrap();
        let back: Token<TestField> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
