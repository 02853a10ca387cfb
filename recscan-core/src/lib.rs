//! recscan core - tokenizer for fixed-layout text records
//!
//! The caller declares a [`Record`]: an ordered list of [`FieldStep`]s
//! (token kind + scanning routine + emit flag), a buffer size hint, and a
//! recovery routine. The [`Lexer`] streams bytes from a reader through a
//! growable buffer, drives one scanner per declared field in order, and
//! yields [`Token`]s with byte-accurate positions. A malformed record is
//! reported as a single error token and the recovery routine resynchronizes
//! to the next record boundary; the stream as a whole never aborts.
//!
//! Only operates on the caller-supplied reader, no file IO or terminal
//! output. Configuration is passed explicitly via the record, not via
//! global state.
//!
//! # Example
//!
//! ```
//! use recscan_core::{scan, Lexer, Record, FieldStep, TokenKind};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Field { Word }
//!
//! let record = Record::new(
//!     64,
//!     vec![
//!         FieldStep::new(Field::Word, scan::except_run(" \n"), true),
//!         FieldStep::new(Field::Word, scan::accept_one("\n"), false),
//!     ],
//!     scan::skip_past("\n"),
//! );
//!
//! let mut lexer = Lexer::new("words", "hello\n".as_bytes(), record).unwrap();
//! let token = lexer.next_token().unwrap();
//! assert_eq!(token.kind, TokenKind::Field(Field::Word));
//! assert_eq!(token.text, "hello");
//! ```

pub mod channel;
pub mod cursor;
pub mod lexer;
pub mod record;
pub mod scan;
pub mod token;

pub use channel::{spawn, TokenStream};
pub use lexer::{CancelToken, Lexer};
pub use record::{BuildError, FieldStep, Record, RecoverFn, ScanFn};
pub use token::{Token, TokenKind};
