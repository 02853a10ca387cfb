//! NCSA common log format record
//!
//! Field layout for one access-log line:
//!
//! ```text
//! remotehost rfc931 authuser [date] "request" status bytes
//! ```
//!
//! e.g. `127.0.0.1 user-identifier frank [10/Oct/2000:13:55:36 -0700]
//! "GET /apache_pb.gif HTTP/1.0" 200 2326`. The timestamp is broken
//! into its components so consumers can reassemble dates in any order,
//! and the request line into method, path, and protocol. Punctuation
//! between fields is matched but not emitted. A malformed line is
//! reported as one error and skipped to the next newline.

use std::sync::Arc;

use serde::Serialize;

use recscan_core::{scan, FieldStep, Lexer, Record, ScanFn, Token, TokenKind};

const DIGITS: &str = "0123456789";
const SIGNS: &str = "+-";

/// Field kinds of an NCSA common log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NcsaField {
    /// Punctuation and separators, never emitted.
    Ignore,
    RemoteHost,
    RemoteLogname,
    RemoteUser,
    RequestDay,
    RequestMonth,
    RequestYear,
    RequestHour,
    RequestMinute,
    RequestSecond,
    RequestTimezone,
    RequestMethod,
    RequestPath,
    RequestProtocol,
    ResponseStatus,
    ResponseBytes,
}

/// Scanner for a numeric timezone such as `-0700` or `+05:30`.
fn numeric_timezone() -> ScanFn<NcsaField> {
    Arc::new(
        |l: &mut Lexer<NcsaField>, kind: NcsaField, emit: bool| {
            if !l.accept(SIGNS) {
                let got = peeked(l);
                l.emit_error(format!("expected a timezone sign (+ or -), got {}", got));
                return false;
            }
            if !l.accept(DIGITS) || !l.accept(DIGITS) {
                let got = peeked(l);
                l.emit_error(format!("expected a two-digit timezone hour, got {}", got));
                return false;
            }
            // the colon between hours and minutes is optional
            l.accept(":");
            if !l.accept(DIGITS) || !l.accept(DIGITS) {
                let got = peeked(l);
                l.emit_error(format!("expected a two-digit timezone minute, got {}", got));
                return false;
            }
            if emit {
                l.emit(TokenKind::Field(kind));
            } else {
                l.skip();
            }
            true
        },
    )
}

fn peeked(l: &mut Lexer<NcsaField>) -> String {
    match l.peek() {
        Some(c) => format!("{:?}", c),
        None => "end of input".to_string(),
    }
}

/// Build the NCSA common log record with the given buffer size hint.
pub fn record(buflen: usize) -> Record<NcsaField> {
    use NcsaField::*;

    let steps = vec![
        FieldStep::new(RemoteHost, scan::except_run(" "), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(RemoteLogname, scan::except_run(" "), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(RemoteUser, scan::except_run(" "), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(Ignore, scan::accept_one("["), false),
        FieldStep::new(RequestDay, scan::digits(), true),
        FieldStep::new(Ignore, scan::accept_one("/"), false),
        FieldStep::new(RequestMonth, scan::letters(), true),
        FieldStep::new(Ignore, scan::accept_one("/"), false),
        FieldStep::new(RequestYear, scan::digits(), true),
        FieldStep::new(Ignore, scan::accept_one(":"), false),
        FieldStep::new(RequestHour, scan::digits(), true),
        FieldStep::new(Ignore, scan::accept_one(":"), false),
        FieldStep::new(RequestMinute, scan::digits(), true),
        FieldStep::new(Ignore, scan::accept_one(":"), false),
        FieldStep::new(RequestSecond, scan::digits(), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(RequestTimezone, numeric_timezone(), true),
        FieldStep::new(Ignore, scan::accept_one("]"), false),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(Ignore, scan::accept_one("\""), false),
        FieldStep::new(RequestMethod, scan::except_run(" "), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(RequestPath, scan::except_run(" "), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(RequestProtocol, scan::except_run("\""), true),
        FieldStep::new(Ignore, scan::accept_one("\""), false),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(ResponseStatus, scan::except_run(" "), true),
        FieldStep::new(Ignore, scan::accept_one(" "), false),
        FieldStep::new(ResponseBytes, scan::except_run("\n"), true),
        FieldStep::new(Ignore, scan::accept_one("\n"), false),
    ];
    Record::new(buflen, steps, scan::skip_past("\n"))
}

/// Reassembles field tokens into canonical NCSA lines.
///
/// Feed every non-error token in order; a completed line is returned
/// when the end-of-record marker arrives. After an error token, call
/// [`LineFormatter::clear`] to drop the partial line; the abandoned
/// record's end-of-record marker is then swallowed instead of
/// producing an empty line.
#[derive(Debug, Default)]
pub struct LineFormatter {
    buf: String,
    dropped: bool,
}

impl LineFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partially assembled line and the marker that closes the
    /// abandoned record.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.dropped = true;
    }

    pub fn push(&mut self, token: &Token<NcsaField>) -> Option<String> {
        use NcsaField::*;

        let field = match &token.kind {
            TokenKind::Field(field) => *field,
            TokenKind::EndOfRecord => {
                if self.dropped {
                    self.dropped = false;
                    return None;
                }
                return Some(std::mem::take(&mut self.buf));
            }
            TokenKind::Error | TokenKind::EndOfInput => return None,
        };
        match field {
            RemoteHost => {}
            RequestDay => self.buf.push_str(" ["),
            RequestMonth | RequestYear => self.buf.push('/'),
            RequestHour | RequestMinute | RequestSecond => self.buf.push(':'),
            RequestMethod => self.buf.push_str("] \""),
            ResponseStatus => self.buf.push_str("\" "),
            _ => self.buf.push(' '),
        }
        self.buf.push_str(&token.text);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    const SAMPLE: &str = "127.0.0.1 user-identifier frank \
        [10/Oct/2000:13:55:36 -0700] \
        \"GET /apache_pb.gif HTTP/1.0\" 200 2326\n";

    fn lex(input: &str) -> Vec<Token<NcsaField>> {
        let reader = io::Cursor::new(input.as_bytes().to_vec());
        Lexer::new("ncsa-test", reader, record(8192))
            .unwrap()
            .collect()
    }

    fn field_text(tokens: &[Token<NcsaField>], field: NcsaField) -> Option<&str> {
        tokens
            .iter()
            .find(|t| t.kind == TokenKind::Field(field))
            .map(|t| t.text.as_str())
    }

    #[test]
    fn test_sample_line_fields() {
        let tokens = lex(SAMPLE);
        assert!(
            tokens.iter().all(|t| !t.kind.is_error()),
            "unexpected errors: {:?}",
            tokens
        );
        assert_eq!(field_text(&tokens, NcsaField::RemoteHost), Some("127.0.0.1"));
        assert_eq!(field_text(&tokens, NcsaField::RemoteUser), Some("frank"));
        assert_eq!(field_text(&tokens, NcsaField::RequestDay), Some("10"));
        assert_eq!(field_text(&tokens, NcsaField::RequestMonth), Some("Oct"));
        assert_eq!(field_text(&tokens, NcsaField::RequestYear), Some("2000"));
        assert_eq!(
            field_text(&tokens, NcsaField::RequestTimezone),
            Some("-0700")
        );
        assert_eq!(field_text(&tokens, NcsaField::RequestMethod), Some("GET"));
        assert_eq!(
            field_text(&tokens, NcsaField::RequestPath),
            Some("/apache_pb.gif")
        );
        assert_eq!(
            field_text(&tokens, NcsaField::RequestProtocol),
            Some("HTTP/1.0")
        );
        assert_eq!(field_text(&tokens, NcsaField::ResponseStatus), Some("200"));
        assert_eq!(field_text(&tokens, NcsaField::ResponseBytes), Some("2326"));
    }

    #[test]
    fn test_sample_line_markers() {
        let tokens = lex(SAMPLE);
        let eor = tokens.iter().filter(|t| t.kind.is_end_of_record()).count();
        assert_eq!(eor, 1);
        assert!(tokens.last().unwrap().kind.is_end_of_input());
    }

    #[test]
    fn test_formatter_rebuilds_canonical_line() {
        let tokens = lex(SAMPLE);
        let mut formatter = LineFormatter::new();
        let mut lines = Vec::new();
        for token in &tokens {
            if let Some(line) = formatter.push(token) {
                lines.push(line);
            }
        }
        assert_eq!(lines, vec![SAMPLE.trim_end().to_string()]);
    }

    #[test]
    fn test_timezone_with_colon() {
        let line = SAMPLE.replace("-0700", "+05:30");
        let tokens = lex(&line);
        assert_eq!(
            field_text(&tokens, NcsaField::RequestTimezone),
            Some("+05:30")
        );
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let input = format!("   \n{}", SAMPLE);
        let tokens = lex(&input);
        let errors = tokens.iter().filter(|t| t.kind.is_error()).count();
        assert_eq!(errors, 1, "tokens: {:?}", tokens);
        // the good line after the bad one still parses
        assert_eq!(field_text(&tokens, NcsaField::RemoteHost), Some("127.0.0.1"));
    }

    #[test]
    fn test_formatter_emits_no_line_for_malformed_record() {
        // a failed record must produce no output at all, not a blank
        // line when its end-of-record marker arrives
        let input = format!("   \n{}", SAMPLE);
        let mut formatter = LineFormatter::new();
        let mut lines = Vec::new();
        for token in &lex(&input) {
            if token.kind.is_error() {
                formatter.clear();
            } else if let Some(line) = formatter.push(token) {
                lines.push(line);
            }
        }
        assert_eq!(lines, vec![SAMPLE.trim_end().to_string()]);
    }

    #[test]
    fn test_bad_timezone_reports_expected_and_actual() {
        let line = SAMPLE.replace("-0700", "PST");
        let tokens = lex(&line);
        let error = tokens.iter().find(|t| t.kind.is_error()).unwrap();
        assert!(
            error.text.contains("timezone sign"),
            "message: {}",
            error.text
        );
        assert!(error.text.contains("'P'"), "message: {}", error.text);
    }
}
