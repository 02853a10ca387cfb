//! Built-in field scanners and the standard recovery routine
//!
//! Constructor functions returning ready-made [`ScanFn`]s for the common
//! field shapes: single characters and runs drawn from (or excluded from)
//! a set, quoted strings, digit/letter/whitespace runs, and numeric
//! literals. Every scanner emits exactly one error token on failure,
//! describing expected vs. actual input.

use std::fmt;
use std::sync::Arc;

use crate::lexer::Lexer;
use crate::record::{RecoverFn, ScanFn};
use crate::token::TokenKind;

/// Emit or skip the completed span, per the field's emit flag.
fn finish<K: Clone + fmt::Debug>(l: &mut Lexer<K>, kind: K, emit: bool) {
    if emit {
        l.emit(TokenKind::Field(kind));
    } else {
        l.skip();
    }
}

/// Render the outcome of a peek for an expected/actual message.
fn describe(c: Option<char>) -> String {
    match c {
        Some(c) => format!("{:?}", c),
        None => "end of input".to_string(),
    }
}

/// Scanner for a single required character from `set`.
pub fn accept_one<K>(set: &str) -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    let set = set.to_owned();
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| {
        if l.accept(&set) {
            finish(l, kind, emit);
            return true;
        }
        let got = describe(l.peek());
        l.emit_error(format!(
            "expected character from the set {:?}, got {}",
            set, got
        ));
        false
    })
}

/// Scanner for a run of one or more characters from `set`.
pub fn accept_run<K>(set: &str) -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    let set = set.to_owned();
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| {
        if l.accept_run(&set) {
            finish(l, kind, emit);
            return true;
        }
        let got = describe(l.peek());
        l.emit_error(format!(
            "expected a run of characters from the set {:?}, got {}",
            set, got
        ));
        false
    })
}

/// Scanner for a single required character not in `set`.
pub fn except_one<K>(set: &str) -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    let set = set.to_owned();
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| {
        if l.except(&set) {
            finish(l, kind, emit);
            return true;
        }
        let got = describe(l.peek());
        l.emit_error(format!(
            "expected a character outside the set {:?}, got {}",
            set, got
        ));
        false
    })
}

/// Scanner for a run of one or more characters not in `set`.
pub fn except_run<K>(set: &str) -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    let set = set.to_owned();
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| {
        if l.except_run(&set) {
            finish(l, kind, emit);
            return true;
        }
        let got = describe(l.peek());
        l.emit_error(format!(
            "expected a character outside the set {:?}, got {}",
            set, got
        ));
        false
    })
}

/// Scanner for a double-quoted string.
///
/// A backslash escapes any single character, newlines included. An
/// unescaped newline or end of input before the closing quote fails.
/// The emitted token text includes both quotes.
pub fn quote<K>() -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| {
        match l.advance() {
            Some('"') => {}
            other => {
                l.backtrack();
                l.emit_error(format!("expected '\"', got {}", describe(other)));
                return false;
            }
        }
        loop {
            match l.advance() {
                Some('\\') => {
                    l.advance();
                }
                Some('\n') => {
                    l.backtrack();
                    l.emit_error("unterminated quote");
                    return false;
                }
                None => {
                    l.emit_error("unterminated quote");
                    return false;
                }
                Some('"') => {
                    finish(l, kind, emit);
                    return true;
                }
                Some(_) => {}
            }
        }
    })
}

/// Scanner for a run of one or more decimal digits.
pub fn digits<K>() -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| loop {
        match l.advance() {
            Some(c) if c.is_ascii_digit() => {}
            other => {
                l.backtrack();
                if l.span_len() > 0 {
                    finish(l, kind, emit);
                    return true;
                }
                l.emit_error(format!("expected [0-9], got {}", describe(other)));
                return false;
            }
        }
    })
}

/// Scanner for a run of one or more alphabetic characters.
pub fn letters<K>() -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| loop {
        match l.advance() {
            Some(c) if c.is_alphabetic() => {}
            other => {
                l.backtrack();
                if l.span_len() > 0 {
                    finish(l, kind, emit);
                    return true;
                }
                l.emit_error(format!("expected letter, got {}", describe(other)));
                return false;
            }
        }
    })
}

/// Scanner for a run of one or more whitespace characters.
pub fn spaces<K>() -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| loop {
        match l.advance() {
            Some(c) if c.is_whitespace() => {}
            other => {
                l.backtrack();
                if l.span_len() > 0 {
                    finish(l, kind, emit);
                    return true;
                }
                l.emit_error(format!("expected whitespace, got {}", describe(other)));
                return false;
            }
        }
    })
}

/// Scanner for a number: decimal, hex, float, or imaginary, with an
/// optional `1+2i` complex form. Fails when the literal is immediately
/// followed by an alphanumeric character.
pub fn number<K>() -> ScanFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    Arc::new(move |l: &mut Lexer<K>, kind: K, emit: bool| {
        if !scan_number(l) {
            let text = String::from_utf8_lossy(l.span_bytes()).into_owned();
            l.emit_error(format!("bad number syntax: {:?}", text));
            return false;
        }
        if matches!(l.peek(), Some('+') | Some('-')) {
            // complex: 1+2i, no spaces, must end in 'i'
            if !scan_number(l) || l.span_bytes().last() != Some(&b'i') {
                let text = String::from_utf8_lossy(l.span_bytes()).into_owned();
                l.emit_error(format!("bad number syntax: {:?}", text));
                return false;
            }
        }
        finish(l, kind, emit);
        true
    })
}

/// Consume one numeric literal: optional sign, decimal or `0x` hex
/// digits, optional fraction, optional exponent, optional trailing `i`.
fn scan_number<K: Clone + fmt::Debug>(l: &mut Lexer<K>) -> bool {
    l.accept("+-");
    let mut digits = "0123456789";
    if l.accept("0") && l.accept("xX") {
        digits = "0123456789abcdefABCDEF";
    }
    l.accept_run(digits);
    if l.accept(".") {
        l.accept_run(digits);
    }
    if l.accept("eE") {
        l.accept("+-");
        l.accept_run("0123456789");
    }
    l.accept("i");
    // the next character must not be alphanumeric
    if is_alphanumeric(l.peek()) {
        l.advance();
        return false;
    }
    true
}

fn is_alphanumeric(c: Option<char>) -> bool {
    matches!(c, Some(c) if c == '_' || c.is_alphabetic() || c.is_numeric())
}

/// Standard recovery routine: skip to, and past, the next run of
/// characters from `set` (typically the record separator).
pub fn skip_past<K>(set: &str) -> RecoverFn<K>
where
    K: Clone + fmt::Debug + Send + Sync + 'static,
{
    let set = set.to_owned();
    Arc::new(move |l: &mut Lexer<K>| {
        if l.except_run(&set) {
            l.skip();
        }
        if l.accept_run(&set) {
            l.skip();
        }
    })
}
