//! Lexer state and record driver
//!
//! A single mutable [`Lexer`] owns the input reader, the growable byte
//! buffer, and the cursor over it. Field-scanning routines drive the
//! cursor through the accept/except primitives and report tokens through
//! the emitter; the record driver sequences the field steps of the
//! declared [`Record`] and turns the whole input into a pull-based token
//! stream consumed one [`next_token`](Lexer::next_token) at a time.

use std::collections::VecDeque;
use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cursor::{decode, MAX_CHAR_LEN};
use crate::record::{BuildError, Record};
use crate::token::{Token, TokenKind};

const CURSOR_TARGET: &str = "recscan::cursor";
const DRIVER_TARGET: &str = "recscan::driver";

/// Cancellation flag shared between a lexer and its consumer.
///
/// Checked before each field step; once set, the driver closes the
/// stream by emitting the terminal [`TokenKind::EndOfInput`] token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Driver state: which field of the current record runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    /// Scanning field `i` of the current record.
    Field(usize),
    /// All fields done (or the record was abandoned); emit the marker.
    EndOfRecord,
    /// Input exhausted; emit the terminal token.
    AtEof,
    /// Terminal token delivered; the stream is closed.
    Done,
}

/// Tokenizer over one input stream, for one record layout.
///
/// Holds the scanner state: the reader, the read-ahead buffer, the cursor
/// position and item start within it, and the driver's progress through
/// the record's field steps. Mutated exclusively through the methods
/// below; never shared between concurrent writers.
pub struct Lexer<K> {
    /// Name of the input, used only in read-error reports.
    name: String,
    input: Box<dyn Read + Send>,
    record: Record<K>,
    /// Scratch buffer for reads, `record.buflen` bytes.
    chunk: Vec<u8>,
    /// Bytes holding at least the token in progress.
    buf: Vec<u8>,
    /// Current parse position in `buf`.
    pos: usize,
    /// Start of the in-progress token in `buf`.
    start: usize,
    /// Encoded width of the most recently advanced character; zeroed by
    /// `backtrack` and `skip` so a stale width is never applied twice.
    width: usize,
    /// Absolute offset in the overall stream corresponding to `pos`.
    abs_pos: u64,
    /// End of input reached. Sticky.
    eof: bool,
    /// Position of the most recently delivered token.
    last_pos: u64,
    /// Tokens produced but not yet pulled by the consumer.
    pending: VecDeque<Token<K>>,
    state: DriverState,
    cancel: CancelToken,
}

impl<K: Clone + fmt::Debug> Lexer<K> {
    /// Build a lexer for `record` over the reader `input`.
    ///
    /// The name is only used for read-error messages. Fails fast if the
    /// record layout is invalid; no partial lexer is created.
    pub fn new(
        name: impl Into<String>,
        input: impl Read + Send + 'static,
        record: Record<K>,
    ) -> Result<Self, BuildError> {
        record.validate()?;
        let buflen = record.buflen;
        Ok(Self {
            name: name.into(),
            input: Box::new(input),
            record,
            chunk: vec![0; buflen],
            buf: Vec::with_capacity(buflen),
            pos: 0,
            start: 0,
            width: 0,
            abs_pos: 0,
            eof: false,
            last_pos: 0,
            pending: VecDeque::new(),
            state: DriverState::Field(0),
            cancel: CancelToken::new(),
        })
    }

    /// Shared flag that stops the driver before its next field step.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Position of the most recent token returned by `next_token`.
    pub fn last_pos(&self) -> u64 {
        self.last_pos
    }

    // ---- cursor ----------------------------------------------------

    /// Consume and return the next character, or `None` at end of input.
    ///
    /// Refills the buffer from the reader whenever fewer than the maximum
    /// character width remain unread. A read failure other than clean end
    /// of source is surfaced as an error token and treated as a zero-byte
    /// read; scanning continues from the current position.
    pub fn advance(&mut self) -> Option<char> {
        // a multi-byte character may straddle a read boundary, so keep
        // refilling until a full character is buffered or reads stop
        // producing bytes
        while self.buf.len() - self.pos < MAX_CHAR_LEN {
            if !self.refill() {
                break;
            }
        }
        if self.pos == self.buf.len() {
            self.eof = true;
            return None;
        }
        let (c, width) = decode(&self.buf[self.pos..]);
        self.width = width;
        self.pos += width;
        self.abs_pos += width as u64;
        Some(c)
    }

    /// One read from the input. Returns whether any bytes were added.
    fn refill(&mut self) -> bool {
        match self.input.read(&mut self.chunk) {
            Ok(0) => false,
            Ok(n) => {
                trace!(target: CURSOR_TARGET, bytes = n, "refilled buffer");
                self.buf.extend_from_slice(&self.chunk[..n]);
                true
            }
            Err(e) => {
                warn!(target: CURSOR_TARGET, error = %e, "input read failed");
                self.emit_error(format!("{}: {}", self.name, e));
                false
            }
        }
    }

    /// Return the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        let c = self.advance();
        self.backtrack();
        c
    }

    /// Step back one character. Well-defined at most once per `advance`;
    /// a second consecutive call is a no-op, as is any call once end of
    /// input has been reached.
    pub fn backtrack(&mut self) {
        if self.eof {
            return;
        }
        self.pos -= self.width;
        self.abs_pos -= self.width as u64;
        self.width = 0;
    }

    /// Byte length of the in-progress token.
    pub fn span_len(&self) -> usize {
        self.pos - self.start
    }

    /// Raw bytes of the in-progress token.
    pub fn span_bytes(&self) -> &[u8] {
        &self.buf[self.start..self.pos]
    }

    // ---- scan primitives -------------------------------------------

    /// Consume the next character if it is in `set`.
    pub fn accept(&mut self, set: &str) -> bool {
        match self.advance() {
            Some(c) if set.contains(c) => true,
            Some(_) => {
                self.backtrack();
                false
            }
            None => false,
        }
    }

    /// Consume the next character if it is not in `set`. Fails at end of
    /// input: there is no character to consume.
    pub fn except(&mut self, set: &str) -> bool {
        match self.advance() {
            Some(c) if !set.contains(c) => true,
            Some(_) => {
                self.backtrack();
                false
            }
            None => false,
        }
    }

    /// Consume a maximal run of characters from `set`; true if at least
    /// one character was consumed.
    pub fn accept_run(&mut self, set: &str) -> bool {
        let before = self.pos;
        while let Some(c) = self.advance() {
            if !set.contains(c) {
                self.backtrack();
                break;
            }
        }
        self.pos > before
    }

    /// Consume a maximal run of characters not in `set`, stopping at end
    /// of input or at a member of `set`; true if at least one character
    /// was consumed.
    pub fn except_run(&mut self, set: &str) -> bool {
        let before = self.pos;
        while let Some(c) = self.advance() {
            if set.contains(c) {
                self.backtrack();
                break;
            }
        }
        self.pos > before
    }

    // ---- emitter ---------------------------------------------------

    /// Report the in-progress span as a token of `kind` and advance past
    /// it.
    pub fn emit(&mut self, kind: TokenKind<K>) {
        let pos = self.abs_pos - self.span_len() as u64;
        let text = String::from_utf8_lossy(self.span_bytes()).into_owned();
        debug!(target: DRIVER_TARGET, kind = ?kind, pos, len = text.len(), "emit");
        self.pending.push_back(Token::new(kind, pos, text));
        self.skip();
    }

    /// Advance past the in-progress span without reporting it.
    ///
    /// The span is complete at this point. If less than 10% of the
    /// buffer's allocation remains as headroom, the already-consumed
    /// prefix is discarded so memory stays bounded by the longest single
    /// token rather than by total input consumed.
    pub fn skip(&mut self) {
        let n = self.buf.capacity();
        let headroom = n - self.pos;
        if n / 10 >= headroom {
            self.buf.drain(..self.pos);
            self.pos = 0;
            self.start = 0;
        } else {
            self.start = self.pos;
        }
        self.width = 0;
    }

    /// Report an error token at the current position. Does not consume
    /// the in-progress span.
    pub fn emit_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: DRIVER_TARGET, pos = self.abs_pos, %message, "error token");
        self.pending
            .push_back(Token::new(TokenKind::Error, self.abs_pos, message));
    }

    // ---- record driver ---------------------------------------------

    /// Pull the next token, advancing the record driver as needed.
    ///
    /// Tokens come out in strict input order, error tokens included.
    /// Returns `None` once the terminal [`TokenKind::EndOfInput`] token
    /// has been delivered.
    pub fn next_token(&mut self) -> Option<Token<K>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                self.last_pos = token.pos;
                return Some(token);
            }
            if self.state == DriverState::Done {
                return None;
            }
            self.step();
        }
    }

    /// Advance the driver state machine by one transition.
    fn step(&mut self) {
        match self.state {
            DriverState::Field(i) => {
                if self.cancel.is_cancelled() {
                    debug!(target: DRIVER_TARGET, "cancelled, closing stream");
                    self.state = DriverState::AtEof;
                    return;
                }
                let step = self.record.steps[i].clone();
                if (step.scan)(self, step.kind, step.emit) {
                    self.state = if i + 1 == self.record.steps.len() {
                        DriverState::EndOfRecord
                    } else {
                        DriverState::Field(i + 1)
                    };
                } else {
                    trace!(target: DRIVER_TARGET, field = i, "field scan failed, recovering");
                    let recover = Arc::clone(&self.record.recover);
                    recover(self);
                    self.state = DriverState::EndOfRecord;
                }
            }
            DriverState::EndOfRecord => {
                // an abandoned field may leave a residual span if recovery
                // consumed nothing; the marker must be empty
                self.skip();
                self.emit(TokenKind::EndOfRecord);
                self.state = if self.peek().is_none() {
                    DriverState::AtEof
                } else {
                    DriverState::Field(0)
                };
            }
            DriverState::AtEof => {
                self.emit(TokenKind::EndOfInput);
                self.state = DriverState::Done;
            }
            DriverState::Done => {}
        }
    }
}

impl<K: Clone + fmt::Debug> Iterator for Lexer<K> {
    type Item = Token<K>;

    fn next(&mut self) -> Option<Token<K>> {
        self.next_token()
    }
}

impl<K: fmt::Debug> fmt::Debug for Lexer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("name", &self.name)
            .field("pos", &self.pos)
            .field("start", &self.start)
            .field("abs_pos", &self.abs_pos)
            .field("eof", &self.eof)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
