//! Producer-thread token handoff
//!
//! Moves a [`Lexer`] onto a background thread and hands its tokens over a
//! capacity-zero rendezvous channel: the producer suspends after each
//! token until the consumer retrieves it, and the consumer suspends until
//! one is produced. Back-pressure is automatic; tokens arrive in strict
//! input order. Dropping the [`TokenStream`] disconnects the channel,
//! which unblocks and terminates the producer thread.

use std::fmt;
use std::sync::mpsc::{sync_channel, Receiver};
use std::thread::{self, JoinHandle};

use tracing::trace;

use crate::lexer::Lexer;
use crate::token::Token;

const TARGET: &str = "recscan::channel";

/// Consumer end of a spawned lexer.
pub struct TokenStream<K> {
    rx: Option<Receiver<Token<K>>>,
    handle: Option<JoinHandle<()>>,
    last_pos: u64,
}

impl<K> TokenStream<K> {
    /// Block until the next token is available. `None` once the producer
    /// has delivered the terminal token and finished.
    pub fn next_token(&mut self) -> Option<Token<K>> {
        let token = self.rx.as_ref()?.recv().ok()?;
        self.last_pos = token.pos;
        Some(token)
    }

    /// Position of the most recently retrieved token.
    pub fn last_pos(&self) -> u64 {
        self.last_pos
    }
}

impl<K> Iterator for TokenStream<K> {
    type Item = Token<K>;

    fn next(&mut self) -> Option<Token<K>> {
        self.next_token()
    }
}

impl<K> Drop for TokenStream<K> {
    fn drop(&mut self) {
        // disconnect first so a producer blocked in send() wakes up
        drop(self.rx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl<K> fmt::Debug for TokenStream<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStream")
            .field("last_pos", &self.last_pos)
            .finish_non_exhaustive()
    }
}

/// Drive `lexer` on a background thread, yielding its tokens through a
/// single-slot rendezvous.
pub fn spawn<K>(mut lexer: Lexer<K>) -> TokenStream<K>
where
    K: Clone + fmt::Debug + Send + 'static,
{
    let (tx, rx) = sync_channel(0);
    let handle = thread::spawn(move || {
        while let Some(token) = lexer.next_token() {
            if tx.send(token).is_err() {
                trace!(target: TARGET, "consumer gone, stopping producer");
                break;
            }
        }
    });
    TokenStream {
        rx: Some(rx),
        handle: Some(handle),
        last_pos: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldStep, Record};
    use crate::scan;
    use crate::token::TokenKind;
    use std::io;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum F {
        Word,
    }

    fn word_lexer(input: &str) -> Lexer<F> {
        let record = Record::new(
            64,
            vec![
                FieldStep::new(F::Word, scan::except_run(" \n"), true),
                FieldStep::new(F::Word, scan::accept_run(" \n"), false),
            ],
            scan::skip_past("\n"),
        );
        let reader = io::Cursor::new(input.as_bytes().to_vec());
        Lexer::new("channel-test", reader, record).unwrap()
    }

    #[test]
    fn test_spawn_delivers_in_order() {
        let mut stream = spawn(word_lexer("one two\n"));
        let first = stream.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::Field(F::Word));
        assert_eq!(first.text, "one");
        assert_eq!(stream.last_pos(), 0);

        let marker = stream.next_token().unwrap();
        assert!(marker.kind.is_end_of_record());

        let second = stream.next_token().unwrap();
        assert_eq!(second.kind, TokenKind::Field(F::Word));
        assert_eq!(second.text, "two");
        assert_eq!(stream.last_pos(), 4);
    }

    #[test]
    fn test_spawn_terminates_with_end_of_input() {
        let kinds: Vec<_> = spawn(word_lexer("one\n")).map(|t| t.kind).collect();
        assert_eq!(kinds.last(), Some(&TokenKind::EndOfInput));
        assert_eq!(
            kinds
                .iter()
                .filter(|k| k.is_end_of_input())
                .count(),
            1
        );
    }

    #[test]
    fn test_dropping_stream_stops_producer() {
        let mut stream = spawn(word_lexer("one two three\n"));
        let _ = stream.next_token();
        // dropping joins the producer; must not deadlock
        drop(stream);
    }
}
