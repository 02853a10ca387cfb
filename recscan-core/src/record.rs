//! Record layouts
//!
//! A [`Record`] declares the fixed layout of one input record: a buffer
//! size hint, an ordered sequence of [`FieldStep`]s, and a recovery
//! routine invoked when a field fails to scan. The layout is plain data;
//! it is validated when a [`crate::Lexer`] is constructed from it, so no
//! partial lexer is ever observable.

use std::sync::Arc;

use crate::lexer::Lexer;
use thiserror::Error;

/// A field-scanning routine.
///
/// Consumes zero or more characters from the lexer and returns success.
/// On success, if `emit` is true the routine must emit exactly one token
/// of the given kind over the consumed span, otherwise it must skip the
/// span. On failure it must emit exactly one error token describing
/// expected vs. actual input, leaving the cursor with at most the
/// offending character tentatively consumed and backtracked.
pub type ScanFn<K> = Arc<dyn Fn(&mut Lexer<K>, K, bool) -> bool + Send + Sync>;

/// A recovery routine.
///
/// Run after a field scan fails. Must leave the cursor positioned so that
/// retrying field 0 does not immediately re-fail on the same bytes,
/// typically by skipping to and past the next record separator; see
/// [`crate::scan::skip_past`].
pub type RecoverFn<K> = Arc<dyn Fn(&mut Lexer<K>) + Send + Sync>;

/// One declared position in a record's fixed layout.
#[derive(Clone)]
pub struct FieldStep<K> {
    /// Token kind to apply on success.
    pub kind: K,
    /// The scanning routine for this field.
    pub scan: ScanFn<K>,
    /// Emit the token, or consume it silently.
    pub emit: bool,
}

impl<K> FieldStep<K> {
    pub fn new(kind: K, scan: ScanFn<K>, emit: bool) -> Self {
        Self { kind, scan, emit }
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for FieldStep<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStep")
            .field("kind", &self.kind)
            .field("emit", &self.emit)
            .finish_non_exhaustive()
    }
}

/// Lexer construction error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The record's field step sequence was empty.
    #[error("record must declare at least one field step")]
    EmptySteps,
    /// The record's buffer size hint was not positive.
    #[error("buffer size hint must be > 0: {0}")]
    InvalidBuflen(usize),
}

/// The fixed layout of one input record. Immutable once built.
#[derive(Clone)]
pub struct Record<K> {
    /// Expected size of an average record, in bytes. Used as a hint to
    /// manage the read-ahead buffer: the buffer starts at this size and
    /// grows as needed when a token crosses read boundaries.
    pub buflen: usize,
    /// The field steps that make up a record, in order.
    pub steps: Vec<FieldStep<K>>,
    /// Recovery routine applied when a field step fails.
    pub recover: RecoverFn<K>,
}

impl<K> Record<K> {
    pub fn new(buflen: usize, steps: Vec<FieldStep<K>>, recover: RecoverFn<K>) -> Self {
        Self {
            buflen,
            steps,
            recover,
        }
    }

    /// Check the layout invariants enforced at lexer construction.
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.steps.is_empty() {
            return Err(BuildError::EmptySteps);
        }
        if self.buflen == 0 {
            return Err(BuildError::InvalidBuflen(self.buflen));
        }
        Ok(())
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for Record<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("buflen", &self.buflen)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}
