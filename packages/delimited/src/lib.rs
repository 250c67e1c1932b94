#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Quote-aware streaming parser for delimiter-separated text exports.
//!
//! [`DelimitedReader`] turns a [`std::io::BufRead`] into a lazy sequence of
//! [`Record`]s. Quoted fields may contain the delimiter, doubled quotes
//! (one literal quote) and line breaks. Physical lines are accumulated
//! until the quote state of the logical record is balanced, and only then
//! tokenized, so that cleaning (byte-order mark and whitespace stripping)
//! never disturbs quote counting.
//!
//! What happens when input ends inside a quoted field is decided by the
//! caller through [`UnterminatedQuote`]: whole-file validation tools treat
//! it as fatal, best-effort ingestion drops the dangling record.

mod reader;
mod tokenize;

pub use reader::{DelimitedReader, Record};
pub use tokenize::{QuoteScanner, clean_field, is_complete_record, split_record};

/// Errors produced while reading delimited text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Input ended while a quoted field was still open.
    #[error("unterminated quoted field in record starting at line {line}")]
    UnterminatedQuote {
        /// 1-based line number where the dangling record starts.
        line: usize,
    },

    /// Reading the underlying input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do when input ends inside a quoted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnterminatedQuote {
    /// Yield [`ParseError::UnterminatedQuote`] as the final item.
    Fail,
    /// Log a warning and drop the incomplete record.
    #[default]
    Skip,
}

/// Tokenizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Field delimiter.
    pub delimiter: char,
    /// Quote character.
    pub quote: char,
    /// End-of-input policy for open quoted fields.
    pub unterminated: UnterminatedQuote,
}

impl ReaderOptions {
    /// Creates options for the given delimiter, with `"` quotes and the
    /// lenient [`UnterminatedQuote::Skip`] policy.
    #[must_use]
    pub const fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            quote: '"',
            unterminated: UnterminatedQuote::Skip,
        }
    }

    /// Semicolon-delimited text, as used by the Unfallatlas exports.
    #[must_use]
    pub const fn semicolon() -> Self {
        Self::new(';')
    }

    /// Sets the quote character.
    #[must_use]
    pub const fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Sets the end-of-input policy.
    #[must_use]
    pub const fn with_unterminated(mut self, policy: UnterminatedQuote) -> Self {
        self.unterminated = policy;
        self
    }

    /// Shorthand for [`UnterminatedQuote::Fail`].
    #[must_use]
    pub const fn strict(self) -> Self {
        self.with_unterminated(UnterminatedQuote::Fail)
    }
}
