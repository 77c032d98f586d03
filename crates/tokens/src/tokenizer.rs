//! Tokenizer abstraction.
//!
//! A tokenizer reports each token as a byte range of the input. Ranges are
//! contiguous and cover the whole text, so any run of tokens maps back to a
//! plain slice of the original string (no decoding step, no broken UTF-8).

use std::ops::Range;

use thiserror::Error;

/// Byte ranges of each token, in order.
pub type TokenSpans = Vec<Range<usize>>;

#[derive(Error, Debug)]
pub enum TokenizeError {
    #[error("Tokenizer failed: {0}")]
    Failed(String),
}

/// Splits text into tokens.
pub trait Tokenize: Send + Sync {
    /// Short name for logs (e.g. "char-estimate", "hf:thenlper/gte-base").
    fn name(&self) -> &str;

    /// Token spans of `text`. Spans are contiguous: the first starts at 0, each
    /// starts where the previous ended, and the last ends at `text.len()`.
    fn token_spans(&self, text: &str) -> Result<TokenSpans, TokenizeError>;
}

/// Estimates tokens as fixed-size character groups.
///
/// 1 token ≈ 4 characters for English text, the same ratio used for context
/// budgeting elsewhere. Deterministic, offline and monotonic under
/// concatenation.
#[derive(Debug, Clone)]
pub struct CharEstimateTokenizer {
    chars_per_token: usize,
}

impl CharEstimateTokenizer {
    pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

    /// Creates an estimator grouping `chars_per_token` characters per token (minimum 1).
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    pub(crate) fn spans(&self, text: &str) -> TokenSpans {
        let mut spans = Vec::with_capacity(text.len() / self.chars_per_token + 1);
        let mut start = 0;
        let mut in_group = 0;
        for (idx, _) in text.char_indices() {
            if in_group == self.chars_per_token {
                spans.push(start..idx);
                start = idx;
                in_group = 0;
            }
            in_group += 1;
        }
        if in_group > 0 {
            spans.push(start..text.len());
        }
        spans
    }
}

impl Default for CharEstimateTokenizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

impl Tokenize for CharEstimateTokenizer {
    fn name(&self) -> &str {
        "char-estimate"
    }

    fn token_spans(&self, text: &str) -> Result<TokenSpans, TokenizeError> {
        Ok(self.spans(text))
    }
}

/// Largest char boundary of `text` at or before byte `idx`.
pub(crate) fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
