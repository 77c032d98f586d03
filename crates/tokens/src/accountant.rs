//! Token counting and budget truncation.
//!
//! [`TokenAccountant`] wraps a [`Tokenize`] implementation and never fails: if
//! the tokenizer errors, counting falls back to [`CharEstimateTokenizer`] and
//! the failure is logged.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::tokenizer::{floor_char_boundary, CharEstimateTokenizer, TokenSpans, Tokenize};

/// Appended to text that was cut to fit a token budget.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Appended to the stored preview of text that was embedded chunk by chunk.
pub const CHUNK_AVERAGED_MARKER: &str = "... [chunk-averaged]";

/// Counts and truncates text by token budget.
#[derive(Clone)]
pub struct TokenAccountant {
    tokenizer: Arc<dyn Tokenize>,
    fallback: CharEstimateTokenizer,
}

impl TokenAccountant {
    /// Creates an accountant over the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenize>) -> Self {
        Self {
            tokenizer,
            fallback: CharEstimateTokenizer::default(),
        }
    }

    /// Name of the underlying tokenizer.
    pub fn tokenizer_name(&self) -> &str {
        self.tokenizer.name()
    }

    /// Token spans of `text`, falling back to the character estimate on tokenizer failure.
    pub fn token_spans(&self, text: &str) -> TokenSpans {
        match self.tokenizer.token_spans(text) {
            Ok(spans) => spans,
            Err(e) => {
                warn!(
                    tokenizer = %self.tokenizer.name(),
                    error = %e,
                    text_len = text.len(),
                    "Tokenizer failed, falling back to character estimate"
                );
                self.fallback.spans(text)
            }
        }
    }

    /// Number of tokens in `text`. Empty text has zero tokens.
    pub fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.token_spans(text).len()
    }

    /// Token cost of [`TRUNCATION_MARKER`].
    pub fn marker_tokens(&self) -> usize {
        self.count_tokens(TRUNCATION_MARKER)
    }

    /// Returns `text` unchanged if it fits in `max_tokens`, otherwise its first
    /// `max_tokens` tokens followed by [`TRUNCATION_MARKER`].
    pub fn truncate_text_to_tokens(&self, text: &str, max_tokens: usize) -> String {
        self.truncate_with_marker(text, max_tokens, TRUNCATION_MARKER)
    }

    /// Like [`truncate_text_to_tokens`](Self::truncate_text_to_tokens) with a custom marker.
    pub fn truncate_with_marker(&self, text: &str, max_tokens: usize, marker: &str) -> String {
        let spans = self.token_spans(text);
        if spans.len() <= max_tokens {
            return text.to_string();
        }

        let end = match max_tokens {
            0 => 0,
            n => spans[n - 1].end,
        };
        let kept = &text[..floor_char_boundary(text, end)];

        debug!(
            original_tokens = spans.len(),
            max_tokens,
            kept_bytes = kept.len(),
            marker,
            "Truncated text to token budget"
        );
        format!("{kept}{marker}")
    }

    /// Truncates so the result, marker included, stays within `budget` tokens.
    pub fn fit_to_budget(&self, text: &str, budget: usize) -> String {
        self.fit_to_budget_with_marker(text, budget, TRUNCATION_MARKER)
    }

    /// Like [`fit_to_budget`](Self::fit_to_budget) with a custom marker.
    pub fn fit_to_budget_with_marker(&self, text: &str, budget: usize, marker: &str) -> String {
        if self.count_tokens(text) <= budget {
            return text.to_string();
        }
        let keep = budget.saturating_sub(self.count_tokens(marker));
        self.truncate_with_marker(text, keep, marker)
    }
}

impl Default for TokenAccountant {
    fn default() -> Self {
        Self::new(Arc::new(CharEstimateTokenizer::default()))
    }
}

impl fmt::Debug for TokenAccountant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAccountant")
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}
