//! Hugging Face `tokenizers` backed [`Tokenize`] implementation.
//!
//! Loads a `tokenizer.json` from disk. Encoding offsets are turned into contiguous spans: each token starts at its
//! own offset and ends where the next token starts, so whitespace and other
//! unmapped bytes stay attached to the preceding token.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::info;

use crate::tokenizer::{floor_char_boundary, TokenSpans, Tokenize, TokenizeError};

pub struct HuggingFaceTokenizer {
    tokenizer: Tokenizer,
    name: String,
}

impl HuggingFaceTokenizer {
    /// Loads a tokenizer from a local `tokenizer.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenizeError> {
        let path = path.as_ref();
        let name = format!("hf:{}", path.display());
        Self::load(path, name)
    }

    fn load(path: &Path, name: String) -> Result<Self, TokenizeError> {
        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(|e| TokenizeError::Failed(format!("Failed to load tokenizer: {e}")))?;
        // Counting must see every token, not the model's truncated window.
        tokenizer
            .with_truncation(None)
            .map_err(|e| TokenizeError::Failed(format!("Failed to disable truncation: {e}")))?;
        tokenizer.with_padding(None);
        info!(tokenizer = %name, vocab_size = tokenizer.get_vocab_size(false), "Tokenizer loaded");
        Ok(Self { tokenizer, name })
    }
}

impl Tokenize for HuggingFaceTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn token_spans(&self, text: &str) -> Result<TokenSpans, TokenizeError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| TokenizeError::Failed(format!("Tokenization failed: {e}")))?;

        let offsets = encoding.get_offsets();
        let mut starts = Vec::with_capacity(offsets.len());
        let mut last = 0;
        for (i, (start, _)) in offsets.iter().enumerate() {
            let start = if i == 0 {
                0
            } else {
                floor_char_boundary(text, *start).max(last)
            };
            starts.push(start);
            last = start;
        }

        let mut spans = Vec::with_capacity(starts.len());
        for (i, start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            spans.push(*start..end);
        }
        Ok(spans)
    }
}
