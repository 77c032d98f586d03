//! One embedding attempt, classified.
//!
//! The provider already reports typed [`ProviderError`]s, so the decision
//! "retry with truncated text or give up" is a match on the variant.

use embedding::ProviderError;

use crate::error::EmbeddingError;

/// Why an attempt may be retried.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryReason {
    /// Provider rejected `tokens` (local count) as longer than its context window.
    ContextLengthExceeded { tokens: usize, message: String },
}

impl RetryReason {
    /// The error to report when no retry is left.
    pub fn into_error(self) -> EmbeddingError {
        match self {
            RetryReason::ContextLengthExceeded { tokens, message } => {
                EmbeddingError::ContextLengthExceeded { tokens, message }
            }
        }
    }
}

/// Outcome of a single provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingAttempt {
    Success(Vec<f32>),
    Retryable(RetryReason),
    Fatal(EmbeddingError),
}

impl EmbeddingAttempt {
    /// Classifies a provider result for input of `tokens` tokens.
    pub fn from_provider(result: Result<Vec<f32>, ProviderError>, tokens: usize) -> Self {
        match result {
            Ok(embedding) => EmbeddingAttempt::Success(embedding),
            Err(ProviderError::ContextLengthExceeded(message)) => {
                EmbeddingAttempt::Retryable(RetryReason::ContextLengthExceeded { tokens, message })
            }
            Err(e) => EmbeddingAttempt::Fatal(EmbeddingError::Provider(e)),
        }
    }

    /// Collapses the attempt into a result, treating `Retryable` as final.
    pub fn into_final(self) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            EmbeddingAttempt::Success(embedding) => Ok(embedding),
            EmbeddingAttempt::Retryable(reason) => Err(reason.into_error()),
            EmbeddingAttempt::Fatal(e) => Err(e),
        }
    }
}
