use thiserror::Error;

/// Failure reported by an embedding provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The input was rejected as longer than the model's context window.
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error (status {status:?}): {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },
}

/// Error codes providers use for an over-long input.
const CONTEXT_LENGTH_CODES: &[&str] = &["context_length_exceeded", "string_above_max_length"];

/// Message fragments for providers that do not send a code (local servers mostly).
const CONTEXT_LENGTH_PHRASES: &[&str] = &[
    "maximum context length",
    "context length",
    "context window",
    "too many tokens",
    "input is too long",
    "input length exceeds",
];

impl ProviderError {
    /// True for the one failure the embedding client recovers from locally.
    pub fn is_context_length(&self) -> bool {
        matches!(self, ProviderError::ContextLengthExceeded(_))
    }

    /// Classifies an error reply from an OpenAI-style API.
    ///
    /// `code` and `kind` are the `error.code` / `error.type` fields when present.
    pub fn classify(
        status: Option<u16>,
        code: Option<&str>,
        kind: Option<&str>,
        message: &str,
    ) -> Self {
        let tagged = |wanted: &str| code == Some(wanted) || kind == Some(wanted);
        let lowered = message.to_lowercase();

        if CONTEXT_LENGTH_CODES.iter().any(|c| tagged(c))
            || CONTEXT_LENGTH_PHRASES.iter().any(|p| lowered.contains(p))
        {
            return ProviderError::ContextLengthExceeded(message.to_string());
        }
        if matches!(status, Some(401) | Some(403))
            || tagged("invalid_api_key")
            || tagged("authentication_error")
        {
            return ProviderError::Authentication(message.to_string());
        }
        if status == Some(429)
            || code.is_some_and(|c| c.contains("rate_limit"))
            || kind.is_some_and(|k| k.contains("rate_limit"))
        {
            return ProviderError::RateLimited(message.to_string());
        }
        ProviderError::Api {
            status,
            message: message.to_string(),
        }
    }
}
