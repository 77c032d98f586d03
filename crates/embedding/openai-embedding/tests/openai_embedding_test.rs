//! Integration tests for the OpenAI embedding service.
//!
//! These tests exercise the [`openai_embedding::OpenAIEmbedding`] implementation against
//! the real OpenAI embedding API. Tests that call the API are marked with `#[ignore]` and
//! require the `OPENAI_API_KEY` environment variable (and sufficient quota).
//!
//! # Running tests
//!
//! - **Default (no API):** `cargo test -p openai-embedding`: runs only tests that do not call the API.
//! - **With API:** `cargo test -p openai-embedding -- --ignored`: runs ignored tests; set
//!   `OPENAI_API_KEY` (e.g. in repo root `.env`). Quota/billing errors are treated as skip, not failure.

use std::path::Path;

use async_openai::error::OpenAIError;
use embedding::{EmbeddingService, ProviderError};
use openai_embedding::{classify_openai_error, OpenAIEmbedding, DEFAULT_MODEL};

/// Loads `.env` from the workspace root so `OPENAI_API_KEY` is available in ignored tests.
/// Path: `crates/embedding/openai-embedding` → `../../../.env` = repo root.
fn load_root_env() {
    let root_env = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../.env");
    let _ = dotenvy::from_path(root_env);
}

/// Returns true if the error is due to OpenAI quota/billing/rate-limit; such tests are skipped instead of failed.
fn is_quota_or_billing_error(e: &ProviderError) -> bool {
    if matches!(e, ProviderError::RateLimited(_)) {
        return true;
    }
    let s = e.to_string();
    s.contains("insufficient_quota") || s.contains("quota") || s.contains("billing")
}

/// **Test: Single-text embedding (real API).**
///
/// **Expected:** Returns an embedding of length 1536 for `text-embedding-3-small`.
#[tokio::test]
#[ignore] // Requires API key and quota, run with: cargo test -p openai-embedding -- --ignored
async fn test_openai_embedding() {
    load_root_env();
    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY environment variable must be set for this test (or set in root .env)");

    let service = OpenAIEmbedding::new(api_key, DEFAULT_MODEL.to_string());

    match service.embed("High inflation with rising rates").await {
        Ok(embedding) => assert_eq!(embedding.len(), 1536),
        Err(e) if is_quota_or_billing_error(&e) => {
            eprintln!("test_openai_embedding skipped: OpenAI quota/billing limit ({})", e);
        }
        Err(e) => panic!("OpenAI embed request failed: {}", e),
    }
}

/// **Test: Over-long input is classified as a context-length error (real API).**
///
/// **Action:** Sends ~40k tokens of text to a model with an 8191-token window.
///
/// **Expected:** `ProviderError::ContextLengthExceeded`.
#[tokio::test]
#[ignore]
async fn test_openai_embedding_context_length_exceeded() {
    load_root_env();
    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY environment variable must be set for this test (or set in root .env)");

    let service = OpenAIEmbedding::new(api_key, DEFAULT_MODEL.to_string());
    let text = "rates inflation volatility ".repeat(12_000);

    match service.embed(&text).await {
        Ok(_) => panic!("expected a context length error"),
        Err(e) if is_quota_or_billing_error(&e) => {
            eprintln!("test skipped: OpenAI quota/billing limit ({})", e);
        }
        Err(e) => assert!(e.is_context_length(), "unexpected error: {e}"),
    }
}

/// **Test: Construction from empty API key (no API call).**
///
/// **Expected:** Does not panic; `model()` returns the default model.
#[test]
fn test_openai_embedding_from_env() {
    let service = OpenAIEmbedding::with_api_key(String::new());
    assert_eq!(service.model(), "text-embedding-3-small");

    let service = service.with_model("text-embedding-3-large".to_string());
    assert_eq!(service.model(), "text-embedding-3-large");
}

/// **Test: Client-side request errors map to a non-retryable API error.**
#[test]
fn test_classify_invalid_argument() {
    let err = classify_openai_error(OpenAIError::InvalidArgument("empty input".to_string()));
    assert!(matches!(err, ProviderError::Api { status: None, .. }));
    assert!(!err.is_context_length());
}
