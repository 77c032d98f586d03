//! Embedding configuration: trait, backend selection and env-based implementation.

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Cloud endpoint used when no backend URL is configured.
pub const DEFAULT_BACKEND_URL: &str = "https://api.openai.com/v1";

/// Which kind of embedding backend a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Model served on this machine (e.g. Ollama on localhost:11434).
    Local,
    /// OpenAI or another hosted OpenAI-compatible API.
    Cloud,
}

impl EmbeddingBackend {
    /// Selects the backend from the configured URL: loopback hosts are local,
    /// everything else (including unparseable URLs) is cloud.
    pub fn from_backend_url(backend_url: &str) -> Self {
        let host = Url::parse(backend_url.trim())
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_matches(['[', ']']).to_ascii_lowercase()));
        match host.as_deref() {
            Some("localhost") | Some("0.0.0.0") | Some("::1") => EmbeddingBackend::Local,
            Some(h) if h.starts_with("127.") => EmbeddingBackend::Local,
            _ => EmbeddingBackend::Cloud,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingBackend::Local => "nomic-embed-text",
            EmbeddingBackend::Cloud => "text-embedding-3-small",
        }
    }
}

/// Embedding service configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    /// Base URL of the embedding API (e.g. "https://api.openai.com/v1", "http://localhost:11434/v1").
    fn backend_url(&self) -> &str;
    /// Explicit model name; `None` selects the backend default.
    fn model(&self) -> Option<&str>;
    /// API key for the OpenAI-compatible API (OPENAI_API_KEY). Local servers usually ignore it.
    fn api_key(&self) -> &str;

    fn backend(&self) -> EmbeddingBackend {
        EmbeddingBackend::from_backend_url(self.backend_url())
    }

    fn resolved_model(&self) -> String {
        self.model()
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.backend().default_model().to_string())
    }
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvEmbeddingConfig {
    pub backend_url: String,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl Default for EnvEmbeddingConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            model: None,
            api_key: String::new(),
        }
    }
}

impl EmbeddingConfig for EnvEmbeddingConfig {
    fn backend_url(&self) -> &str {
        &self.backend_url
    }
    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
    fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl EnvEmbeddingConfig {
    /// Load from environment variables: EMBEDDING_BACKEND_URL (or OPENAI_BASE_URL),
    /// EMBEDDING_MODEL, OPENAI_API_KEY.
    pub fn from_env() -> Self {
        let backend_url = env::var("EMBEDDING_BACKEND_URL")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let model = env::var("EMBEDDING_MODEL").ok().filter(|s| !s.trim().is_empty());
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        Self {
            backend_url,
            model,
            api_key,
        }
    }

    /// Validate config (the cloud backend requires an API key).
    pub fn validate(&self) -> Result<(), String> {
        if self.backend() == EmbeddingBackend::Cloud && self.api_key.trim().is_empty() {
            return Err(format!(
                "OPENAI_API_KEY is required for the cloud embedding backend ({})",
                self.backend_url
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_urls_select_local_backend() {
        for url in [
            "http://localhost:11434/v1",
            "http://127.0.0.1:8080",
            "http://[::1]:11434/v1",
            "http://0.0.0.0:11434",
            "  http://LOCALHOST:11434/v1  ",
        ] {
            assert_eq!(EmbeddingBackend::from_backend_url(url), EmbeddingBackend::Local, "{url}");
        }
    }

    #[test]
    fn test_other_urls_select_cloud_backend() {
        for url in [
            "https://api.openai.com/v1",
            "https://open.bigmodel.cn/api/paas/v4",
            "http://embeddings.internal:8080",
            "not a url",
            "",
        ] {
            assert_eq!(EmbeddingBackend::from_backend_url(url), EmbeddingBackend::Cloud, "{url}");
        }
    }

    #[test]
    fn test_resolved_model_defaults_per_backend() {
        let local = EnvEmbeddingConfig {
            backend_url: "http://localhost:11434/v1".to_string(),
            ..EnvEmbeddingConfig::default()
        };
        assert_eq!(local.resolved_model(), "nomic-embed-text");

        let cloud = EnvEmbeddingConfig::default();
        assert_eq!(cloud.resolved_model(), "text-embedding-3-small");

        let explicit = EnvEmbeddingConfig {
            model: Some("text-embedding-3-large".to_string()),
            ..EnvEmbeddingConfig::default()
        };
        assert_eq!(explicit.resolved_model(), "text-embedding-3-large");
    }

    #[test]
    fn test_validate_requires_key_for_cloud_only() {
        assert!(EnvEmbeddingConfig::default().validate().is_err());

        let local = EnvEmbeddingConfig {
            backend_url: "http://localhost:11434/v1".to_string(),
            ..EnvEmbeddingConfig::default()
        };
        assert!(local.validate().is_ok());

        let cloud = EnvEmbeddingConfig {
            api_key: "sk-test".to_string(),
            ..EnvEmbeddingConfig::default()
        };
        assert!(cloud.validate().is_ok());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = EnvEmbeddingConfig {
            api_key: "sk-secret".to_string(),
            ..EnvEmbeddingConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));

        let parsed: EnvEmbeddingConfig =
            serde_json::from_str(r#"{"backend_url": "http://localhost:11434/v1"}"#).unwrap();
        assert_eq!(parsed.backend(), EmbeddingBackend::Local);
        assert!(parsed.model.is_none());
    }
}
