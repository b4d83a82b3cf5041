//! Embedding function backed by an OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docvec_types::EmbeddingSettings;

use crate::error::EmbeddingError;
use crate::model::{normalize, EmbeddingFunction};

/// Configuration for [`OpenAiEmbedder`].
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    /// API base URL without trailing `/embeddings`
    pub base_url: String,

    /// Model to use (e.g., "text-embedding-3-small", "nomic-embed-text")
    pub model: String,

    /// API key; local servers usually don't need one
    pub api_key: Option<SecretString>,

    /// Normalize returned vectors to unit length
    pub normalize: bool,

    /// Request timeout
    pub timeout: Duration,
}

impl OpenAiEmbedderConfig {
    /// Create config for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            api_key: Some(SecretString::from(api_key.into())),
            normalize: false,
            timeout: Duration::from_secs(30),
        }
    }

    /// Create config for a local Ollama server.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: model.into(),
            api_key: None,
            normalize: true,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build config from loaded settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            api_key: settings
                .api_key
                .as_ref()
                .filter(|k| !k.is_empty())
                .map(|k| SecretString::from(k.clone())),
            normalize: settings.normalize,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI-compatible embedding function.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    /// Create a new embedder.
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self, EmbeddingError> {
        if config.model.is_empty() {
            return Err(EmbeddingError::Config("model is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the embedder configuration
    pub fn config(&self) -> &OpenAiEmbedderConfig {
        &self.config
    }

    fn extract(&self, response: EmbeddingResponse) -> Result<Vec<f32>, EmbeddingError> {
        let values = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyResponse)?;

        Ok(if self.config.normalize {
            normalize(values)
        } else {
            values
        })
    }
}

#[async_trait]
impl EmbeddingFunction for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("text is empty".to_string()));
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: text,
        };

        let mut builder = self
            .client
            .post(self.config.endpoint())
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        debug!(model = %self.config.model, chars = text.len(), "Requesting embedding");
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api { status, body });
        }

        let body: EmbeddingResponse = response.json().await?;
        self.extract(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut config = OpenAiEmbedderConfig::ollama("nomic-embed-text");
        config.base_url = "http://localhost:11434/v1/".to_string();
        assert_eq!(config.endpoint(), "http://localhost:11434/v1/embeddings");
    }

    #[test]
    fn test_from_settings_skips_empty_key() {
        let settings = EmbeddingSettings {
            api_key: Some(String::new()),
            ..Default::default()
        };
        let config = OpenAiEmbedderConfig::from_settings(&settings);
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_empty_model() {
        let config = OpenAiEmbedderConfig::ollama("");
        assert!(matches!(
            OpenAiEmbedder::new(config),
            Err(EmbeddingError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_empty_text() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig::ollama("m")).unwrap();
        assert!(matches!(
            embedder.embed("").await,
            Err(EmbeddingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_extract_normalizes() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig::ollama("m")).unwrap();
        let response: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[3.0,4.0]}]}"#).unwrap();
        let values = embedder.extract(response).unwrap();
        assert!((values[0] - 0.6).abs() < 0.001);
        assert!((values[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_extract_empty_response() {
        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig::ollama("m")).unwrap();
        let response: EmbeddingResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(matches!(
            embedder.extract(response),
            Err(EmbeddingError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_invalid_base_url_fails_before_sending() {
        let mut config = OpenAiEmbedderConfig::ollama("m");
        config.base_url = "not a url".to_string();
        let embedder = OpenAiEmbedder::new(config).unwrap();
        match embedder.embed("hello").await {
            Err(EmbeddingError::Http(e)) => assert!(e.is_builder()),
            other => panic!("expected builder error, got {other:?}"),
        }
    }
}
