//! Configuration loading for docvec.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/docvec/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DocvecError;

/// Settings for the OpenAI-compatible embedding endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key (usually supplied through DOCVEC_EMBEDDING__API_KEY)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Normalize returned vectors to unit length
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_true() -> bool {
    true
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            api_key: None,
            normalize: true,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base directory holding one sub-directory per persisted collection
    #[serde(default = "default_persist_directory")]
    pub persist_directory: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of documents embedded concurrently during ingestion
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of query results returned when the caller does not say
    #[serde(default = "default_n_results")]
    pub default_n_results: usize,

    /// Embedding endpoint configuration
    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

fn default_persist_directory() -> String {
    ProjectDirs::from("", "", "docvec")
        .map(|p| p.data_local_dir().join("collections"))
        .unwrap_or_else(|| PathBuf::from("./docvec-data"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_n_results() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            persist_directory: default_persist_directory(),
            log_level: default_log_level(),
            concurrency: default_concurrency(),
            default_n_results: default_n_results(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docvec/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (DOCVEC_*, nested keys split by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, DocvecError> {
        let config_dir = ProjectDirs::from("", "", "docvec")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("persist_directory", default_persist_directory())
            .map_err(|e| DocvecError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| DocvecError::Config(e.to_string()))?
            .set_default("concurrency", default_concurrency() as i64)
            .map_err(|e| DocvecError::Config(e.to_string()))?
            .set_default("default_n_results", default_n_results() as i64)
            .map_err(|e| DocvecError::Config(e.to_string()))?
            .set_default("embedding.base_url", default_embedding_base_url())
            .map_err(|e| DocvecError::Config(e.to_string()))?
            .set_default("embedding.model", default_embedding_model())
            .map_err(|e| DocvecError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // DOCVEC_LOG_LEVEL, DOCVEC_PERSIST_DIRECTORY, DOCVEC_EMBEDDING__MODEL, ...
        builder = builder.add_source(
            Environment::with_prefix("DOCVEC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| DocvecError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| DocvecError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), DocvecError> {
        if self.concurrency == 0 {
            return Err(DocvecError::InvalidInput(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.default_n_results == 0 {
            return Err(DocvecError::InvalidInput(
                "default_n_results must be at least 1".to_string(),
            ));
        }
        if self.embedding.timeout_secs == 0 {
            return Err(DocvecError::InvalidInput(
                "embedding.timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in persist_directory to the actual home directory
    pub fn expanded_persist_directory(&self) -> PathBuf {
        if let Some(rest) = self.persist_directory.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new() {
                return home.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.persist_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.default_n_results, 10);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert!(settings.embedding.normalize);
        assert!(settings.embedding.api_key.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docvec.toml");
        std::fs::write(
            &path,
            r#"
persist_directory = "/tmp/docvec-test"

[embedding]
base_url = "http://localhost:11434/v1"
model = "nomic-embed-text"
normalize = false
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path.to_string_lossy())).unwrap();
        assert_eq!(settings.persist_directory, "/tmp/docvec-test");
        assert_eq!(settings.embedding.base_url, "http://localhost:11434/v1");
        assert_eq!(settings.embedding.model, "nomic-embed-text");
        assert!(!settings.embedding.normalize);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(Settings::load(Some(&path.to_string_lossy())).is_err());
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.concurrency = 0;
        assert!(settings.validate().is_err());

        settings.concurrency = 2;
        settings.default_n_results = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_expand_home() {
        let settings = Settings {
            persist_directory: "~/docvec".to_string(),
            ..Default::default()
        };
        let expanded = settings.expanded_persist_directory();
        assert!(expanded.ends_with("docvec"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut settings = Settings::default();
        settings.embedding.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
