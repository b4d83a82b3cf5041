//! Embedding error types.

use thiserror::Error;

/// Errors that can occur while computing embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Endpoint answered without any vector
    #[error("Embedding response contained no data")]
    EmptyResponse,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid embedder configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failure reported by a custom embedding function
    #[error("Embedding failed: {0}")]
    Other(String),
}
