//! Collection error types.

use std::path::PathBuf;

use docvec_embeddings::EmbeddingError;
use thiserror::Error;

/// Errors that can occur during collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Rejected before any work started
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Content filter used an operator outside the supported set
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Embedding a document's content failed
    #[error("couldn't create embedding of document: {0}")]
    Embedding(#[source] EmbeddingError),

    /// Embedding the query text failed
    #[error("couldn't create embedding of query: {0}")]
    QueryEmbedding(#[source] EmbeddingError),

    /// Query and document vectors differ in length
    #[error("couldn't calculate similarity: expected dimension {expected}, got {actual}")]
    Similarity { expected: usize, actual: usize },

    /// Writing to or reading from the persist directory failed
    #[error("couldn't persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted data is unusable
    #[error("Corrupt collection data at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Adding a single document failed after validation
    #[error("couldn't add document '{id}': {source}")]
    Document {
        id: String,
        #[source]
        source: Box<CollectionError>,
    },

    /// The caller cancelled ingestion before every document was processed
    #[error("Operation cancelled")]
    Cancelled,
}

impl CollectionError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Attach a document id, unless the error already carries one.
    pub(crate) fn for_document(self, id: &str) -> Self {
        match self {
            Self::Document { .. } => self,
            other => Self::Document {
                id: id.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Id of the failing document, for errors returned by ingestion.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            Self::Document { id, .. } => Some(id),
            _ => None,
        }
    }
}
