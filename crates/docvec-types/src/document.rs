//! Document type stored in a collection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Free-form string metadata attached to documents and collections.
pub type Metadata = HashMap<String, String>;

/// A single embeddable unit.
///
/// A document either carries its embedding or has content from which the
/// collection derives one. Once stored, `embedding` is never empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique id within a collection
    pub id: String,

    /// Embedding vector
    #[serde(default)]
    pub embedding: Vec<f32>,

    /// Metadata used for equality filtering
    #[serde(default)]
    pub metadata: Metadata,

    /// Original text content
    #[serde(default)]
    pub content: String,
}

impl Document {
    /// Create an empty document with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the embedding (builder pattern).
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Set the content (builder pattern).
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the metadata (builder pattern).
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add one metadata entry (builder pattern).
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether an embedding still has to be computed from the content.
    pub fn needs_embedding(&self) -> bool {
        self.embedding.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let doc = Document::new("a")
            .with_content("text")
            .with_embedding(vec![1.0, 0.0])
            .with_meta("lang", "en");

        assert_eq!(doc.id, "a");
        assert_eq!(doc.content, "text");
        assert_eq!(doc.metadata.get("lang").map(String::as_str), Some("en"));
        assert!(!doc.needs_embedding());
    }

    #[test]
    fn test_deserialize_partial() {
        let doc: Document = serde_json::from_str(r#"{"id":"x","content":"hi"}"#).unwrap();
        assert_eq!(doc.id, "x");
        assert!(doc.needs_embedding());
        assert!(doc.metadata.is_empty());
    }
}
