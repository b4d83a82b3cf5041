//! Metadata and content filters applied before similarity ranking.

use std::sync::Arc;

use docvec_types::{Document, Metadata};

use crate::error::CollectionError;

/// Operator keys accepted in a content filter.
pub const SUPPORTED_OPERATORS: [&str; 2] = ["$contains", "$not_contains"];

/// A single condition on document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOperator {
    /// Content must contain the value
    Contains(String),
    /// Content must not contain the value
    NotContains(String),
}

impl ContentOperator {
    /// Parse an operator key and its operand.
    pub fn parse(key: &str, value: &str) -> Result<Self, CollectionError> {
        match key {
            "$contains" => Ok(Self::Contains(value.to_string())),
            "$not_contains" => Ok(Self::NotContains(value.to_string())),
            other => Err(CollectionError::UnsupportedOperator(other.to_string())),
        }
    }

    fn matches(&self, content: &str) -> bool {
        match self {
            Self::Contains(needle) => content.contains(needle.as_str()),
            Self::NotContains(needle) => !content.contains(needle.as_str()),
        }
    }
}

/// Validated filter over metadata (equality on every key) and content
/// (every operator must hold). An empty filter matches all documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    metadata: Metadata,
    content: Vec<ContentOperator>,
}

impl DocumentFilter {
    /// Build a filter, rejecting content operators outside [`SUPPORTED_OPERATORS`].
    pub fn new(
        where_metadata: Option<&Metadata>,
        where_document: Option<&Metadata>,
    ) -> Result<Self, CollectionError> {
        let content = where_document
            .map(|ops| {
                ops.iter()
                    .map(|(key, value)| ContentOperator::parse(key, value))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            metadata: where_metadata.cloned().unwrap_or_default(),
            content,
        })
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.content.is_empty()
    }

    /// Check a single document against every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        let metadata_ok = self
            .metadata
            .iter()
            .all(|(key, value)| doc.metadata.get(key) == Some(value));

        metadata_ok && self.content.iter().all(|op| op.matches(&doc.content))
    }

    /// Select the documents matching the filter.
    pub fn apply<'a>(
        &self,
        documents: impl IntoIterator<Item = &'a Arc<Document>>,
    ) -> Vec<Arc<Document>> {
        documents
            .into_iter()
            .filter(|doc| self.matches(doc))
            .cloned()
            .collect()
    }
}
