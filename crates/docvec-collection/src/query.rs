//! Nearest-neighbor queries over a collection.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;

use docvec_types::{Document, Metadata};

use crate::collection::Collection;
use crate::error::CollectionError;
use crate::filter::DocumentFilter;
use crate::similarity;

/// A matched document and its cosine similarity to the query
/// (higher = more similar).
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub document: Arc<Document>,
    pub similarity: f32,
}

impl QueryResult {
    /// Id of the matched document.
    pub fn id(&self) -> &str {
        &self.document.id
    }
}

enum QueryInput<'a> {
    Text(&'a str),
    Embedding(&'a [f32]),
}

impl Collection {
    /// Return up to `n_results` documents most similar to `query_text`.
    ///
    /// - `where_metadata`: every key must equal the document's metadata value. Optional.
    /// - `where_document`: content operators (`$contains`, `$not_contains`). Optional.
    ///
    /// An empty collection, or filters that match nothing, yield an empty
    /// result without calling the embedding function.
    pub async fn query(
        &self,
        query_text: &str,
        n_results: usize,
        where_metadata: Option<&Metadata>,
        where_document: Option<&Metadata>,
    ) -> Result<Vec<QueryResult>, CollectionError> {
        if query_text.is_empty() {
            return Err(CollectionError::InvalidInput(
                "queryText is empty".to_string(),
            ));
        }
        self.search(
            QueryInput::Text(query_text),
            n_results,
            where_metadata,
            where_document,
        )
        .await
    }

    /// Like [`Collection::query`], with a precomputed query embedding.
    pub async fn query_embedding(
        &self,
        query_embedding: &[f32],
        n_results: usize,
        where_metadata: Option<&Metadata>,
        where_document: Option<&Metadata>,
    ) -> Result<Vec<QueryResult>, CollectionError> {
        if query_embedding.is_empty() {
            return Err(CollectionError::InvalidInput(
                "query embedding is empty".to_string(),
            ));
        }
        self.search(
            QueryInput::Embedding(query_embedding),
            n_results,
            where_metadata,
            where_document,
        )
        .await
    }

    async fn search(
        &self,
        input: QueryInput<'_>,
        n_results: usize,
        where_metadata: Option<&Metadata>,
        where_document: Option<&Metadata>,
    ) -> Result<Vec<QueryResult>, CollectionError> {
        if n_results == 0 {
            return Err(CollectionError::InvalidInput(
                "nResults must be > 0".to_string(),
            ));
        }
        let filter = DocumentFilter::new(where_metadata, where_document)?;

        // Held until the results are ranked: the whole query sees one snapshot.
        let documents = self.store().read().await;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = filter.apply(documents.values());
        if candidates.is_empty() {
            debug!(collection = %self.name(), "Filters matched no documents");
            return Ok(Vec::new());
        }

        let query: Cow<'_, [f32]> = match input {
            QueryInput::Text(text) => Cow::Owned(
                self.embedder()
                    .embed(text)
                    .await
                    .map_err(CollectionError::QueryEmbedding)?,
            ),
            QueryInput::Embedding(embedding) => Cow::Borrowed(embedding),
        };

        let mut results = similarity::score_documents(&query, candidates)?;
        similarity::rank(&mut results);
        drop(documents);

        // Fewer candidates than requested is fine: truncate never over-indexes.
        results.truncate(n_results);

        debug!(
            collection = %self.name(),
            n_results,
            returned = results.len(),
            "Query complete"
        );
        Ok(results)
    }
}
