//! Similarity scoring and ranking of candidate documents.

use std::cmp::Ordering;
use std::sync::Arc;

use docvec_embeddings::cosine_similarity;
use docvec_types::Document;

use crate::error::CollectionError;
use crate::query::QueryResult;

/// Score every candidate against the query vector by cosine similarity.
pub fn score_documents(
    query: &[f32],
    candidates: Vec<Arc<Document>>,
) -> Result<Vec<QueryResult>, CollectionError> {
    candidates
        .into_iter()
        .map(|document| {
            if document.embedding.len() != query.len() {
                return Err(CollectionError::Similarity {
                    expected: query.len(),
                    actual: document.embedding.len(),
                });
            }
            let similarity = cosine_similarity(query, &document.embedding);
            Ok(QueryResult {
                document,
                similarity,
            })
        })
        .collect()
}

/// Sort by similarity descending; equal scores are ordered by id ascending.
pub fn rank(results: &mut [QueryResult]) {
    results.sort_by(compare);
}

fn compare(a: &QueryResult, b: &QueryResult) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.document.id.cmp(&b.document.id))
}
