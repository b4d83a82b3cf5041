//! # docvec-collection
//!
//! In-process document collection with embedding-based similarity search.
//!
//! A [`Collection`] holds documents (id, embedding, metadata, content) behind
//! a single reader/writer lock. Documents are ingested concurrently with a
//! bounded number of in-flight embedding calls; the first failure cancels
//! work that has not started yet. Queries filter by metadata and content,
//! embed the query text and return the top-K documents by cosine similarity.
//!
//! ## Features
//! - Bounded-concurrency ingestion with first-error cancellation
//! - Metadata equality and `$contains` / `$not_contains` content filters
//! - Deterministic ranking (similarity descending, then id ascending)
//! - Optional write-through persistence, one JSON file per document

pub mod collection;
pub mod error;
pub mod filter;
mod ingest;
pub mod persist;
pub mod query;
pub mod similarity;
pub mod store;

pub use collection::Collection;
pub use error::CollectionError;
pub use filter::{ContentOperator, DocumentFilter, SUPPORTED_OPERATORS};
pub use persist::{hash_name, METADATA_FILE_NAME};
pub use query::QueryResult;
pub use store::DocumentStore;

pub use docvec_embeddings::{EmbeddingError, EmbeddingFunction};
pub use docvec_types::{Document, Metadata};
pub use tokio_util::sync::CancellationToken;
