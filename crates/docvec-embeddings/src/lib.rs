//! # docvec-embeddings
//!
//! Embedding functions used by docvec collections to turn text into vectors.
//!
//! ## Features
//! - Pluggable async [`EmbeddingFunction`] trait, one instance per collection
//! - OpenAI-compatible HTTP embedder (OpenAI, Ollama `/v1`, LocalAI, ...)
//! - Vector helpers: normalization and cosine similarity

pub mod error;
pub mod model;
pub mod openai;

pub use error::EmbeddingError;
pub use model::{cosine_similarity, normalize, EmbeddingFunction};
pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};
