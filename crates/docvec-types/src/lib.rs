//! # docvec-types
//!
//! Shared domain types for the docvec workspace.
//!
//! This crate defines the data structures used by every other crate:
//! - Documents: an id, an embedding, string metadata and optional content
//! - Settings: layered configuration for collections and the CLI
//!
//! ## Usage
//!
//! ```rust
//! use docvec_types::Document;
//!
//! let doc = Document::new("doc-1").with_content("hello world");
//! assert!(doc.embedding.is_empty());
//! ```

pub mod config;
pub mod document;
pub mod error;

pub use config::{EmbeddingSettings, Settings};
pub use document::{Document, Metadata};
pub use error::DocvecError;
