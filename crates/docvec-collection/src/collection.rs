//! The collection aggregate: identity, document store, embedding function
//! and optional persistence directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use docvec_embeddings::{EmbeddingError, EmbeddingFunction};
use docvec_types::{Document, Metadata};

use crate::error::CollectionError;
use crate::persist::{self, PersistedCollection};
use crate::store::{DocumentStore, IdLocks};

/// A named set of documents sharing one embedding function.
///
/// Cloning is cheap and yields a handle to the same collection; ingestion
/// workers each hold one.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    name: String,
    metadata: Metadata,
    store: DocumentStore,
    write_locks: IdLocks,
    embed: Arc<dyn EmbeddingFunction>,
    persist_directory: Option<PathBuf>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("metadata", &self.inner.metadata)
            .field("persist_directory", &self.inner.persist_directory)
            .finish()
    }
}

impl Collection {
    /// Create a new, empty collection.
    ///
    /// With `persist_dir` set, the collection directory
    /// `<persist_dir>/<hash(name)>` is created and the collection metadata is
    /// written before this returns; every later write is mirrored there.
    pub fn new(
        name: impl Into<String>,
        metadata: &Metadata,
        embed: Arc<dyn EmbeddingFunction>,
        persist_dir: Option<&Path>,
    ) -> Result<Self, CollectionError> {
        let name = name.into();
        let metadata = metadata.clone();

        let persist_directory = match persist_dir {
            Some(base) => {
                let dir = persist::collection_dir(base, &name);
                persist::init_collection_dir(
                    &dir,
                    &PersistedCollection {
                        name: name.clone(),
                        metadata: metadata.clone(),
                    },
                )?;
                Some(dir)
            }
            None => None,
        };

        info!(collection = %name, persisted = persist_directory.is_some(), "Created collection");
        Ok(Self::from_parts(
            name,
            metadata,
            DocumentStore::new(),
            embed,
            persist_directory,
        ))
    }

    /// Reopen a collection previously persisted under `persist_dir`.
    pub fn load(
        name: &str,
        embed: Arc<dyn EmbeddingFunction>,
        persist_dir: &Path,
    ) -> Result<Self, CollectionError> {
        let dir = persist::collection_dir(persist_dir, name);
        let (persisted, documents) = persist::load_collection_dir(&dir)?;
        if persisted.name != name {
            return Err(CollectionError::Corrupt {
                path: dir,
                reason: format!("directory belongs to collection '{}'", persisted.name),
            });
        }

        info!(collection = %name, documents = documents.len(), "Loaded collection");
        Ok(Self::from_parts(
            persisted.name,
            persisted.metadata,
            DocumentStore::from_documents(documents),
            embed,
            Some(dir),
        ))
    }

    /// Load the collection if it was persisted before, otherwise create it.
    pub fn open(
        name: &str,
        metadata: &Metadata,
        embed: Arc<dyn EmbeddingFunction>,
        persist_dir: &Path,
    ) -> Result<Self, CollectionError> {
        let dir = persist::collection_dir(persist_dir, name);
        if dir.join(persist::METADATA_FILE_NAME).is_file() {
            Self::load(name, embed, persist_dir)
        } else {
            Self::new(name, metadata, embed, Some(persist_dir))
        }
    }

    fn from_parts(
        name: String,
        metadata: Metadata,
        store: DocumentStore,
        embed: Arc<dyn EmbeddingFunction>,
        persist_directory: Option<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                name,
                metadata,
                store,
                write_locks: IdLocks::default(),
                embed,
                persist_directory,
            }),
        }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Collection metadata as given at creation.
    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// Directory this collection is mirrored to, if persistence is enabled.
    pub fn persist_directory(&self) -> Option<&Path> {
        self.inner.persist_directory.as_deref()
    }

    /// Number of documents in the collection.
    pub async fn count(&self) -> usize {
        self.inner.store.count().await
    }

    /// Look up a document by id.
    pub async fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.inner.store.get(id).await
    }

    pub(crate) fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    pub(crate) fn embedder(&self) -> &dyn EmbeddingFunction {
        self.inner.embed.as_ref()
    }

    /// Add a single document.
    ///
    /// The embedding is computed from `content` when missing. A document whose
    /// embedding fails is not stored. A persistence failure is returned even
    /// though the in-memory store already holds the new document.
    ///
    /// Failures after validation come back as [`CollectionError::Document`]
    /// carrying the id.
    pub async fn add_document(&self, doc: Document) -> Result<(), CollectionError> {
        if doc.id.is_empty() {
            return Err(CollectionError::InvalidInput(
                "document ID is empty".to_string(),
            ));
        }
        if doc.embedding.is_empty() && doc.content.is_empty() {
            return Err(CollectionError::InvalidInput(
                "either document embedding or content must be filled".to_string(),
            ));
        }

        let id = doc.id.clone();
        self.store_document(doc)
            .await
            .map_err(|err| err.for_document(&id))
    }

    async fn store_document(&self, mut doc: Document) -> Result<(), CollectionError> {
        if doc.needs_embedding() {
            let embedding = self
                .embedder()
                .embed(&doc.content)
                .await
                .map_err(CollectionError::Embedding)?;
            if embedding.is_empty() {
                return Err(CollectionError::Embedding(EmbeddingError::EmptyResponse));
            }
            doc.embedding = embedding;
        }

        let doc = Arc::new(doc);
        // Held until the file is written so memory and disk agree on the last write.
        let _write = match self.persist_directory() {
            Some(_) => Some(self.inner.write_locks.lock(&doc.id).await),
            None => None,
        };

        let replaced = self.store().upsert(Arc::clone(&doc)).await;
        debug!(collection = %self.name(), doc_id = %doc.id, replaced, "Stored document");

        if let Some(dir) = self.persist_directory() {
            persist::persist_document(&persist::document_path(dir, &doc.id), &doc).await?;
        }

        Ok(())
    }
}
