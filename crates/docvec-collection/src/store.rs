//! In-memory document store.
//!
//! Maps document ids to documents behind one async reader/writer lock.
//! Queries hold the read guard for their whole scan, so they observe a
//! consistent snapshot; writers only hold the lock for the map update.
//!
//! [`IdLocks`] orders writes of the same id end to end, so a write and its
//! persisted copy cannot interleave with another write of that id.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use docvec_types::Document;

/// Id -> document map guarding all reads and writes.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, Arc<Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with documents (later ids win).
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (doc.id.clone(), Arc::new(doc)))
            .collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Number of stored documents.
    pub async fn count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Insert or fully replace a document by id.
    ///
    /// Returns true if a document with the same id was replaced.
    pub async fn upsert(&self, doc: Arc<Document>) -> bool {
        let mut documents = self.documents.write().await;
        documents.insert(doc.id.clone(), doc).is_some()
    }

    /// Look up a document by id.
    pub async fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.documents.read().await.get(id).cloned()
    }

    /// Acquire the read lock for a scan.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Document>>> {
        self.documents.read().await
    }
}

const ID_LOCK_STRIPES: usize = 64;

/// Striped per-id write locks. One id always maps to the same stripe;
/// unrelated ids may share one.
#[derive(Debug)]
pub(crate) struct IdLocks {
    stripes: Vec<Mutex<()>>,
}

impl Default for IdLocks {
    fn default() -> Self {
        Self {
            stripes: (0..ID_LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }
}

impl IdLocks {
    fn stripe(&self, id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    /// Wait for exclusive write access to `id`.
    pub(crate) async fn lock(&self, id: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe(id)].lock().await
    }
}
