//! Batch ingestion with bounded concurrency and first-error cancellation.
//!
//! Every document gets its own task. A semaphore admits at most
//! `concurrency` of them into embedding/storing at once. The first task to
//! fail records its error and cancels a token shared by the batch; tasks
//! that have not started, or are still waiting for a permit, then exit
//! without doing any work. Tasks already running are not interrupted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use docvec_types::{Document, Metadata};

use crate::collection::Collection;
use crate::error::CollectionError;

/// Slot for the first error of a batch. Recording the error and cancelling
/// the batch happen under the same lock so exactly one error wins.
struct FirstError {
    slot: Mutex<Option<CollectionError>>,
    cancel: CancellationToken,
}

impl FirstError {
    fn new(cancel: CancellationToken) -> Self {
        Self {
            slot: Mutex::new(None),
            cancel,
        }
    }

    fn record(&self, err: CollectionError) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
            self.cancel.cancel();
        }
    }

    fn take(&self) -> Option<CollectionError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Collection {
    /// Add documents given as parallel slices, one at a time.
    ///
    /// - `ids`: required, one per document
    /// - `embeddings`: empty, or one per id; missing ones are computed from `contents`
    /// - `metadatas`: empty, or one per id
    /// - `contents`: empty, or one per id
    pub async fn add(
        &self,
        cancel: &CancellationToken,
        ids: &[String],
        embeddings: &[Vec<f32>],
        metadatas: &[Metadata],
        contents: &[String],
    ) -> Result<(), CollectionError> {
        self.add_concurrently(cancel, ids, embeddings, metadatas, contents, 1)
            .await
    }

    /// Like [`Collection::add`], embedding up to `concurrency` documents at once.
    pub async fn add_concurrently(
        &self,
        cancel: &CancellationToken,
        ids: &[String],
        embeddings: &[Vec<f32>],
        metadatas: &[Metadata],
        contents: &[String],
        concurrency: usize,
    ) -> Result<(), CollectionError> {
        if ids.is_empty() {
            return Err(CollectionError::InvalidInput("ids are empty".to_string()));
        }
        if embeddings.is_empty() && contents.is_empty() {
            return Err(CollectionError::InvalidInput(
                "either embeddings or contents must be filled".to_string(),
            ));
        }
        check_parallel_len("embeddings", embeddings.len(), ids.len())?;
        check_parallel_len("metadatas", metadatas.len(), ids.len())?;
        check_parallel_len("contents", contents.len(), ids.len())?;
        if concurrency == 0 {
            return Err(CollectionError::InvalidInput(
                "concurrency must be at least 1".to_string(),
            ));
        }

        // Cloning here detaches the stored values from the caller's slices.
        let documents = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Document {
                id: id.clone(),
                embedding: embeddings.get(i).cloned().unwrap_or_default(),
                metadata: metadatas.get(i).cloned().unwrap_or_default(),
                content: contents.get(i).cloned().unwrap_or_default(),
            })
            .collect();

        self.add_documents(cancel, documents, concurrency).await
    }

    /// Add documents with at most `concurrency` of them in flight.
    ///
    /// Returns the first error observed, wrapped with the failing document id.
    /// Documents that completed before the failure stay stored. If `cancel`
    /// fires before every document was processed and no document failed,
    /// [`CollectionError::Cancelled`] is returned.
    pub async fn add_documents(
        &self,
        cancel: &CancellationToken,
        documents: Vec<Document>,
        concurrency: usize,
    ) -> Result<(), CollectionError> {
        if documents.is_empty() {
            return Err(CollectionError::InvalidInput(
                "documents are empty".to_string(),
            ));
        }
        if concurrency == 0 {
            return Err(CollectionError::InvalidInput(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let batch = cancel.child_token();
        let total = documents.len();
        let first_error = Arc::new(FirstError::new(batch.clone()));
        // No more than `total` permits can ever be taken.
        let semaphore = Arc::new(Semaphore::new(concurrency.min(total)));
        let skipped = Arc::new(AtomicUsize::new(0));

        let mut workers = JoinSet::new();
        for doc in documents {
            let collection = self.clone();
            let batch = batch.clone();
            let first_error = Arc::clone(&first_error);
            let semaphore = Arc::clone(&semaphore);
            let skipped = Arc::clone(&skipped);

            workers.spawn(async move {
                if batch.is_cancelled() {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }

                let permit = tokio::select! {
                    biased;
                    _ = batch.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                if permit.is_none() || batch.is_cancelled() {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }

                let id = doc.id.clone();
                if let Err(err) = collection.add_document(doc).await {
                    first_error.record(err.for_document(&id));
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }

        let skipped = skipped.load(Ordering::Relaxed);
        debug!(
            collection = %self.name(),
            total,
            skipped,
            concurrency,
            "Batch ingestion finished"
        );

        if let Some(err) = first_error.take() {
            return Err(err);
        }
        if skipped > 0 {
            return Err(CollectionError::Cancelled);
        }
        Ok(())
    }
}

fn check_parallel_len(field: &str, len: usize, ids: usize) -> Result<(), CollectionError> {
    if len != 0 && len != ids {
        return Err(CollectionError::InvalidInput(format!(
            "when {field} is not empty it must have the same length as ids ({len} != {ids})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_parallel_len() {
        assert!(check_parallel_len("contents", 0, 3).is_ok());
        assert!(check_parallel_len("contents", 3, 3).is_ok());
        let err = check_parallel_len("contents", 2, 3).unwrap_err();
        assert!(err.to_string().contains("contents"));
    }

    #[test]
    fn test_first_error_wins() {
        let token = CancellationToken::new();
        let first = FirstError::new(token.clone());

        first.record(CollectionError::InvalidInput("first".to_string()));
        first.record(CollectionError::InvalidInput("second".to_string()));

        assert!(token.is_cancelled());
        let err = first.take().unwrap();
        assert!(err.to_string().contains("first"));
        assert!(first.take().is_none());
    }
}
