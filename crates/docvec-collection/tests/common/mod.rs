//! Shared helpers for collection integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docvec_collection::{EmbeddingError, EmbeddingFunction};

/// Instrumented embedding function.
///
/// - Texts registered with `with_vector` map to that vector.
/// - Texts containing the `fail_on` marker fail.
/// - Every other text maps to `[len, 1.0, 0.5]`.
#[derive(Default)]
pub struct TestEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail_on: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl TestEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingFunction for TestEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match &self.fail_on {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(EmbeddingError::Other(format!("refusing to embed '{text}'")))
            }
            _ => Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![text.len() as f32, 1.0, 0.5])),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("doc-{i}")).collect()
}

pub fn contents(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("content number {i}")).collect()
}

pub fn shared(embedder: TestEmbedder) -> Arc<TestEmbedder> {
    Arc::new(embedder)
}
