//! Command implementations for the docvec CLI.
//!
//! Handles:
//! - add: read JSON-lines documents and ingest them concurrently
//! - query: rank a collection's documents against a text
//! - count: report the number of documents
//! - config: print the effective settings

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docvec_collection::{Collection, Document, EmbeddingFunction, Metadata};
use docvec_embeddings::{OpenAiEmbedder, OpenAiEmbedderConfig};
use docvec_types::Settings;

/// Load settings and apply CLI overrides (highest precedence).
pub fn resolve_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    persist_dir_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(dir) = persist_dir_override {
        settings.persist_directory = dir.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Build the embedding function configured in settings.
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingFunction>> {
    let config = OpenAiEmbedderConfig::from_settings(&settings.embedding);
    let embedder = OpenAiEmbedder::new(config).context("Failed to create embedder")?;
    Ok(Arc::new(embedder))
}

/// Parse a JSON-lines file into documents. Blank lines are skipped.
pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Document>(line)
                .with_context(|| format!("{}:{}: invalid document", path.display(), i + 1))
        })
        .collect()
}

/// Build the content filter from the CLI flags.
pub fn content_filter(contains: Option<String>, not_contains: Option<String>) -> Option<Metadata> {
    let mut filter = Metadata::new();
    if let Some(value) = contains {
        filter.insert("$contains".to_string(), value);
    }
    if let Some(value) = not_contains {
        filter.insert("$not_contains".to_string(), value);
    }
    (!filter.is_empty()).then_some(filter)
}

/// Add documents from a JSON-lines file, creating the collection if needed.
///
/// Ctrl-C cancels documents that have not started yet.
pub async fn handle_add(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingFunction>,
    collection_name: &str,
    file: &Path,
    concurrency: Option<usize>,
    metadata: Vec<(String, String)>,
) -> Result<usize> {
    let documents = read_documents(file)?;
    if documents.is_empty() {
        bail!("{} contains no documents", file.display());
    }

    let metadata: Metadata = metadata.into_iter().collect();
    let persist_dir = settings.expanded_persist_directory();
    let collection = Collection::open(collection_name, &metadata, embedder, &persist_dir)
        .with_context(|| format!("Failed to open collection '{collection_name}'"))?;

    let concurrency = concurrency.unwrap_or(settings.concurrency);
    let total = documents.len();
    info!(collection = %collection_name, documents = total, concurrency, "Adding documents");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining documents");
            on_interrupt.cancel();
        }
    });

    let result = collection
        .add_documents(&cancel, documents, concurrency)
        .await;
    interrupt.abort();
    result.context("Failed to add documents")?;

    let count = collection.count().await;
    info!(collection = %collection_name, added = total, count, "Documents added");
    Ok(count)
}

/// Query a persisted collection and print one JSON object per result.
pub async fn handle_query(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingFunction>,
    collection_name: &str,
    text: &str,
    n_results: Option<usize>,
    where_metadata: Vec<(String, String)>,
    where_document: Option<Metadata>,
) -> Result<Vec<serde_json::Value>> {
    let collection = load_collection(settings, embedder, collection_name)?;

    let where_metadata: Metadata = where_metadata.into_iter().collect();
    let results = collection
        .query(
            text,
            n_results.unwrap_or(settings.default_n_results),
            (!where_metadata.is_empty()).then_some(&where_metadata),
            where_document.as_ref(),
        )
        .await
        .context("Query failed")?;

    Ok(results
        .iter()
        .map(|r| {
            json!({
                "id": r.document.id,
                "similarity": r.similarity,
                "content": r.document.content,
                "metadata": r.document.metadata,
            })
        })
        .collect())
}

/// Count the documents of a persisted collection.
pub async fn handle_count(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingFunction>,
    collection_name: &str,
) -> Result<usize> {
    let collection = load_collection(settings, embedder, collection_name)?;
    Ok(collection.count().await)
}

/// Render the effective settings as TOML.
pub fn show_config(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to render configuration")
}

fn load_collection(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingFunction>,
    collection_name: &str,
) -> Result<Collection> {
    let persist_dir = settings.expanded_persist_directory();
    Collection::load(collection_name, embedder, &persist_dir).with_context(|| {
        format!(
            "Failed to load collection '{}' from {}",
            collection_name,
            persist_dir.display()
        )
    })
}
