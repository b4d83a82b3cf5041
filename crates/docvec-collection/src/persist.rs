//! Write-through persistence of collections.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/<sha256(collection name)>/
//!     00000000.json                 collection name + metadata
//!     <sha256(document id)>.json    one serialized Document per file
//! ```
//!
//! Files are always written whole, never appended. Documents go to a
//! `.tmp` sibling first and are renamed into place, so readers only ever
//! see a complete file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use docvec_types::{Document, Metadata};

use crate::error::CollectionError;

/// File holding the collection name and metadata.
///
/// Eight zeros never collide with a 64-character document hash.
pub const METADATA_FILE_NAME: &str = "00000000.json";

const DOCUMENT_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// Collection identity as stored in [`METADATA_FILE_NAME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCollection {
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Derive a filesystem-safe name: lowercase hex SHA-256 of the input.
pub fn hash_name(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Directory of a collection under the base persist directory.
pub fn collection_dir(base: &Path, collection_name: &str) -> PathBuf {
    base.join(hash_name(collection_name))
}

/// File a document is persisted to inside its collection directory.
pub fn document_path(collection_dir: &Path, document_id: &str) -> PathBuf {
    collection_dir
        .join(hash_name(document_id))
        .with_extension(DOCUMENT_EXTENSION)
}

/// Create the collection directory and write its metadata file.
pub fn init_collection_dir(
    dir: &Path,
    collection: &PersistedCollection,
) -> Result<(), CollectionError> {
    fs::create_dir_all(dir).map_err(|e| CollectionError::persistence(dir, e))?;

    let path = dir.join(METADATA_FILE_NAME);
    let bytes = serde_json::to_vec_pretty(collection)?;
    fs::write(&path, bytes).map_err(|e| CollectionError::persistence(&path, e))?;

    info!(path = ?dir, collection = %collection.name, "Initialized collection directory");
    Ok(())
}

/// Write a single document to its file, replacing any previous version.
///
/// Callers must not write the same path concurrently; the temp file is
/// shared per path.
pub async fn persist_document(path: &Path, doc: &Document) -> Result<(), CollectionError> {
    let bytes = serde_json::to_vec(doc)?;
    let temp = path.with_extension(TEMP_EXTENSION);
    tokio::fs::write(&temp, bytes)
        .await
        .map_err(|e| CollectionError::persistence(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| CollectionError::persistence(path, e))?;
    debug!(doc_id = %doc.id, path = ?path, "Persisted document");
    Ok(())
}

/// Read a collection directory back: its metadata and every document file.
pub fn load_collection_dir(
    dir: &Path,
) -> Result<(PersistedCollection, Vec<Document>), CollectionError> {
    let metadata_path = dir.join(METADATA_FILE_NAME);
    let bytes =
        fs::read(&metadata_path).map_err(|e| CollectionError::persistence(&metadata_path, e))?;
    let collection: PersistedCollection = serde_json::from_slice(&bytes)?;

    let mut documents = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| CollectionError::persistence(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| CollectionError::persistence(dir, e))?.path();
        if !path.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION)
            || path.file_name().and_then(|n| n.to_str()) == Some(METADATA_FILE_NAME)
        {
            continue;
        }

        let bytes = fs::read(&path).map_err(|e| CollectionError::persistence(&path, e))?;
        let doc: Document = serde_json::from_slice(&bytes)?;
        if doc.id.is_empty() || doc.embedding.is_empty() {
            return Err(CollectionError::Corrupt {
                path,
                reason: "document without id or embedding".to_string(),
            });
        }
        documents.push(doc);
    }

    debug!(path = ?dir, count = documents.len(), "Loaded collection directory");
    Ok((collection, documents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_name_is_deterministic_hex() {
        let a = hash_name("doc-1");
        assert_eq!(a, hash_name("doc-1"));
        assert_ne!(a, hash_name("doc-2"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_name_known_value() {
        assert_eq!(
            hash_name(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_document_path_hides_id() {
        let path = document_path(Path::new("/data/c"), "../../etc/passwd");
        assert_eq!(path.parent(), Some(Path::new("/data/c")));
        assert!(!path.to_string_lossy().contains("passwd"));
    }

    #[tokio::test]
    async fn test_write_and_load() {
        let temp = TempDir::new().unwrap();
        let dir = collection_dir(temp.path(), "notes");
        let collection = PersistedCollection {
            name: "notes".to_string(),
            metadata: Metadata::from([("owner".to_string(), "me".to_string())]),
        };
        init_collection_dir(&dir, &collection).unwrap();

        let doc = Document::new("a")
            .with_embedding(vec![0.5, 0.5])
            .with_content("hello");
        persist_document(&document_path(&dir, "a"), &doc).await.unwrap();

        let (loaded, docs) = load_collection_dir(&dir).unwrap();
        assert_eq!(loaded, collection);
        assert_eq!(docs, vec![doc]);
    }

    #[tokio::test]
    async fn test_shorter_rewrite_replaces_whole_file() {
        let temp = TempDir::new().unwrap();
        let dir = collection_dir(temp.path(), "notes");
        init_collection_dir(
            &dir,
            &PersistedCollection {
                name: "notes".to_string(),
                metadata: Metadata::new(),
            },
        )
        .unwrap();

        let path = document_path(&dir, "a");
        let long = Document::new("a")
            .with_embedding(vec![1.0, 2.0, 3.0])
            .with_content("a much longer body of text than the next one");
        let short = Document::new("a").with_embedding(vec![1.0]);
        persist_document(&path, &long).await.unwrap();
        persist_document(&path, &short).await.unwrap();

        let (_, docs) = load_collection_dir(&dir).unwrap();
        assert_eq!(docs, vec![short]);
        assert!(!path.with_extension(TEMP_EXTENSION).exists());
    }

    #[tokio::test]
    async fn test_load_skips_leftover_temp_file() {
        let temp = TempDir::new().unwrap();
        let dir = collection_dir(temp.path(), "notes");
        init_collection_dir(
            &dir,
            &PersistedCollection {
                name: "notes".to_string(),
                metadata: Metadata::new(),
            },
        )
        .unwrap();
        let path = document_path(&dir, "a");
        fs::write(path.with_extension(TEMP_EXTENSION), b"{\"id\":\"a\",\"emb").unwrap();

        let (_, docs) = load_collection_dir(&dir).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_load_rejects_document_without_embedding() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("c");
        init_collection_dir(
            &dir,
            &PersistedCollection {
                name: "c".to_string(),
                metadata: Metadata::new(),
            },
        )
        .unwrap();
        fs::write(document_path(&dir, "x"), r#"{"id":"x","content":"no vector"}"#).unwrap();

        assert!(matches!(
            load_collection_dir(&dir),
            Err(CollectionError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            load_collection_dir(&temp.path().join("missing")),
            Err(CollectionError::Persistence { .. })
        ));
    }
}
