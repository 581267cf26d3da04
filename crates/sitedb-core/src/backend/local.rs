//! Local file backend
//!
//! Stores each collection as one JSON file under a directory. Used when the
//! remote repository is not configured (demo mode) and in tests. Writes go
//! to a temp file first and are renamed into place so a crash never leaves
//! a half-written collection.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::CollectionBackend;
use crate::document::Document;
use crate::error::Result;

/// Backend that keeps collections as JSON files on the local disk
pub struct LocalBackend {
    dir: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a collection's file
    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }
}

#[async_trait::async_trait]
impl CollectionBackend for LocalBackend {
    async fn read(&self, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(collection);

        if !path.exists() {
            info!(collection, "collection not found, initializing empty");
            atomic_write(&path, b"[]")?;
            return Ok(Vec::new());
        }

        let bytes = fs::read(&path)?;
        let documents = serde_json::from_slice(&bytes)?;
        debug!(collection, path = %path.display(), "read collection file");
        Ok(documents)
    }

    async fn write(&self, collection: &str, documents: &[Document], message: &str) -> Result<()> {
        let path = self.collection_path(collection);
        let json = serde_json::to_vec_pretty(documents)?;
        atomic_write(&path, &json)?;
        debug!(collection, message, "wrote collection file");
        Ok(())
    }
}

/// Write data to a file atomically
///
/// Writes to a temp file in the same directory, syncs, then renames over
/// the target so the file is never observed partially written.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(title: &str) -> Document {
        Document::new(json!({"title": title}).as_object().unwrap().clone())
    }

    #[tokio::test]
    async fn test_read_missing_collection_creates_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());

        let documents = backend.read("posts").await.unwrap();
        assert!(documents.is_empty());

        // The file now exists and holds an empty array
        let content = fs::read_to_string(temp_dir.path().join("posts.json")).unwrap();
        assert_eq!(content, "[]");
    }

    #[tokio::test]
    async fn test_write_and_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());

        let documents = vec![doc("one"), doc("two")];
        backend
            .write("posts", &documents, "Update posts collection")
            .await
            .unwrap();

        assert_eq!(backend.read("posts").await.unwrap(), documents);
    }

    #[tokio::test]
    async fn test_write_replaces_whole_collection() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());

        backend
            .write("posts", &[doc("one"), doc("two")], "Update posts collection")
            .await
            .unwrap();
        backend
            .write("posts", &[doc("three")], "Update posts collection")
            .await
            .unwrap();

        let documents = backend.read("posts").await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].get_str("title"), Some("three"));
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());

        backend
            .write("posts", &[doc("post")], "Update posts collection")
            .await
            .unwrap();
        backend
            .write("users", &[doc("user")], "Update users collection")
            .await
            .unwrap();

        assert_eq!(backend.read("posts").await.unwrap().len(), 1);
        assert_eq!(backend.read("users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path());

        fs::write(temp_dir.path().join("posts.json"), "{not json").unwrap();
        assert!(backend.read("posts").await.is_err());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("posts.json");

        atomic_write(&nested, b"[]").unwrap();
        assert_eq!(fs::read_to_string(&nested).unwrap(), "[]");
    }
}
