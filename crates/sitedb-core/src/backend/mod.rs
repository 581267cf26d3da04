//! Collection backends
//!
//! A backend persists whole collections: read returns the full document
//! array (creating the collection empty on first access), write replaces it.
//! The remote backend commits against a Git hosting content API; the local
//! backend keeps one JSON file per collection for demo and offline use.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

pub mod github;
pub mod local;

pub use github::GithubBackend;
pub use local::LocalBackend;

/// Whole-collection blob storage
#[async_trait]
pub trait CollectionBackend: Send + Sync {
    /// Read a collection's full document array
    ///
    /// A collection that does not exist yet is created empty and `[]` is
    /// returned rather than an error.
    async fn read(&self, collection: &str) -> Result<Vec<Document>>;

    /// Replace a collection's contents with the given array
    async fn write(&self, collection: &str, documents: &[Document], message: &str) -> Result<()>;
}

/// Commit message for replacing a collection's contents
pub fn update_message(collection: &str) -> String {
    format!("Update {collection} collection")
}

/// Commit message for creating a collection on first access
pub fn initialize_message(collection: &str) -> String {
    format!("Initialize {collection} collection")
}
