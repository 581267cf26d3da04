//! Document store
//!
//! The `DocumentStore` coordinates the schema registry, the collection
//! backend and the cache to provide CRUD over named collections. Every
//! operation works on a snapshot of the whole collection and replaces it
//! wholesale; there is no per-document write path.
//!
//! ## Failure policy
//!
//! Reads are soft: `get` logs and returns an empty list on any backend
//! error, so callers cannot tell "empty" from "unavailable". Writes are
//! hard: `insert`/`update`/`delete` propagate errors.
//!
//! ## Concurrency
//!
//! Operations from one task serialize through `.await`; nothing serializes
//! concurrent callers. Two overlapping inserts into the same collection can
//! both snapshot the same base array and the later write silently discards
//! the earlier document. This lost-update hazard is inherent to the
//! whole-array storage model and is preserved deliberately (see DESIGN.md);
//! `concurrent_inserts_can_lose_a_document` below asserts it.
//!
//! `ResilientStore` wraps the store with bounded retries for transient
//! failures and one-time initialization of the essential collections.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::backend::{update_message, CollectionBackend, GithubBackend, LocalBackend};
use crate::cache::CollectionCache;
use crate::config::{BackendKind, Config};
use crate::document::{Document, Fields};
use crate::error::{Result, StoreError};
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::schema::SchemaRegistry;

/// Collections created eagerly on first use of the store
pub const ESSENTIAL_COLLECTIONS: &[&str] = &["users", "websites", "posts", "media"];

/// CRUD over named collections of documents
pub struct DocumentStore {
    backend: Arc<dyn CollectionBackend>,
    registry: SchemaRegistry,
    cache: Mutex<CollectionCache>,
}

impl DocumentStore {
    /// Create a store over the given backend
    pub fn new(
        backend: Arc<dyn CollectionBackend>,
        registry: SchemaRegistry,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            backend,
            registry,
            cache: Mutex::new(CollectionCache::new(cache_ttl)),
        }
    }

    /// Build a store from configuration, selecting the backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Arc<dyn CollectionBackend> = match config.backend_kind() {
            BackendKind::Remote => Arc::new(GithubBackend::new(config)?),
            BackendKind::Local => Arc::new(LocalBackend::new(config.collections_dir())),
        };

        Ok(Self::new(
            backend,
            SchemaRegistry::new(config.schemas.clone()),
            Duration::from_millis(config.cache_ttl_ms),
        ))
    }

    /// Read a collection, serving from cache when fresh
    ///
    /// Unlike `get`, errors propagate. Used by writes and initialization.
    pub async fn load(&self, collection: &str) -> Result<Vec<Document>> {
        if let Some(cached) = self.cache.lock().await.get(collection) {
            return Ok(cached);
        }

        let documents = self.backend.read(collection).await?;
        self.cache
            .lock()
            .await
            .set(collection, documents.clone());
        Ok(documents)
    }

    /// Get all documents in a collection
    ///
    /// Soft-fail: any error is logged and an empty list returned, trading
    /// correctness-under-failure for availability.
    pub async fn get(&self, collection: &str) -> Vec<Document> {
        match self.load(collection).await {
            Ok(documents) => documents,
            Err(error) => {
                warn!(collection, %error, "read failed, returning empty collection");
                Vec::new()
            }
        }
    }

    /// Insert a document, shaping it through the collection's schema
    ///
    /// Generates `id`, `uid` and timestamps, appends to the current array
    /// and writes the whole collection back.
    pub async fn insert(&self, collection: &str, fields: Fields) -> Result<Document> {
        let mut documents = self.get(collection).await;
        let shaped = self.registry.validate(collection, &fields)?;
        let document = Document::new(shaped);

        documents.push(document.clone());
        self.commit(collection, documents).await?;

        info!(collection, id = document.id(), "inserted document");
        Ok(document)
    }

    /// Merge updates into the document whose `id` or `uid` equals `key`
    ///
    /// Unspecified fields keep their prior values; `updatedAt` is refreshed.
    pub async fn update(&self, collection: &str, key: &str, updates: Fields) -> Result<Document> {
        let mut documents = self.get(collection).await;

        let position = documents
            .iter()
            .position(|doc| doc.matches_key(key))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            })?;

        documents[position].merge(&updates);
        let updated = documents[position].clone();

        self.commit(collection, documents).await?;

        info!(collection, id = updated.id(), "updated document");
        Ok(updated)
    }

    /// Remove any document whose `id` or `uid` equals `key`
    ///
    /// Idempotent: deleting an absent key rewrites the unchanged array.
    pub async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let mut documents = self.get(collection).await;
        documents.retain(|doc| !doc.matches_key(key));

        self.commit(collection, documents).await?;

        info!(collection, key, "deleted document");
        Ok(())
    }

    /// Write the array back and refresh the cache atomically with success
    async fn commit(&self, collection: &str, documents: Vec<Document>) -> Result<()> {
        self.backend
            .write(collection, &documents, &update_message(collection))
            .await?;
        self.cache.lock().await.set(collection, documents);
        Ok(())
    }
}

/// Store wrapper adding retries and one-time initialization
///
/// Every write operation is retried with exponential backoff while the
/// error stays transient. The first operation of any kind triggers a single
/// shared initialization run that verifies connectivity and creates the
/// essential collections; concurrent first callers converge on one run.
pub struct ResilientStore {
    store: DocumentStore,
    init: OnceCell<()>,
    max_attempts: u32,
}

impl ResilientStore {
    /// Wrap a store with the default retry bound
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            init: OnceCell::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(DocumentStore::from_config(config)?))
    }

    /// Override the retry bound
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Run one-time initialization if it hasn't succeeded yet
    ///
    /// Reading an essential collection creates it when missing, so this is
    /// an idempotent create-if-absent pass. A failed run leaves the cell
    /// unset and the next call tries again.
    pub async fn ensure_initialized(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| async {
                info!("initializing essential collections");
                for collection in ESSENTIAL_COLLECTIONS {
                    let store = &self.store;
                    with_retry(&format!("init:{collection}"), self.max_attempts, || {
                        store.load(collection)
                    })
                    .await?;
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Get all documents in a collection (soft-fail, like the inner store)
    pub async fn get(&self, collection: &str) -> Vec<Document> {
        if let Err(error) = self.ensure_initialized().await {
            warn!(%error, "store initialization failed");
        }
        self.store.get(collection).await
    }

    /// Insert with retry
    pub async fn insert(&self, collection: &str, fields: Fields) -> Result<Document> {
        self.ensure_initialized().await?;
        let store = &self.store;
        with_retry(&format!("insert:{collection}"), self.max_attempts, || {
            store.insert(collection, fields.clone())
        })
        .await
    }

    /// Update with retry
    pub async fn update(&self, collection: &str, key: &str, updates: Fields) -> Result<Document> {
        self.ensure_initialized().await?;
        let store = &self.store;
        with_retry(&format!("update:{collection}"), self.max_attempts, || {
            store.update(collection, key, updates.clone())
        })
        .await
    }

    /// Delete with retry
    pub async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        self.ensure_initialized().await?;
        let store = &self.store;
        with_retry(&format!("delete:{collection}"), self.max_attempts, || {
            store.delete(collection, key)
        })
        .await
    }
}
