//! In-memory collection cache
//!
//! Collections are read and written as whole blobs, so the cache works at
//! the same granularity: one entry per collection, refreshed wholesale on
//! every successful write. Entries expire lazily on read; there is no
//! background sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::document::Document;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

struct CacheEntry {
    data: Vec<Document>,
    fetched_at: Instant,
}

/// TTL-bounded map from collection name to its documents
pub struct CollectionCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl CollectionCache {
    /// Create a cache with the given entry lifetime
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Get a collection's documents if the entry is still fresh
    ///
    /// An entry at or past the TTL is evicted and treated as absent.
    pub fn get(&mut self, collection: &str) -> Option<Vec<Document>> {
        let fresh = self
            .entries
            .get(collection)
            .map(|entry| entry.fetched_at.elapsed() < self.ttl)?;

        if !fresh {
            self.entries.remove(collection);
            return None;
        }

        self.entries.get(collection).map(|entry| entry.data.clone())
    }

    /// Store a collection's documents, overwriting any existing entry
    pub fn set(&mut self, collection: &str, data: Vec<Document>) {
        self.entries.insert(
            collection.to_string(),
            CacheEntry {
                data,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop a collection's entry
    pub fn invalidate(&mut self, collection: &str) {
        self.entries.remove(collection);
    }
}
