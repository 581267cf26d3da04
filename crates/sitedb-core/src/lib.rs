//! sitedb core library
//!
//! sitedb turns a Git hosting provider's content API into a lightweight
//! document database for website content. Each collection is one JSON array
//! blob committed to a repository; documents are schemaless JSON maps with
//! generated `id`/`uid` identifiers and timestamps.
//!
//! # Architecture
//!
//! - The **backend** is the system of record: collections are read and
//!   written whole, with an optimistic concurrency token on remote writes.
//! - The **cache** is a TTL-bounded read accelerator, refreshed on every
//!   successful write.
//! - The **schema registry** shapes documents at insert time.
//! - The **resilient store** retries transient failures and lazily creates
//!   the essential collections on first use.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = Arc::new(ResilientStore::from_config(&config)?);
//!
//! // Insert a post
//! let post = store.insert("posts", fields).await?;
//!
//! // Read the collection back
//! let posts = store.get("posts").await;
//! ```
//!
//! # Modules
//!
//! - `store`: CRUD orchestration and the retry/init wrapper (main entry point)
//! - `backend`: remote (GitHub contents API) and local-file blob storage
//! - `document`: document type and identifier generation
//! - `schema`: per-collection validation and defaults
//! - `cache`: TTL-bounded collection cache
//! - `retry`: bounded exponential backoff
//! - `session`: login, registration and the persisted session record
//! - `config`: application configuration

pub mod backend;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod retry;
pub mod schema;
pub mod session;
pub mod store;

pub use backend::{CollectionBackend, GithubBackend, LocalBackend};
pub use config::{AuthConfig, BackendKind, Config};
pub use document::{Document, Fields};
pub use error::{Result, StoreError};
pub use retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
pub use schema::{CollectionSchema, FieldType, SchemaRegistry};
pub use session::{Session, SessionManager};
pub use store::{DocumentStore, ResilientStore, ESSENTIAL_COLLECTIONS};
