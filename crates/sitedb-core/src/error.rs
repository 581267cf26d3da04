//! Store error handling
//!
//! One typed error enum covers the whole store. Each variant is either
//! transient (worth retrying: conflicts, rate limits, timeouts, transport
//! failures) or fatal (validation, missing documents, rejected credentials).
//! `is_transient` is the predicate the retry layer runs on.

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was missing from an inserted document
    #[error("Missing required field '{field}' for collection '{collection}'")]
    Validation { collection: String, field: String },

    /// No document matched the given key
    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    /// The write was rejected because the content hash was stale
    #[error("Write conflict on collection '{collection}': stale content hash")]
    Conflict { collection: String },

    /// The content API rejected the request due to rate limiting
    #[error("Rate limited by content API: {0}")]
    RateLimited(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network-level failure or an unexpected HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Credentials or token were rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Blob content could not be serialized or parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file I/O failure (session record, local backend)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store was constructed with unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Classify an HTTP error response from the content API
    ///
    /// The hosting provider reports rate limiting as 403 with an explanatory
    /// body, so 403 is split on the body text: rate-limit wording is
    /// transient, anything else means the token was rejected.
    pub fn from_status(status: u16, body: &str, collection: &str) -> Self {
        let summary = body_summary(body);
        match status {
            401 => StoreError::Auth(format!("HTTP 401: {summary}")),
            403 if is_rate_limit_body(body) => {
                StoreError::RateLimited(format!("HTTP 403: {summary}"))
            }
            403 => StoreError::Auth(format!("HTTP 403: {summary}")),
            409 => StoreError::Conflict {
                collection: collection.to_string(),
            },
            429 => StoreError::RateLimited(format!("HTTP 429: {summary}")),
            _ => StoreError::Transport(format!("HTTP {status}: {summary}")),
        }
    }

    /// Whether a retry is expected to help
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. }
                | StoreError::RateLimited(_)
                | StoreError::Timeout(_)
                | StoreError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            StoreError::Timeout(error.to_string())
        } else {
            StoreError::Transport(error.to_string())
        }
    }
}

/// Check whether a 403 body indicates rate limiting rather than bad credentials
fn is_rate_limit_body(body: &str) -> bool {
    let body = body.to_lowercase();
    body.contains("rate limit") || body.contains("abuse detection")
}

/// First line of the response body, truncated for log-sized messages
fn body_summary(body: &str) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return "(empty body)".to_string();
    }
    if line.len() <= 120 {
        return line.to_string();
    }
    // Back off to a char boundary; bodies are not guaranteed to be ASCII
    let mut cut = 117;
    while !line.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &line[..cut])
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
