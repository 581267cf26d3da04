//! GitHub contents API backend
//!
//! Each collection lives at `{base_path}/{collection}.json` on a branch of
//! the configured repository. Reads GET the path and base64-decode the
//! returned content; writes PUT the full serialized array as a commit,
//! passing the blob's current SHA as an optimistic concurrency token.
//!
//! The SHA is always fetched fresh immediately before the PUT, never reused
//! from an earlier read. Two racing writers therefore both pass the hash
//! check and the later commit silently replaces the earlier one; this
//! whole-array lost-update behavior is intentional (see DESIGN.md).

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{initialize_message, CollectionBackend};
use crate::config::Config;
use crate::document::Document;
use crate::error::{Result, StoreError};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("sitedb/", env!("CARGO_PKG_VERSION"));

/// Blob metadata returned by a contents GET
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

/// Body of a contents PUT
#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Backend that commits collections to a GitHub repository
#[derive(Debug)]
pub struct GithubBackend {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    base_path: String,
    token: String,
}

impl GithubBackend {
    /// Build a backend from configuration
    ///
    /// Fails if the repository settings are incomplete.
    pub fn new(config: &Config) -> Result<Self> {
        if !config.is_remote_configured() {
            return Err(StoreError::Config(
                "remote backend requires owner, repo and token".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            base_path: config.base_path.clone(),
            token: config.token.clone(),
        })
    }

    /// Point the backend at a different API host (test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Repository path of a collection's blob
    fn blob_path(&self, collection: &str) -> String {
        if self.base_path.is_empty() {
            format!("{collection}.json")
        } else {
            format!("{}/{collection}.json", self.base_path)
        }
    }

    fn contents_url(&self, collection: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            self.blob_path(collection)
        )
    }

    /// GET the blob, returning `None` on 404
    async fn fetch_blob(&self, collection: &str) -> Result<Option<ContentsResponse>> {
        let response = self
            .client
            .get(self.contents_url(collection))
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status.as_u16(), &body, collection));
        }

        Ok(Some(response.json().await?))
    }

    /// PUT the serialized array, with the SHA when the blob already exists
    async fn put_blob(
        &self,
        collection: &str,
        documents: &[Document],
        message: &str,
        sha: Option<String>,
    ) -> Result<()> {
        let body = PutRequest {
            message,
            content: encode_content(documents)?,
            branch: &self.branch,
            sha,
        };

        let response = self
            .client
            .put(self.contents_url(collection))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status.as_u16(), &text, collection));
        }

        info!(collection, message, "committed collection");
        Ok(())
    }
}

#[async_trait::async_trait]
impl CollectionBackend for GithubBackend {
    async fn read(&self, collection: &str) -> Result<Vec<Document>> {
        match self.fetch_blob(collection).await? {
            Some(blob) => {
                debug!(collection, sha = %blob.sha, "fetched collection blob");
                decode_content(&blob.content)
            }
            None => {
                // First access: create the collection as an empty array
                info!(collection, "collection not found, initializing empty");
                self.put_blob(collection, &[], &initialize_message(collection), None)
                    .await?;
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, collection: &str, documents: &[Document], message: &str) -> Result<()> {
        // Fresh SHA lookup at write time; see module docs for the consequence.
        let sha = self
            .fetch_blob(collection)
            .await?
            .map(|blob| blob.sha);

        self.put_blob(collection, documents, message, sha).await
    }
}

/// Serialize documents and base64-encode for transport
fn encode_content(documents: &[Document]) -> Result<String> {
    let json = serde_json::to_vec_pretty(documents)?;
    Ok(BASE64.encode(json))
}

/// Decode base64 transport content into a document array
///
/// The API wraps base64 at 60 columns; whitespace is stripped first.
fn decode_content(content: &str) -> Result<Vec<Document>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Transport(format!("invalid base64 blob content: {e}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> GithubBackend {
        let mut config = Config::default();
        config.owner = "acme".to_string();
        config.repo = "content".to_string();
        config.token = "tok".to_string();
        GithubBackend::new(&config).unwrap()
    }

    #[test]
    fn test_new_requires_remote_settings() {
        let err = GithubBackend::new(&Config::default()).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_blob_path() {
        let backend = backend();
        assert_eq!(backend.blob_path("posts"), "data/posts.json");

        let mut config = Config::default();
        config.owner = "acme".to_string();
        config.repo = "content".to_string();
        config.token = "tok".to_string();
        config.base_path = String::new();
        let rootless = GithubBackend::new(&config).unwrap();
        assert_eq!(rootless.blob_path("posts"), "posts.json");
    }

    #[test]
    fn test_contents_url() {
        let backend = backend();
        assert_eq!(
            backend.contents_url("posts"),
            "https://api.github.com/repos/acme/content/contents/data/posts.json"
        );

        let pointed = backend.with_api_base("http://localhost:9999");
        assert_eq!(
            pointed.contents_url("posts"),
            "http://localhost:9999/repos/acme/content/contents/data/posts.json"
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let docs = vec![Document::new(
            json!({"title": "Hi"}).as_object().unwrap().clone(),
        )];

        let encoded = encode_content(&docs).unwrap();
        let decoded = decode_content(&encoded).unwrap();
        assert_eq!(decoded, docs);
    }

    #[test]
    fn test_decode_handles_wrapped_base64() {
        let docs = vec![Document::new(
            json!({"body": "long enough to wrap over several base64 lines in transport"})
                .as_object()
                .unwrap()
                .clone(),
        )];
        let encoded = encode_content(&docs).unwrap();

        // Re-wrap at 60 columns the way the API serves it
        let wrapped: String = encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| format!("{}\n", std::str::from_utf8(chunk).unwrap()))
            .collect();

        assert_eq!(decode_content(&wrapped).unwrap(), docs);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_content("not base64 at all!!!").unwrap_err(),
            StoreError::Transport(_)
        ));
    }

    #[test]
    fn test_put_request_omits_absent_sha() {
        let body = PutRequest {
            message: "Initialize posts collection",
            content: "e30=".to_string(),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());

        let body = PutRequest {
            sha: Some("abc123".to_string()),
            ..body
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json.get("sha"), Some(&json!("abc123")));
    }
}
