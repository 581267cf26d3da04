//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/sitedb/config.toml)
//! 3. Environment variables (SITEDB_* prefix)
//!
//! Environment variables take precedence over config file values. The access
//! token in particular is usually supplied via `SITEDB_TOKEN` rather than
//! written to disk.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::schema::{CollectionSchema, FieldType};

/// Environment variable prefix
const ENV_PREFIX: &str = "SITEDB";

/// Which backend the store talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Git-hosted content API (the system of record in production)
    Remote,
    /// Local JSON files under the data directory (demo/offline mode)
    Local,
}

/// Auth-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether new accounts start unverified
    #[serde(default)]
    pub require_email_verification: bool,

    /// Session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_email_verification: false,
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Repository owner on the hosting provider
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repo: String,

    /// Branch collections are committed to
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Path prefix for collection blobs within the repository
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Path prefix for uploaded media within the repository
    #[serde(default = "default_media_path")]
    pub media_path: String,

    /// Access token for the content API
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Cache entry lifetime in milliseconds
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Directory for local state (session record, local backend data)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Backend override; when absent the store picks remote if the
    /// repository settings are complete, local otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// Auth settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Per-collection schemas
    #[serde(default = "default_schemas")]
    pub schemas: HashMap<String, CollectionSchema>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            base_path: default_base_path(),
            media_path: default_media_path(),
            token: String::new(),
            cache_ttl_ms: default_cache_ttl_ms(),
            data_dir: default_data_dir(),
            backend: None,
            auth: AuthConfig::default(),
            schemas: default_schemas(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SITEDB_OWNER, SITEDB_REPO, SITEDB_TOKEN, ...)
    /// 2. Config file (~/.config/sitedb/config.toml or SITEDB_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_OWNER", ENV_PREFIX)) {
            self.owner = val;
        }
        if let Ok(val) = std::env::var(format!("{}_REPO", ENV_PREFIX)) {
            self.repo = val;
        }
        if let Ok(val) = std::env::var(format!("{}_BRANCH", ENV_PREFIX)) {
            self.branch = val;
        }
        if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
            self.token = val;
        }
        if let Ok(val) = std::env::var(format!("{}_BASE_PATH", ENV_PREFIX)) {
            self.base_path = val;
        }
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var(format!("{}_CACHE_TTL_MS", ENV_PREFIX)) {
            if let Ok(ms) = val.parse() {
                self.cache_ttl_ms = ms;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SITEDB_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sitedb")
            .join("config.toml")
    }

    /// Whether the remote backend settings are complete
    pub fn is_remote_configured(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.token.is_empty()
    }

    /// Effective backend: explicit override, else remote when configured
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.unwrap_or(if self.is_remote_configured() {
            BackendKind::Remote
        } else {
            BackendKind::Local
        })
    }

    /// Path of the persisted session record
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Directory the local backend stores collection files in
    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.join("collections")
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_base_path() -> String {
    "data".to_string()
}

fn default_media_path() -> String {
    "media".to_string()
}

fn default_cache_ttl_ms() -> u64 {
    30_000
}

fn default_session_ttl_hours() -> i64 {
    24
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sitedb")
}

fn obj(value: serde_json::Value) -> crate::document::Fields {
    value.as_object().cloned().unwrap_or_default()
}

/// Built-in schemas for the collections the website builder ships with
///
/// A config file's `schemas` table replaces this set wholesale.
fn default_schemas() -> HashMap<String, CollectionSchema> {
    HashMap::from([
        (
            "users".to_string(),
            CollectionSchema {
                required: vec!["email".to_string(), "password".to_string()],
                types: HashMap::from([
                    ("email".to_string(), FieldType::String),
                    ("verified".to_string(), FieldType::Boolean),
                ]),
                defaults: obj(json!({"role": "user", "verified": false})),
            },
        ),
        (
            "websites".to_string(),
            CollectionSchema {
                required: vec!["name".to_string()],
                types: HashMap::from([("name".to_string(), FieldType::String)]),
                defaults: obj(json!({"published": false, "pages": []})),
            },
        ),
        (
            "posts".to_string(),
            CollectionSchema {
                required: vec!["websiteId".to_string(), "title".to_string()],
                types: HashMap::from([
                    ("title".to_string(), FieldType::String),
                    ("tags".to_string(), FieldType::Array),
                ]),
                defaults: obj(json!({"status": "published", "tags": []})),
            },
        ),
        (
            "media".to_string(),
            CollectionSchema {
                required: vec!["url".to_string()],
                types: HashMap::from([("url".to_string(), FieldType::String)]),
                defaults: obj(json!({"alt": ""})),
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "SITEDB_OWNER",
        "SITEDB_REPO",
        "SITEDB_BRANCH",
        "SITEDB_TOKEN",
        "SITEDB_BASE_PATH",
        "SITEDB_DATA_DIR",
        "SITEDB_CACHE_TTL_MS",
    ];

    #[test]
    fn test_default_config() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert_eq!(config.branch, "main");
        assert_eq!(config.base_path, "data");
        assert_eq!(config.cache_ttl_ms, 30_000);
        assert!(config.data_dir.ends_with("sitedb"));
        assert!(!config.is_remote_configured());
        assert_eq!(config.backend_kind(), BackendKind::Local);
        assert!(config.schemas.contains_key("posts"));
    }

    #[test]
    fn test_backend_selection() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        config.owner = "acme".to_string();
        config.repo = "content".to_string();
        config.token = "tok".to_string();
        assert_eq!(config.backend_kind(), BackendKind::Remote);

        // Explicit override wins over inference
        config.backend = Some(BackendKind::Local);
        assert_eq!(config.backend_kind(), BackendKind::Local);
    }

    #[test]
    fn test_file_paths() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert!(config.session_path().ends_with("session.json"));
        assert!(config.collections_dir().ends_with("collections"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("SITEDB_OWNER", "acme");
        env::set_var("SITEDB_TOKEN", "secret");
        env::set_var("SITEDB_DATA_DIR", "/tmp/sitedb-test");
        env::set_var("SITEDB_CACHE_TTL_MS", "5000");
        config.apply_env_overrides();

        assert_eq!(config.owner, "acme");
        assert_eq!(config.token, "secret");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/sitedb-test"));
        assert_eq!(config.cache_ttl_ms, 5000);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            owner = "acme"
            repo = "content"
            branch = "production"
            base_path = "db"

            [auth]
            require_email_verification = true

            [schemas.pages]
            required = ["title"]

            [schemas.pages.defaults]
            layout = "default"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.owner, "acme");
        assert_eq!(config.branch, "production");
        assert_eq!(config.base_path, "db");
        assert!(config.auth.require_email_verification);

        let pages = config.schemas.get("pages").unwrap();
        assert_eq!(pages.required, vec!["title"]);
        assert_eq!(
            pages.defaults.get("layout"),
            Some(&serde_json::json!("default"))
        );
        // Config-file schemas replace the built-in set
        assert!(!config.schemas.contains_key("posts"));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("SITEDB_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.branch, "main");
        assert!(config.owner.is_empty());
    }

    #[test]
    fn test_serialization_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        config.owner = "acme".to_string();
        config.repo = "content".to_string();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.owner, config.owner);
        assert_eq!(parsed.repo, config.repo);
        assert_eq!(parsed.cache_ttl_ms, config.cache_ttl_ms);
    }
}
