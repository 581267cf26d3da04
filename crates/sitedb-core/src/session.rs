//! Session and auth management
//!
//! Credentials live in the `users` collection; the active session is a
//! single JSON record on local disk, outside the blob store. A session
//! carries a bearer token, the logged-in user document (password stripped)
//! and a fixed expiry; expiry is checked on every access and an expired
//! session reads as "no session".
//!
//! Passwords are stored as `salt$hash` (hex-encoded random salt, SHA-256
//! over salt then password) and verified by recomputation.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::document::{Document, Fields};
use crate::error::{Result, StoreError};
use crate::store::ResilientStore;

const USERS_COLLECTION: &str = "users";
const PASSWORD_FIELD: &str = "password";

/// An authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token handed to the caller
    pub token: String,
    /// The logged-in user, without the password field
    pub user: Document,
    /// Fixed expiry set at issuance
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// Manages login, registration and the persisted session record
pub struct SessionManager {
    store: Arc<ResilientStore>,
    session_path: PathBuf,
    session_ttl: Duration,
    require_email_verification: bool,
}

impl SessionManager {
    /// Create a manager persisting its session record at `session_path`
    pub fn new(store: Arc<ResilientStore>, session_path: PathBuf) -> Self {
        Self {
            store,
            session_path,
            session_ttl: Duration::hours(24),
            require_email_verification: false,
        }
    }

    /// Override the session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Whether newly registered accounts start unverified
    pub fn with_email_verification(mut self, required: bool) -> Self {
        self.require_email_verification = required;
        self
    }

    /// Verify credentials and open a session
    ///
    /// Fails `NotFound` when no user has the email, `Auth` when the
    /// password does not verify. On success the session is persisted and
    /// the token returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let users = self.store.get(USERS_COLLECTION).await;

        let user = users
            .iter()
            .find(|user| user.get_str("email") == Some(email))
            .ok_or_else(|| StoreError::NotFound {
                collection: USERS_COLLECTION.to_string(),
                key: email.to_string(),
            })?;

        let stored = user.get_str(PASSWORD_FIELD).unwrap_or_default();
        if !password::verify(password, stored) {
            return Err(StoreError::Auth("invalid credentials".to_string()));
        }

        let session = Session {
            token: generate_token(),
            user: strip_password(user.clone()),
            expires_at: Utc::now() + self.session_ttl,
        };
        self.save_session(&session)?;

        info!(email, "user logged in");
        Ok(session.token)
    }

    /// Create an account
    ///
    /// Fails `Auth` when the email is already registered. The password is
    /// hashed before insert; the returned document has it stripped.
    pub async fn register(&self, email: &str, password: &str, profile: Fields) -> Result<Document> {
        let users = self.store.get(USERS_COLLECTION).await;
        if users.iter().any(|user| user.get_str("email") == Some(email)) {
            return Err(StoreError::Auth(format!(
                "an account already exists for {email}"
            )));
        }

        let mut fields = profile;
        fields.insert("email".to_string(), Value::String(email.to_string()));
        fields.insert(
            PASSWORD_FIELD.to_string(),
            Value::String(password::hash(password)),
        );
        fields.insert(
            "verified".to_string(),
            Value::Bool(!self.require_email_verification),
        );
        fields
            .entry("role".to_string())
            .or_insert(Value::String("user".to_string()));

        let user = self.store.insert(USERS_COLLECTION, fields).await?;

        info!(email, "user registered");
        Ok(strip_password(user))
    }

    /// The logged-in user, or `None` when no live session exists
    ///
    /// An expired session record is deleted on sight.
    pub fn current_user(&self) -> Result<Option<Document>> {
        let Some(session) = self.load_session()? else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            debug!("session expired, clearing");
            self.clear_session()?;
            return Ok(None);
        }

        Ok(Some(session.user))
    }

    /// Drop the persisted session unconditionally
    pub fn logout(&self) -> Result<()> {
        self.clear_session()?;
        info!("logged out");
        Ok(())
    }

    fn load_session(&self) -> Result<Option<Session>> {
        if !self.session_path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.session_path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(session)?;
        fs::write(&self.session_path, json)?;
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)?;
        }
        Ok(())
    }
}

fn strip_password(mut user: Document) -> Document {
    user.remove(PASSWORD_FIELD);
    user
}

/// Mint a 64-character hex bearer token
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Salted password hashing
pub mod password {
    use rand::RngCore;
    use sha2::{Digest, Sha256};

    /// Hash a password into the stored `salt$hash` form
    pub fn hash(password: &str) -> String {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        format!("{}${}", hex::encode(salt), digest(&salt, password))
    }

    /// Verify a password against a stored `salt$hash` value
    pub fn verify(password: &str, stored: &str) -> bool {
        let Some((salt_hex, hash_hex)) = stored.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        digest(&salt, password) == hash_hex
    }

    fn digest(salt: &[u8], password: &str) -> String {
        let hash = Sha256::new()
            .chain_update(salt)
            .chain_update(password.as_bytes())
            .finalize();
        hex::encode(hash)
    }
}
