//! Documents and identifier generation
//!
//! A document is one record inside a collection: a JSON object carrying the
//! system fields `id`, `uid`, `createdAt` and `updatedAt` alongside whatever
//! application fields the collection's schema shapes. Collections are stored
//! as plain JSON arrays, so the document type is a thin wrapper over
//! `serde_json::Map` rather than a fixed struct.
//!
//! Identifiers are time-prefixed random strings: `id` is short and unique
//! within a collection, `uid` is longer and globally unique by convention.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field map backing a document
pub type Fields = Map<String, Value>;

/// System field: per-collection identifier
pub const FIELD_ID: &str = "id";
/// System field: globally unique identifier
pub const FIELD_UID: &str = "uid";
/// System field: creation timestamp (RFC 3339)
pub const FIELD_CREATED_AT: &str = "createdAt";
/// System field: last-update timestamp (RFC 3339)
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// One record in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Fields);

impl Document {
    /// Create a document from validated application fields
    ///
    /// Stamps `id`, `uid`, `createdAt` and `updatedAt`. Any system fields
    /// present in the input are overwritten; documents are only ever minted
    /// here, never trusted from caller input.
    pub fn new(fields: Fields) -> Self {
        let now = Utc::now().to_rfc3339();
        let mut fields = fields;
        fields.insert(FIELD_ID.to_string(), Value::String(generate_id()));
        fields.insert(FIELD_UID.to_string(), Value::String(generate_uid()));
        fields.insert(FIELD_CREATED_AT.to_string(), Value::String(now.clone()));
        fields.insert(FIELD_UPDATED_AT.to_string(), Value::String(now));
        Self(fields)
    }

    /// Wrap raw fields without stamping system fields (for loading from storage)
    pub fn from_fields(fields: Fields) -> Self {
        Self(fields)
    }

    /// The per-collection identifier
    pub fn id(&self) -> &str {
        self.get_str(FIELD_ID).unwrap_or("")
    }

    /// The globally unique identifier
    pub fn uid(&self) -> &str {
        self.get_str(FIELD_UID).unwrap_or("")
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field as a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Set a field value
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Remove a field, returning its previous value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Whether this document's `id` or `uid` equals the given key
    pub fn matches_key(&self, key: &str) -> bool {
        self.id() == key || self.uid() == key
    }

    /// Shallow-merge updates over this document and refresh `updatedAt`
    ///
    /// Unspecified fields retain their prior values; specified fields are
    /// replaced wholesale, nested objects are not merged.
    pub fn merge(&mut self, updates: &Fields) {
        for (field, value) in updates {
            self.0.insert(field.clone(), value.clone());
        }
        self.0.insert(
            FIELD_UPDATED_AT.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }

    /// Borrow the underlying field map
    pub fn fields(&self) -> &Fields {
        &self.0
    }

    /// Consume into the underlying field map
    pub fn into_fields(self) -> Fields {
        self.0
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a short identifier, unique within a collection
///
/// Millisecond timestamp in base36 plus 4 random characters.
pub fn generate_id() -> String {
    format!("{}{}", base36_now(), random_suffix(4))
}

/// Generate a long identifier, globally unique by convention
///
/// Millisecond timestamp in base36 plus 12 random characters.
pub fn generate_uid() -> String {
    format!("{}{}", base36_now(), random_suffix(12))
}

fn base36_now() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    base36(millis)
}

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ID_ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ascii")
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
