//! Schema registry
//!
//! Static per-collection definitions: required fields, declared field types
//! and default values. Schemas shape documents at insert time only; there is
//! no runtime mutation and no migration story.
//!
//! Collections without a registered schema are still usable: lookup returns
//! an explicit `Unvalidated` variant and the input passes through unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::Fields;
use crate::error::{Result, StoreError};

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// Schema for a single collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Fields every inserted document must carry
    #[serde(default)]
    pub required: Vec<String>,
    /// Declared field types, checked advisorily at insert time
    #[serde(default)]
    pub types: HashMap<String, FieldType>,
    /// Values filled in for fields the caller did not supply
    #[serde(default)]
    pub defaults: Fields,
}

/// Result of looking up a collection's schema
#[derive(Debug)]
pub enum Lookup<'a> {
    /// A schema is registered for the collection
    Registered(&'a CollectionSchema),
    /// No schema registered; documents pass through unvalidated
    Unvalidated,
}

/// Registry of per-collection schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, CollectionSchema>,
}

impl SchemaRegistry {
    /// Create a registry from per-collection definitions
    pub fn new(schemas: HashMap<String, CollectionSchema>) -> Self {
        Self { schemas }
    }

    /// Look up the schema for a collection
    pub fn lookup(&self, collection: &str) -> Lookup<'_> {
        match self.schemas.get(collection) {
            Some(schema) => Lookup::Registered(schema),
            None => Lookup::Unvalidated,
        }
    }

    /// Validate and shape an insert's fields
    ///
    /// Starts from the schema defaults; fails fast on the first missing
    /// required field (null counts as missing, nothing is partially applied);
    /// then overlays every other non-null input field, declared or not.
    /// Type mismatches against `types` are logged, not rejected.
    pub fn validate(&self, collection: &str, input: &Fields) -> Result<Fields> {
        let schema = match self.lookup(collection) {
            Lookup::Registered(schema) => schema,
            Lookup::Unvalidated => {
                debug!(collection, "no schema registered, skipping validation");
                return Ok(input.clone());
            }
        };

        let mut shaped = schema.defaults.clone();

        for field in &schema.required {
            match input.get(field) {
                None | Some(Value::Null) => {
                    return Err(StoreError::Validation {
                        collection: collection.to_string(),
                        field: field.clone(),
                    });
                }
                Some(value) => {
                    shaped.insert(field.clone(), value.clone());
                }
            }
        }

        for (field, value) in input {
            if !value.is_null() {
                shaped.insert(field.clone(), value.clone());
            }
        }

        for (field, field_type) in &schema.types {
            if let Some(value) = shaped.get(field) {
                if !field_type.matches(value) {
                    warn!(
                        collection,
                        field,
                        expected = ?field_type,
                        "field value does not match declared type"
                    );
                }
            }
        }

        Ok(shaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().unwrap().clone()
    }

    fn posts_schema() -> CollectionSchema {
        CollectionSchema {
            required: vec!["websiteId".to_string(), "title".to_string()],
            types: HashMap::from([
                ("title".to_string(), FieldType::String),
                ("tags".to_string(), FieldType::Array),
            ]),
            defaults: fields(json!({"status": "published", "tags": []})),
        }
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(HashMap::from([("posts".to_string(), posts_schema())]))
    }

    #[test]
    fn test_missing_required_field_fails() {
        let err = registry()
            .validate("posts", &fields(json!({"title": "Hi"})))
            .unwrap_err();

        match err {
            StoreError::Validation { collection, field } => {
                assert_eq!(collection, "posts");
                assert_eq!(field, "websiteId");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_null_required_field_counts_as_missing() {
        let err = registry()
            .validate(
                "posts",
                &fields(json!({"websiteId": null, "title": "Hi"})),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[test]
    fn test_defaults_fill_unsupplied_fields() {
        let shaped = registry()
            .validate("posts", &fields(json!({"websiteId": "w1", "title": "Hi"})))
            .unwrap();

        assert_eq!(shaped.get("websiteId"), Some(&json!("w1")));
        assert_eq!(shaped.get("title"), Some(&json!("Hi")));
        assert_eq!(shaped.get("status"), Some(&json!("published")));
        assert_eq!(shaped.get("tags"), Some(&json!([])));
    }

    #[test]
    fn test_supplied_values_override_defaults() {
        let shaped = registry()
            .validate(
                "posts",
                &fields(json!({"websiteId": "w1", "title": "Hi", "status": "draft"})),
            )
            .unwrap();
        assert_eq!(shaped.get("status"), Some(&json!("draft")));
    }

    #[test]
    fn test_undeclared_fields_pass_through() {
        let shaped = registry()
            .validate(
                "posts",
                &fields(json!({"websiteId": "w1", "title": "Hi", "custom": 42})),
            )
            .unwrap();
        assert_eq!(shaped.get("custom"), Some(&json!(42)));
    }

    #[test]
    fn test_null_optional_fields_are_dropped() {
        let shaped = registry()
            .validate(
                "posts",
                &fields(json!({"websiteId": "w1", "title": "Hi", "summary": null})),
            )
            .unwrap();
        assert!(!shaped.contains_key("summary"));
    }

    #[test]
    fn test_unregistered_collection_passes_through() {
        let input = fields(json!({"anything": "goes"}));
        let shaped = registry().validate("unknown", &input).unwrap();
        assert_eq!(shaped, input);
        assert!(matches!(registry().lookup("unknown"), Lookup::Unvalidated));
    }

    #[test]
    fn test_type_mismatch_is_not_rejected() {
        // Declared types are advisory; a mismatch logs but still validates.
        let shaped = registry()
            .validate(
                "posts",
                &fields(json!({"websiteId": "w1", "title": 7})),
            )
            .unwrap();
        assert_eq!(shaped.get("title"), Some(&json!(7)));
    }

    #[test]
    fn test_schema_deserializes_from_config_shape() {
        let schema: CollectionSchema = serde_json::from_value(json!({
            "required": ["email"],
            "types": {"email": "string", "verified": "boolean"},
            "defaults": {"role": "user", "verified": false}
        }))
        .unwrap();

        assert_eq!(schema.required, vec!["email"]);
        assert_eq!(schema.types.get("verified"), Some(&FieldType::Boolean));
        assert_eq!(schema.defaults.get("role"), Some(&json!("user")));
    }
}
