//! Collection command handlers

use anyhow::{anyhow, Context, Result};
use sitedb_core::ResilientStore;

use crate::commands::parse_fields;
use crate::output::Output;

/// List a collection, or show the document matching `key`
pub async fn get(
    store: &ResilientStore,
    collection: &str,
    key: Option<String>,
    output: &Output,
) -> Result<()> {
    let documents = store.get(collection).await;

    match key {
        Some(key) => {
            let document = documents
                .iter()
                .find(|doc| doc.matches_key(&key))
                .ok_or_else(|| anyhow!("Document not found in {}: {}", collection, key))?;
            output.print_document(document);
        }
        None => output.print_documents(&documents),
    }

    Ok(())
}

/// Insert a document from a JSON object argument
pub async fn insert(
    store: &ResilientStore,
    collection: &str,
    json: &str,
    output: &Output,
) -> Result<()> {
    let fields = parse_fields(json)?;
    let document = store
        .insert(collection, fields)
        .await
        .with_context(|| format!("Failed to insert into {}", collection))?;

    output.success(&format!("Inserted into {}", collection));
    output.print_document(&document);
    Ok(())
}

/// Merge updates into the document matching `key`
pub async fn update(
    store: &ResilientStore,
    collection: &str,
    key: &str,
    json: &str,
    output: &Output,
) -> Result<()> {
    let updates = parse_fields(json)?;
    let document = store
        .update(collection, key, updates)
        .await
        .with_context(|| format!("Failed to update {} in {}", key, collection))?;

    output.success(&format!("Updated {}", document.id()));
    output.print_document(&document);
    Ok(())
}

/// Delete the document matching `key`
pub async fn delete(
    store: &ResilientStore,
    collection: &str,
    key: &str,
    output: &Output,
) -> Result<()> {
    store
        .delete(collection, key)
        .await
        .with_context(|| format!("Failed to delete {} from {}", key, collection))?;

    output.success(&format!("Deleted {} from {}", key, collection));
    Ok(())
}
