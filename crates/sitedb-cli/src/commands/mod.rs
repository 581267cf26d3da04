//! CLI command handlers

use anyhow::{anyhow, Context, Result};
use sitedb_core::Fields;

pub mod auth;
pub mod collection;
pub mod config;
pub mod status;

/// Parse a CLI argument into a document field map
pub(crate) fn parse_fields(json: &str) -> Result<Fields> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Fields must be valid JSON")?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| anyhow!("Fields must be a JSON object, e.g. '{{\"title\": \"Hello\"}}'"))
}
