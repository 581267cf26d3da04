//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use sitedb_core::{BackendKind, Config};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load()?;

    match output.format {
        OutputFormat::Human => {
            println!("Config file: {}", Config::config_file_path().display());
            println!();
            println!("owner:        {}", display_or_unset(&config.owner));
            println!("repo:         {}", display_or_unset(&config.repo));
            println!("branch:       {}", config.branch);
            println!("base_path:    {}", config.base_path);
            println!("media_path:   {}", config.media_path);
            println!(
                "token:        {}",
                if config.token.is_empty() {
                    "(not set)"
                } else {
                    "(set)"
                }
            );
            println!("cache_ttl_ms: {}", config.cache_ttl_ms);
            println!("data_dir:     {}", config.data_dir.display());
            println!("backend:      {:?}", config.backend_kind());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "config_file": Config::config_file_path().display().to_string(),
                    "owner": config.owner,
                    "repo": config.repo,
                    "branch": config.branch,
                    "base_path": config.base_path,
                    "media_path": config.media_path,
                    "token_set": !config.token.is_empty(),
                    "cache_ttl_ms": config.cache_ttl_ms,
                    "data_dir": config.data_dir.display().to_string(),
                    "backend": config.backend_kind(),
                })
            );
        }
        OutputFormat::Quiet => {}
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load()?;

    match key.as_str() {
        "owner" => config.owner = value.clone(),
        "repo" => config.repo = value.clone(),
        "branch" => config.branch = value.clone(),
        "base_path" => config.base_path = value.clone(),
        "media_path" => config.media_path = value.clone(),
        "token" => config.token = value.clone(),
        "cache_ttl_ms" => {
            config.cache_ttl_ms = value
                .parse()
                .context("cache_ttl_ms must be a number of milliseconds")?;
        }
        "data_dir" => config.data_dir = PathBuf::from(&value),
        "backend" => {
            config.backend = Some(match value.as_str() {
                "remote" => BackendKind::Remote,
                "local" => BackendKind::Local,
                other => bail!("Invalid backend '{}'. Valid values: remote, local", other),
            });
        }
        _ => bail!(
            "Unknown config key '{}'. Valid keys: owner, repo, branch, base_path, \
             media_path, token, cache_ttl_ms, data_dir, backend",
            key
        ),
    }

    config.save()?;
    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
