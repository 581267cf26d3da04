//! Status command handler

use anyhow::Result;
use sitedb_core::{BackendKind, Config, SessionManager};

use crate::output::{Output, OutputFormat};

/// Show backend configuration and session state
pub fn show(config: &Config, sessions: &SessionManager, output: &Output) -> Result<()> {
    let user = sessions.current_user()?;
    let email = user
        .as_ref()
        .and_then(|u| u.get_str("email"))
        .map(str::to_string);

    match output.format {
        OutputFormat::Human => {
            match config.backend_kind() {
                BackendKind::Remote => {
                    println!(
                        "Backend:  remote ({}/{} @ {})",
                        config.owner, config.repo, config.branch
                    );
                    println!("Path:     {}", config.base_path);
                }
                BackendKind::Local => {
                    println!("Backend:  local ({})", config.collections_dir().display());
                }
            }
            println!("Data dir: {}", config.data_dir.display());
            println!("Cache:    {} ms", config.cache_ttl_ms);
            match email {
                Some(email) => println!("User:     {}", email),
                None => println!("User:     (not logged in)"),
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": config.backend_kind(),
                    "owner": config.owner,
                    "repo": config.repo,
                    "branch": config.branch,
                    "base_path": config.base_path,
                    "data_dir": config.data_dir.display().to_string(),
                    "cache_ttl_ms": config.cache_ttl_ms,
                    "user": email,
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(email) = email {
                println!("{}", email);
            }
        }
    }

    Ok(())
}
