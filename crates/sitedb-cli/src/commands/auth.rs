//! Auth command handlers

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use serde_json::Value;
use sitedb_core::{Config, Fields, ResilientStore, SessionManager};

use crate::output::{Output, OutputFormat};

/// Build a session manager from configuration
pub fn manager(store: Arc<ResilientStore>, config: &Config) -> SessionManager {
    SessionManager::new(store, config.session_path())
        .with_session_ttl(Duration::hours(config.auth.session_ttl_hours))
        .with_email_verification(config.auth.require_email_verification)
}

/// Log in and persist the session
pub async fn login(
    sessions: &SessionManager,
    email: String,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = resolve_password(password)?;
    let token = sessions
        .login(&email, &password)
        .await
        .context("Login failed")?;

    match output.format {
        OutputFormat::Human => println!("✓ Logged in as {}", email),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"email": email, "token": token}));
        }
        OutputFormat::Quiet => println!("{}", token),
    }
    Ok(())
}

/// Create an account
pub async fn register(
    sessions: &SessionManager,
    email: String,
    password: Option<String>,
    name: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = resolve_password(password)?;

    let mut profile = Fields::new();
    if let Some(name) = name {
        profile.insert("name".to_string(), Value::String(name));
    }

    let user = sessions
        .register(&email, &password, profile)
        .await
        .context("Registration failed")?;

    output.success(&format!("Registered {}", email));
    output.print_document(&user);
    Ok(())
}

/// Show the logged-in user
pub fn whoami(sessions: &SessionManager, output: &Output) -> Result<()> {
    match sessions.current_user()? {
        Some(user) => output.print_document(&user),
        None => output.message("Not logged in."),
    }
    Ok(())
}

/// Drop the persisted session
pub fn logout(sessions: &SessionManager, output: &Output) -> Result<()> {
    sessions.logout()?;
    output.success("Logged out");
    Ok(())
}

/// Use the flag value when given, otherwise prompt on stdin
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_string())
}
