//! sitedb CLI
//!
//! Command-line interface for the sitedb document store.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sitedb_core::{Config, ResilientStore};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "sitedb")]
#[command(about = "Collection-backed document store for website content")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a collection or show one document
    #[command(alias = "ls")]
    Get {
        /// Collection name
        collection: String,
        /// Document id or uid (omit to list the whole collection)
        key: Option<String>,
    },
    /// Insert a document
    #[command(alias = "add")]
    Insert {
        /// Collection name
        collection: String,
        /// Document fields as a JSON object
        fields: String,
    },
    /// Merge updates into an existing document
    Update {
        /// Collection name
        collection: String,
        /// Document id or uid
        key: String,
        /// Fields to change, as a JSON object
        fields: String,
    },
    /// Delete a document
    #[command(alias = "rm")]
    Delete {
        /// Collection name
        collection: String,
        /// Document id or uid
        key: String,
    },
    /// Log in and persist a session
    Login {
        /// Account email
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        /// Account email
        email: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show the logged-in user
    Whoami,
    /// Drop the persisted session
    Logout,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show backend and session status
    Status,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (owner, repo, branch, token, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work without a store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
        };
    }

    let config = Config::load()?;
    let store = Arc::new(ResilientStore::from_config(&config)?);
    let sessions = commands::auth::manager(store.clone(), &config);

    match cli.command {
        Commands::Get { collection, key } => {
            commands::collection::get(&store, &collection, key, &output).await
        }
        Commands::Insert { collection, fields } => {
            commands::collection::insert(&store, &collection, &fields, &output).await
        }
        Commands::Update {
            collection,
            key,
            fields,
        } => commands::collection::update(&store, &collection, &key, &fields, &output).await,
        Commands::Delete { collection, key } => {
            commands::collection::delete(&store, &collection, &key, &output).await
        }
        Commands::Login { email, password } => {
            commands::auth::login(&sessions, email, password, &output).await
        }
        Commands::Register {
            email,
            password,
            name,
        } => commands::auth::register(&sessions, email, password, name, &output).await,
        Commands::Whoami => commands::auth::whoami(&sessions, &output),
        Commands::Logout => commands::auth::logout(&sessions, &output),
        Commands::Status => commands::status::show(&config, &sessions, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Log to stderr, filtered by SITEDB_LOG (defaults to warnings only)
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SITEDB_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
