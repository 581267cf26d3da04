//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use sitedb_core::Document;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single document
    pub fn print_document(&self, document: &Document) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", document.id());
                println!("UID:     {}", document.uid());
                for (field, value) in document.fields() {
                    if matches!(field.as_str(), "id" | "uid") {
                        continue;
                    }
                    println!("{:8} {}", format!("{field}:"), render_value(value));
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(document).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", document.id());
            }
        }
    }

    /// Print a list of documents
    pub fn print_documents(&self, documents: &[Document]) {
        match self.format {
            OutputFormat::Human => {
                if documents.is_empty() {
                    println!("No documents found.");
                    return;
                }
                for document in documents {
                    println!(
                        "{} | {} | {}",
                        document.id(),
                        truncate(&summary_field(document), 40),
                        document.get_str("updatedAt").unwrap_or(""),
                    );
                }
                println!("\n{} document(s)", documents.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(documents).unwrap());
            }
            OutputFormat::Quiet => {
                for document in documents {
                    println!("{}", document.id());
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Pick the most recognizable field for one-line listings
fn summary_field(document: &Document) -> String {
    for field in ["title", "name", "email", "url"] {
        if let Some(value) = document.get_str(field) {
            return value.to_string();
        }
    }
    document.uid().to_string()
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncate a string to max length, adding "..." if truncated
///
/// Cuts on a char boundary; titles and names are user data and may be
/// multibyte.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len.saturating_sub(3);
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
