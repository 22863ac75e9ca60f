//! CLI command implementations.

pub mod documents;
pub mod listing;
pub mod merge;

use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;
use xmldb::Connection;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Opens the database at `path`.
pub fn open(path: &Path) -> Result<Connection, Box<dyn std::error::Error>> {
    let db = Connection::open(path)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(db)
}

/// Prints `value` as JSON, or `text` otherwise.
pub(crate) fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T),
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}
