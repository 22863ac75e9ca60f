//! Single-document commands: size, get, put, put-xml, remove.

use super::{emit, OutputFormat};
use serde::Serialize;
use std::path::PathBuf;
use xmldb::Connection;

/// Document count.
#[derive(Debug, Serialize)]
pub struct SizeResult {
    /// Database path.
    pub path: String,
    /// Number of documents.
    pub documents: u64,
}

/// A fetched document.
#[derive(Debug, Serialize)]
pub struct DocumentResult {
    /// Document name.
    pub name: String,
    /// Document content.
    pub content: String,
}

/// Documents changed by a write command.
#[derive(Debug, Serialize)]
pub struct ChangeResult {
    /// What was done: `stored` or `removed`.
    pub action: &'static str,
    /// Affected document names.
    pub documents: Vec<String>,
}

/// Runs the size command.
pub fn size(db: &Connection, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let result = SizeResult {
        path: db.path().display().to_string(),
        documents: db.size()?,
    };
    emit(format, &result, |r| println!("{}", r.documents))
}

/// Runs the get command.
pub fn get(db: &Connection, name: &str, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let result = DocumentResult {
        name: name.to_string(),
        content: db.get(name)?,
    };
    emit(format, &result, |r| println!("{}", r.content))
}

/// Runs the put command.
pub fn put(
    db: &Connection,
    files: &[PathBuf],
    replace: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = ChangeResult {
        action: "stored",
        documents: store_files(db, files, replace)?,
    };
    emit(format, &result, print_change)
}

/// Runs the put-xml command.
pub fn put_xml(
    db: &Connection,
    name: &str,
    content: &str,
    replace: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    db.put_xml(name, content, replace)?;
    let result = ChangeResult {
        action: "stored",
        documents: vec![name.to_string()],
    };
    emit(format, &result, print_change)
}

/// Runs the remove command.
pub fn remove(db: &Connection, names: &[String], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    for name in names {
        db.remove(name)?;
    }
    let result = ChangeResult {
        action: "removed",
        documents: names.to_vec(),
    };
    emit(format, &result, print_change)
}

/// Stores each file and returns the document names. Stops at the first
/// failure.
fn store_files(db: &Connection, files: &[PathBuf], replace: bool) -> xmldb::Result<Vec<String>> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        db.put_file(file, replace)?;
        tracing::debug!(file = %file.display(), "stored");
        stored.push(file.display().to_string());
    }
    Ok(stored)
}

fn print_change(result: &ChangeResult) {
    for name in &result.documents {
        println!("{} {}", result.action, name);
    }
}
