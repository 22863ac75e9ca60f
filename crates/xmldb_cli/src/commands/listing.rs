//! List and query commands.

use super::{emit, OutputFormat};
use serde::Serialize;
use xmldb::{Connection, Documents};

/// A listed document.
#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    /// Document name.
    pub name: String,
    /// Document content, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Runs the list command.
pub fn list(db: &Connection, with_content: bool, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let entries = collect(&db.all()?, with_content);
    emit(format, &entries, |entries| print_entries(entries))
}

/// Runs the query command.
pub fn query(
    db: &Connection,
    expr: &str,
    with_content: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = collect(&db.query(expr)?, with_content);
    tracing::debug!(expr, matched = entries.len(), "query finished");
    emit(format, &entries, |entries| print_entries(entries))
}

/// Drains a cursor. Content is only fetched when asked for.
pub(crate) fn collect(docs: &Documents, with_content: bool) -> Vec<DocumentEntry> {
    let mut entries = Vec::new();
    while docs.next() {
        entries.push(DocumentEntry {
            name: docs.name(),
            content: with_content.then(|| docs.content()),
        });
    }
    entries
}

fn print_entries(entries: &[DocumentEntry]) {
    for entry in entries {
        match &entry.content {
            Some(content) => println!("{}\n{}\n", entry.name, content),
            None => println!("{}", entry.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmldb_testkit::{TestDatabase, LIBRARY};

    #[test]
    fn collect_names_only() {
        let test_db = TestDatabase::with_documents(LIBRARY);
        let entries = collect(&test_db.all().unwrap(), false);
        assert_eq!(entries.len(), LIBRARY.len());
        assert!(entries.iter().all(|e| e.content.is_none()));
    }

    #[test]
    fn collect_query_with_content() {
        let test_db = TestDatabase::with_documents(LIBRARY);
        let entries = collect(&test_db.query("/book[@lang = 'pl']").unwrap(), true);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "solaris.xml");
        assert_eq!(entries[0].content.as_deref(), Some(LIBRARY[1].1));
    }

    #[test]
    fn entries_serialize_without_missing_content() {
        let entry = DocumentEntry {
            name: "a".to_string(),
            content: None,
        };
        assert_eq!(serde_json::to_string(&entry).unwrap(), r#"{"name":"a"}"#);
    }
}
