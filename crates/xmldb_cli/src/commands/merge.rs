//! Merge command.

use super::{emit, OutputFormat};
use serde::Serialize;
use std::path::Path;
use xmldb::Connection;

/// Outcome of a merge.
#[derive(Debug, Serialize)]
pub struct MergeResult {
    /// Source database path.
    pub source: String,
    /// Documents before the merge.
    pub before: u64,
    /// Documents after the merge.
    pub after: u64,
}

impl MergeResult {
    /// Number of documents the merge added.
    pub fn added(&self) -> u64 {
        self.after.saturating_sub(self.before)
    }
}

/// Runs the merge command.
pub fn run(db: &Connection, source: &Path, replace: bool, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let result = merge(db, source, replace)?;
    emit(format, &result, |r| {
        println!("Merged {} into {}", r.source, db.path().display());
        println!("  Added:  {}", r.added());
        println!("  Total:  {}", r.after);
    })
}

fn merge(db: &Connection, source: &Path, replace: bool) -> xmldb::Result<MergeResult> {
    let before = db.size()?;
    db.merge(source, replace)?;
    let after = db.size()?;
    tracing::info!(source = %source.display(), added = after.saturating_sub(before), "merge complete");
    Ok(MergeResult {
        source: source.display().to_string(),
        before,
        after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmldb_testkit::{scenarios, TestDatabase, LIBRARY};

    #[test]
    fn merge_counts_added_documents() {
        let test_db = TestDatabase::new();
        test_db.put_xml("local.xml", "<local/>", false).unwrap();
        let source = scenarios::source_database(test_db.dir(), "source", LIBRARY);

        let result = merge(&test_db.db, &source, false).unwrap();
        assert_eq!(result.before, 1);
        assert_eq!(result.after, 1 + LIBRARY.len() as u64);
        assert_eq!(result.added(), LIBRARY.len() as u64);
    }

    #[test]
    fn merge_with_replace_adds_nothing_new() {
        let test_db = TestDatabase::with_documents(LIBRARY);
        let source = scenarios::source_database(test_db.dir(), "source", LIBRARY);

        let result = merge(&test_db.db, &source, true).unwrap();
        assert_eq!(result.added(), 0);
    }

    #[test]
    fn merge_from_missing_source_fails() {
        let test_db = TestDatabase::new();
        assert!(merge(&test_db.db, &test_db.dir().join("missing"), false).is_err());
    }
}
