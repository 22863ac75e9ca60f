//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up scratch databases
//! and common test scenarios.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xmldb::Connection;

/// A small library catalogue used across query tests.
pub const LIBRARY: &[(&str, &str)] = &[
    (
        "dune.xml",
        "<book lang='en' year='1965'><title>Dune</title><author>Frank Herbert</author><price>9.99</price></book>",
    ),
    (
        "solaris.xml",
        "<book lang='pl' year='1961'><title>Solaris</title><author>Stanislaw Lem</author><price>12.50</price></book>",
    ),
    (
        "neuromancer.xml",
        "<book lang='en' year='1984'><title>Neuromancer</title><author>William Gibson</author><price>8.00</price></book>",
    ),
    (
        "catalogue.xml",
        "<catalogue><entry ref='dune.xml'/><entry ref='solaris.xml'/><entry ref='neuromancer.xml'/></catalogue>",
    ),
];

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The connection.
    pub db: Connection,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Opens a new, empty database in a temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Connection::open(temp_dir.path().join("db")).expect("Failed to open database");
        Self { db, temp_dir }
    }

    /// Opens a new database holding `documents`.
    pub fn with_documents(documents: &[(&str, &str)]) -> Self {
        let test_db = Self::new();
        for (name, content) in documents {
            test_db
                .db
                .put_xml(name, content, false)
                .expect("Failed to store document");
        }
        test_db
    }

    /// Returns the database path.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("db")
    }

    /// Returns the scratch directory, for sibling databases and input files.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary database.
///
/// # Example
///
/// ```rust,ignore
/// use xmldb_testkit::with_temp_db;
///
/// #[test]
/// fn my_test() {
///     with_temp_db(|db| {
///         db.put_xml("a", "<a/>", false).unwrap();
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Connection) -> R,
{
    let test_db = TestDatabase::new();
    f(&test_db.db)
}

/// Writes `content` to `dir/name` and returns the path.
pub fn write_xml_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write input file");
    path
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database with `count` numbered documents `doc-0`, `doc-1`, ...
    pub fn populated_database(count: usize) -> TestDatabase {
        let test_db = TestDatabase::new();
        for i in 0..count {
            test_db
                .db
                .put_xml(&format!("doc-{i}"), &format!("<doc index='{i}'/>"), false)
                .expect("Failed to store document");
        }
        test_db
    }

    /// Creates a closed database at `dir/name` holding `documents`, for use
    /// as a merge source.
    pub fn source_database(dir: &Path, name: &str, documents: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        let db = Connection::open(&path).expect("Failed to open source database");
        for (doc, content) in documents {
            db.put_xml(doc, content, false).expect("Failed to store document");
        }
        db.close();
        path
    }
}
