//! # xmldb Testkit
//!
//! Test utilities for xmldb.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Sample documents
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xmldb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         db.put_xml("a", "<a/>", false).unwrap();
//!         assert_eq!(db.size().unwrap(), 1);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
