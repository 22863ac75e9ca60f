//! # xmldb container engine
//!
//! Embedded storage for named XML documents.
//!
//! This crate provides:
//! - Containers: persistent, directory-backed document collections
//! - A manager that opens containers and resolves collection aliases
//! - Collection queries in an XPath 1.0 subset
//!
//! A container directory holds a `LOCK` file and a checksummed `DOCUMENTS`
//! snapshot. Writable handles take an exclusive lock on the directory, so a
//! second writable open of the same container fails with
//! [`ContainerError::ContainerLocked`]; read-only opens take no lock and see
//! the last persisted snapshot.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod container;
mod dir;
mod document;
mod error;
mod format;
mod manager;
mod results;
mod stream;
mod xpath;

pub use config::ContainerConfig;
pub use container::Container;
pub use document::Document;
pub use error::{ContainerError, ContainerResult};
pub use manager::Manager;
pub use results::{EvaluationType, QueryContext, Results};
pub use stream::InputStream;
pub use xpath::Query;
