//! Error types for container operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Errors that can occur in container operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No container exists at the given path.
    #[error("container not found: {}", path.display())]
    ContainerNotFound {
        /// Path that was opened.
        path: PathBuf,
    },

    /// A container already exists at the given path.
    #[error("container already exists: {}", path.display())]
    ContainerExists {
        /// Path that was created.
        path: PathBuf,
    },

    /// Another handle holds the write lock.
    #[error("container locked: another handle has write access to {}", path.display())]
    ContainerLocked {
        /// Path of the locked container.
        path: PathBuf,
    },

    /// Write attempted on a read-only container.
    #[error("container is read-only: {}", path.display())]
    ReadOnly {
        /// Path of the container.
        path: PathBuf,
    },

    /// Document not found.
    #[error("document not found: {name}")]
    DocumentNotFound {
        /// The document name.
        name: String,
    },

    /// A document with this name already exists.
    #[error("document already exists: {name}")]
    DocumentExists {
        /// The document name.
        name: String,
    },

    /// Document content is not well-formed XML.
    #[error("document {name} is not well-formed: {message}")]
    NotWellFormed {
        /// The document name.
        name: String,
        /// Parser message.
        message: String,
    },

    /// Document name is not acceptable.
    #[error("invalid document name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Document name or content does not fit a snapshot length prefix.
    #[error("document {name} is too large to store: {len} bytes")]
    DocumentTooLarge {
        /// The document name.
        name: String,
        /// Length of the oversized field in bytes.
        len: usize,
    },

    /// Query expression could not be compiled.
    #[error("query error: {message}")]
    Query {
        /// Description of the problem.
        message: String,
    },

    /// No container is bound to the alias used by a query.
    #[error("unknown collection: {alias}")]
    UnknownCollection {
        /// The alias that was looked up.
        alias: String,
    },

    /// Stored snapshot is invalid.
    #[error("container corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

impl ContainerError {
    /// Creates a container-not-found error.
    pub fn container_not_found(path: &Path) -> Self {
        Self::ContainerNotFound {
            path: path.to_path_buf(),
        }
    }

    /// Creates a read-only error.
    pub fn read_only(path: &Path) -> Self {
        Self::ReadOnly {
            path: path.to_path_buf(),
        }
    }

    /// Creates a document-not-found error.
    pub fn document_not_found(name: impl Into<String>) -> Self {
        Self::DocumentNotFound { name: name.into() }
    }

    /// Creates a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}
