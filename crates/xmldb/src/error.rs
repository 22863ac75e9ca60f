//! Error types for connections and cursors.

use crate::native::Failure;
use thiserror::Error;
use xmldb_ffi::XmlDbResult;

/// Result type for xmldb operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Connection`](crate::Connection) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection has been closed.
    #[error("database is closed")]
    Closed,

    /// The database could not be opened.
    #[error("failed to open database: {message}")]
    Open {
        /// Native result code.
        code: XmlDbResult,
        /// Native error message.
        message: String,
    },

    /// The named document or container does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Native error message.
        message: String,
    },

    /// A document with this name already exists.
    #[error("already exists: {message}")]
    AlreadyExists {
        /// Native error message.
        message: String,
    },

    /// Document content is not well-formed XML.
    #[error("not well-formed: {message}")]
    NotWellFormed {
        /// Native error message.
        message: String,
    },

    /// The query could not be built.
    #[error("invalid query: {message}")]
    Query {
        /// Native error message.
        message: String,
    },

    /// The database was opened read-only.
    #[error("read-only database: {message}")]
    ReadOnly {
        /// Native error message.
        message: String,
    },

    /// Any other native failure.
    #[error("xmldb error (code {code:?}): {message}")]
    Native {
        /// Native result code.
        code: XmlDbResult,
        /// Native error message.
        message: String,
    },

    /// An argument cannot be passed to the native layer.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn open(failure: Failure) -> Self {
        Self::Open {
            code: failure.code,
            message: failure.message,
        }
    }

    pub(crate) fn query(failure: Failure) -> Self {
        Self::Query {
            message: failure.message,
        }
    }

    pub(crate) fn nul_byte(what: &str) -> Self {
        Self::InvalidArgument(format!("{what} contains a NUL byte"))
    }

    /// Returns the native result code behind this error, if there is one.
    #[must_use]
    pub fn code(&self) -> Option<XmlDbResult> {
        match self {
            Self::Closed | Self::InvalidArgument(_) => None,
            Self::Open { code, .. } | Self::Native { code, .. } => Some(*code),
            Self::NotFound { .. } => Some(XmlDbResult::NotFound),
            Self::AlreadyExists { .. } => Some(XmlDbResult::AlreadyExists),
            Self::NotWellFormed { .. } => Some(XmlDbResult::NotWellFormed),
            Self::Query { .. } => Some(XmlDbResult::InvalidQuery),
            Self::ReadOnly { .. } => Some(XmlDbResult::ReadOnly),
        }
    }
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        let Failure { code, message } = failure;
        match code {
            XmlDbResult::NotFound => Self::NotFound { message },
            XmlDbResult::AlreadyExists => Self::AlreadyExists { message },
            XmlDbResult::NotWellFormed => Self::NotWellFormed { message },
            XmlDbResult::InvalidQuery => Self::Query { message },
            XmlDbResult::ReadOnly => Self::ReadOnly { message },
            code => Self::Native { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: XmlDbResult) -> Failure {
        Failure {
            code,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn closed_message() {
        assert_eq!(Error::Closed.to_string(), "database is closed");
    }

    #[test]
    fn native_codes_map_to_variants() {
        assert!(matches!(Error::from(failure(XmlDbResult::NotFound)), Error::NotFound { .. }));
        assert!(matches!(Error::from(failure(XmlDbResult::ReadOnly)), Error::ReadOnly { .. }));
        assert!(matches!(
            Error::from(failure(XmlDbResult::IoError)),
            Error::Native { code: XmlDbResult::IoError, .. }
        ));
    }

    #[test]
    fn codes_round_trip_through_variants() {
        for code in [
            XmlDbResult::NotFound,
            XmlDbResult::AlreadyExists,
            XmlDbResult::NotWellFormed,
            XmlDbResult::InvalidQuery,
            XmlDbResult::ReadOnly,
            XmlDbResult::Locked,
        ] {
            assert_eq!(Error::from(failure(code)).code(), Some(code));
        }
        assert_eq!(Error::Closed.code(), None);
    }

    #[test]
    fn query_and_open_constructors() {
        let err = Error::query(failure(XmlDbResult::Error));
        assert!(matches!(err, Error::Query { ref message } if message == "boom"));

        let err = Error::open(failure(XmlDbResult::Locked));
        assert_eq!(err.code(), Some(XmlDbResult::Locked));
    }
}
