//! Error codes and per-handle error state.

use std::any::Any;
use std::ffi::{c_char, CString};
use thiserror::Error;
use xmldb_container::ContainerError;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlDbResult {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Document or container not found.
    NotFound = 3,
    /// Document or container already exists.
    AlreadyExists = 4,
    /// Database is closed.
    Closed = 5,
    /// Container is locked by another writer.
    Locked = 6,
    /// Corruption detected.
    Corruption = 7,
    /// I/O error.
    IoError = 8,
    /// Document is not well-formed XML.
    NotWellFormed = 9,
    /// Query expression is invalid.
    InvalidQuery = 10,
    /// Write on a read-only container.
    ReadOnly = 11,
    /// Null pointer.
    NullPointer = 12,
    /// The engine panicked.
    Panic = 13,
    /// The container alias could not be bound.
    AliasUnavailable = 14,
}

impl XmlDbResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == XmlDbResult::Ok
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        self != XmlDbResult::Ok
    }
}

/// Error code type for C compatibility.
pub type ErrorCode = i32;

impl From<XmlDbResult> for ErrorCode {
    fn from(result: XmlDbResult) -> Self {
        result as ErrorCode
    }
}

impl From<ErrorCode> for XmlDbResult {
    fn from(code: ErrorCode) -> Self {
        match code {
            0 => XmlDbResult::Ok,
            2 => XmlDbResult::InvalidArgument,
            3 => XmlDbResult::NotFound,
            4 => XmlDbResult::AlreadyExists,
            5 => XmlDbResult::Closed,
            6 => XmlDbResult::Locked,
            7 => XmlDbResult::Corruption,
            8 => XmlDbResult::IoError,
            9 => XmlDbResult::NotWellFormed,
            10 => XmlDbResult::InvalidQuery,
            11 => XmlDbResult::ReadOnly,
            12 => XmlDbResult::NullPointer,
            13 => XmlDbResult::Panic,
            14 => XmlDbResult::AliasUnavailable,
            _ => XmlDbResult::Error,
        }
    }
}

impl From<&ContainerError> for XmlDbResult {
    fn from(err: &ContainerError) -> Self {
        match err {
            ContainerError::Io(_) => XmlDbResult::IoError,
            ContainerError::ContainerNotFound { .. } | ContainerError::DocumentNotFound { .. } => {
                XmlDbResult::NotFound
            }
            ContainerError::ContainerExists { .. } | ContainerError::DocumentExists { .. } => {
                XmlDbResult::AlreadyExists
            }
            ContainerError::ContainerLocked { .. } => XmlDbResult::Locked,
            ContainerError::ReadOnly { .. } => XmlDbResult::ReadOnly,
            ContainerError::NotWellFormed { .. } => XmlDbResult::NotWellFormed,
            ContainerError::InvalidName { .. } | ContainerError::DocumentTooLarge { .. } => {
                XmlDbResult::InvalidArgument
            }
            ContainerError::Query { .. } | ContainerError::UnknownCollection { .. } => {
                XmlDbResult::InvalidQuery
            }
            ContainerError::Corrupted { .. } => XmlDbResult::Corruption,
        }
    }
}

/// A failed operation, before it is recorded on a handle.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct Failure {
    pub(crate) code: XmlDbResult,
    pub(crate) message: String,
}

impl Failure {
    pub(crate) fn new(code: XmlDbResult, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(XmlDbResult::InvalidArgument, message)
    }

    pub(crate) fn panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::new(XmlDbResult::Panic, format!("internal error: {detail}"))
    }
}

impl From<ContainerError> for Failure {
    fn from(err: ContainerError) -> Self {
        Self::new(XmlDbResult::from(&err), err.to_string())
    }
}

pub(crate) type FfiResult<T> = Result<T, Failure>;

/// Sticky error flag, code and message attached to a database handle.
///
/// Cleared at the start of every operation; left populated when the
/// operation fails.
#[derive(Debug)]
pub(crate) struct ErrorState {
    failed: bool,
    code: XmlDbResult,
    message: CString,
}

impl Default for ErrorState {
    fn default() -> Self {
        Self {
            failed: false,
            code: XmlDbResult::Ok,
            message: CString::default(),
        }
    }
}

impl ErrorState {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn set(&mut self, failure: Failure) {
        self.failed = true;
        self.code = failure.code;
        self.message = c_string(failure.message);
    }

    pub(crate) fn failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn code(&self) -> XmlDbResult {
        self.code
    }

    pub(crate) fn message_ptr(&self) -> *const c_char {
        self.message.as_ptr()
    }
}

/// Converts to a C string, replacing interior NULs.
pub(crate) fn c_string(value: impl Into<String>) -> CString {
    let value = value.into();
    match CString::new(value) {
        Ok(s) => s,
        Err(e) => {
            let bytes: Vec<u8> = e
                .into_vec()
                .into_iter()
                .map(|b| if b == 0 { b'?' } else { b })
                .collect();
            CString::new(bytes).unwrap_or_default()
        }
    }
}
