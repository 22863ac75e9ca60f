//! Owned native handles.
//!
//! Each pointer newtype owns exactly one native object and frees it on drop.
//! They are `Send` so they can live inside a `Mutex`; every use happens with
//! that mutex held.

use crate::error::{Error, Result};
use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr::NonNull;
use xmldb_ffi::{
    xmldb_docs_free, xmldb_errcode, xmldb_error, xmldb_errstring, xmldb_free, XmlDbDocs,
    XmlDbHandle, XmlDbResult,
};

/// Error state read back from a database handle.
#[derive(Debug)]
pub(crate) struct Failure {
    pub(crate) code: XmlDbResult,
    pub(crate) message: String,
}

/// An owned `XmlDbHandle`.
pub(crate) struct DbPtr(NonNull<XmlDbHandle>);

// SAFETY: the native database has no thread affinity, and `DbPtr` is only
// used behind the connection mutex.
unsafe impl Send for DbPtr {}

impl DbPtr {
    pub(crate) fn new(raw: *mut XmlDbHandle) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub(crate) fn as_ptr(&self) -> *mut XmlDbHandle {
        self.0.as_ptr()
    }

    /// Returns the failure recorded by the last call, if any.
    pub(crate) fn failure(&self) -> Option<Failure> {
        // SAFETY: the handle is live for as long as `self`.
        unsafe {
            if xmldb_error(self.as_ptr()) == 0 {
                return None;
            }
            Some(Failure {
                code: xmldb_errcode(self.as_ptr()),
                message: copy_str(xmldb_errstring(self.as_ptr())),
            })
        }
    }

    /// Converts the last call's error state into a `Result`.
    pub(crate) fn check(&self) -> Result<()> {
        match self.failure() {
            Some(failure) => Err(Error::from(failure)),
            None => Ok(()),
        }
    }
}

impl Drop for DbPtr {
    fn drop(&mut self) {
        // SAFETY: `DbPtr` is the only owner of the handle.
        unsafe { xmldb_free(self.as_ptr()) };
    }
}

/// An owned `XmlDbDocs` cursor.
pub(crate) struct DocsPtr(NonNull<XmlDbDocs>);

// SAFETY: as for `DbPtr`; only used behind the cursor mutex.
unsafe impl Send for DocsPtr {}

impl DocsPtr {
    pub(crate) fn new(raw: *mut XmlDbDocs) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub(crate) fn as_ptr(&self) -> *mut XmlDbDocs {
        self.0.as_ptr()
    }
}

impl Drop for DocsPtr {
    fn drop(&mut self) {
        // SAFETY: `DocsPtr` is the only owner of the cursor.
        unsafe { xmldb_docs_free(self.as_ptr()) };
    }
}

/// Copies a native string. Null reads as empty.
///
/// # Safety
///
/// `ptr` must be null or point to a valid null-terminated string.
pub(crate) unsafe fn copy_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Converts an argument for the native layer.
pub(crate) fn to_cstring(value: &str, what: &str) -> Result<CString> {
    CString::new(value).map_err(|_| Error::nul_byte(what))
}

/// Converts a path argument. Paths must be UTF-8.
pub(crate) fn path_cstring(path: &Path) -> Result<CString> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::InvalidArgument(format!("path is not UTF-8: {}", path.display())))?;
    to_cstring(path_str, "path")
}
