//! Database FFI functions.

use crate::error::{c_string, ErrorState, Failure, FfiResult, XmlDbResult};
use crate::iterator::NativeDocs;
use crate::types::{XmlDbDocs, XmlDbHandle, ALIAS};
use std::ffi::{c_char, c_int, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::ptr;
use xmldb_container::{Container, ContainerConfig, EvaluationType, Manager, Results};

/// Internal state behind an `XmlDbHandle`.
struct NativeDb {
    manager: Manager,
    container: Option<Container>,
    error: ErrorState,
    /// Backing storage for the last string returned by `xmldb_get`.
    result: CString,
}

impl NativeDb {
    fn new() -> Self {
        Self {
            manager: Manager::new(),
            container: None,
            error: ErrorState::default(),
            result: CString::default(),
        }
    }

    fn container(&self) -> FfiResult<&Container> {
        self.container
            .as_ref()
            .ok_or_else(|| Failure::new(XmlDbResult::Closed, "no container is open"))
    }

    /// Read-write first, then read-only. The error state reflects the last
    /// attempt.
    fn open_with_fallback(&mut self, path: &Path) {
        let attempts = [
            ContainerConfig::new().create_if_missing(true),
            ContainerConfig::new().read_only(true),
        ];

        for config in attempts {
            let read_only = config.read_only;
            self.error.clear();
            match self.try_open(path, config) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), read_only, "opened database");
                    return;
                }
                Err(failure) => {
                    tracing::debug!(
                        path = %path.display(),
                        read_only,
                        error = %failure,
                        "open attempt failed"
                    );
                    self.error.set(failure);
                }
            }
        }
    }

    fn try_open(&mut self, path: &Path, config: ContainerConfig) -> FfiResult<()> {
        let container = self.manager.open_container(path, config)?;
        // A conflicting binding belongs to another container and stays.
        if !self.manager.add_alias(ALIAS, &container) {
            drop(container);
            return Err(Failure::new(
                XmlDbResult::AliasUnavailable,
                format!("Unable to add alias \"{ALIAS}\""),
            ));
        }
        self.container = Some(container);
        Ok(())
    }
}

/// Runs `op` against the handle's state with the error state cleared first.
/// Failures and panics are recorded on the handle and `fallback` is returned.
unsafe fn with_db<T>(
    handle: *mut XmlDbHandle,
    fallback: T,
    op: impl FnOnce(&mut NativeDb) -> FfiResult<T>,
) -> T {
    let Some(db) = (handle as *mut NativeDb).as_mut() else {
        return fallback;
    };

    db.error.clear();
    match panic::catch_unwind(AssertUnwindSafe(|| op(&mut *db))) {
        Ok(Ok(value)) => value,
        Ok(Err(failure)) => {
            db.error.set(failure);
            fallback
        }
        Err(payload) => {
            let failure = Failure::panic(&*payload);
            tracing::error!(error = %failure, "database operation panicked");
            db.error.set(failure);
            fallback
        }
    }
}

/// Borrows a C string argument as UTF-8.
pub(crate) unsafe fn str_arg<'a>(value: *const c_char, what: &str) -> FfiResult<&'a str> {
    if value.is_null() {
        return Err(Failure::invalid_argument(format!("{what} is null")));
    }
    CStr::from_ptr(value)
        .to_str()
        .map_err(|_| Failure::invalid_argument(format!("invalid UTF-8 in {what}")))
}

fn delete_quietly(container: &Container, name: &str) {
    if let Err(e) = container.delete_document(name) {
        tracing::debug!(name, error = %e, "replace: no document deleted");
    }
}

/// Opens a database.
///
/// A read-write open is tried first; it opens an existing container or
/// creates a missing one. If that fails, an existing container is opened
/// read-only. The opened container is bound to the alias `"xmldb"`.
///
/// # Returns
///
/// A handle, even when both attempts fail. Check `xmldb_error` before using
/// it and release it with `xmldb_free` in every case. Null only if `path`
/// handling panicked before a handle could be built.
///
/// # Safety
///
/// `path` must be a valid null-terminated UTF-8 string or null.
#[no_mangle]
pub unsafe extern "C" fn xmldb_open(path: *const c_char) -> *mut XmlDbHandle {
    let mut db = Box::new(NativeDb::new());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match str_arg(path, "path") {
        Ok(path) => db.open_with_fallback(Path::new(path)),
        Err(failure) => db.error.set(failure),
    }));
    if let Err(payload) = outcome {
        let failure = Failure::panic(&*payload);
        tracing::error!(error = %failure, "open panicked");
        db.error.set(failure);
    }

    Box::into_raw(db) as *mut XmlDbHandle
}

/// Releases a database handle and its container.
///
/// Cursors created from the handle stay valid; they hold their own
/// snapshot of documents.
///
/// # Safety
///
/// `handle` must have been returned by `xmldb_open` or be null, and must not
/// be used after this call.
#[no_mangle]
pub unsafe extern "C" fn xmldb_free(handle: *mut XmlDbHandle) {
    if handle.is_null() {
        return;
    }

    let db = Box::from_raw(handle as *mut NativeDb);
    if panic::catch_unwind(AssertUnwindSafe(move || drop(db))).is_err() {
        tracing::error!("panic while releasing database");
    }
}

/// Returns 1 if the last operation on `handle` failed, 0 otherwise.
///
/// A null handle reports 1.
///
/// # Safety
///
/// `handle` must be a valid database handle or null.
#[no_mangle]
pub unsafe extern "C" fn xmldb_error(handle: *mut XmlDbHandle) -> c_int {
    match (handle as *const NativeDb).as_ref() {
        Some(db) => c_int::from(db.error.failed()),
        None => 1,
    }
}

/// Returns the message of the last failed operation, or `""`.
///
/// # Safety
///
/// `handle` must be a valid database handle or null. The returned pointer is
/// valid until the next call on `handle`.
#[no_mangle]
pub unsafe extern "C" fn xmldb_errstring(handle: *mut XmlDbHandle) -> *const c_char {
    match (handle as *const NativeDb).as_ref() {
        Some(db) => db.error.message_ptr(),
        None => c"null database handle".as_ptr(),
    }
}

/// Returns the result code of the last operation.
///
/// # Safety
///
/// `handle` must be a valid database handle or null.
#[no_mangle]
pub unsafe extern "C" fn xmldb_errcode(handle: *mut XmlDbHandle) -> XmlDbResult {
    match (handle as *const NativeDb).as_ref() {
        Some(db) => db.error.code(),
        None => XmlDbResult::NullPointer,
    }
}

/// Stores the file at `path` as a document named `path`.
///
/// With `replace` non-zero, an existing document of that name is deleted
/// first; a failed delete is ignored.
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid database handle or null
/// - `path` must be a valid null-terminated UTF-8 string or null
#[no_mangle]
pub unsafe extern "C" fn xmldb_put_file(
    handle: *mut XmlDbHandle,
    path: *const c_char,
    replace: c_int,
) -> c_int {
    with_db(handle, 0, |db| {
        let path = str_arg(path, "path")?;
        let container = db.container()?;
        if replace != 0 {
            delete_quietly(container, path);
        }

        let stream = db.manager.create_local_file_input_stream(Path::new(path))?;
        container.put_document_from_stream(path, stream)?;
        Ok(1)
    })
}

/// Stores `data` as a document named `name`.
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid database handle or null
/// - `name` and `data` must be valid null-terminated UTF-8 strings or null
#[no_mangle]
pub unsafe extern "C" fn xmldb_put_xml(
    handle: *mut XmlDbHandle,
    name: *const c_char,
    data: *const c_char,
    replace: c_int,
) -> c_int {
    with_db(handle, 0, |db| {
        let name = str_arg(name, "name")?;
        let data = str_arg(data, "data")?;
        let container = db.container()?;
        if replace != 0 {
            delete_quietly(container, name);
        }

        container.put_document(name, data)?;
        Ok(1)
    })
}

/// Copies every document of the container at `path` into this one.
///
/// The source is opened read-only. Documents are copied one at a time and
/// the merge stops at the first failed insert; documents copied before it
/// stay.
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid database handle or null
/// - `path` must be a valid null-terminated UTF-8 string or null
#[no_mangle]
pub unsafe extern "C" fn xmldb_merge(
    handle: *mut XmlDbHandle,
    path: *const c_char,
    replace: c_int,
) -> c_int {
    with_db(handle, 0, |db| {
        let path = str_arg(path, "path")?;
        let container = db.container()?;
        let source = db
            .manager
            .open_container(Path::new(path), ContainerConfig::new().read_only(true))?;

        let mut merged = 0usize;
        for doc in source.all_documents() {
            if replace != 0 {
                delete_quietly(container, doc.name());
            }
            container.put_existing(&doc)?;
            merged += 1;
        }

        tracing::debug!(source = path, merged, "merged container");
        Ok(1)
    })
}

/// Deletes the document named `name`.
///
/// # Returns
///
/// 1 on success, 0 on failure (including a missing document).
///
/// # Safety
///
/// - `handle` must be a valid database handle or null
/// - `name` must be a valid null-terminated UTF-8 string or null
#[no_mangle]
pub unsafe extern "C" fn xmldb_remove(handle: *mut XmlDbHandle, name: *const c_char) -> c_int {
    with_db(handle, 0, |db| {
        let name = str_arg(name, "name")?;
        db.container()?.delete_document(name)?;
        Ok(1)
    })
}

/// Returns the content of the document named `name`.
///
/// # Returns
///
/// The content, or null on failure. The message is only available through
/// `xmldb_errstring`.
///
/// # Safety
///
/// - `handle` must be a valid database handle or null
/// - `name` must be a valid null-terminated UTF-8 string or null
///
/// The returned pointer is valid until the next call on `handle`.
#[no_mangle]
pub unsafe extern "C" fn xmldb_get(handle: *mut XmlDbHandle, name: *const c_char) -> *const c_char {
    with_db(handle, ptr::null(), |db| {
        let name = str_arg(name, "name")?;
        let doc = db.container()?.get_document(name)?;
        db.result = c_string(doc.content());
        Ok(db.result.as_ptr())
    })
}

/// Returns the number of documents, or 0 on failure.
///
/// # Safety
///
/// `handle` must be a valid database handle or null.
#[no_mangle]
pub unsafe extern "C" fn xmldb_size(handle: *mut XmlDbHandle) -> u64 {
    with_db(handle, 0, |db| Ok(db.container()?.num_documents() as u64))
}

/// Creates a cursor over every document.
///
/// # Returns
///
/// A cursor to release with `xmldb_docs_free`; null only for a null handle.
/// On failure the cursor is already exhausted and the error is set on
/// `handle`.
///
/// # Safety
///
/// `handle` must be a valid database handle or null.
#[no_mangle]
pub unsafe extern "C" fn xmldb_get_all(handle: *mut XmlDbHandle) -> *mut XmlDbDocs {
    if handle.is_null() {
        return ptr::null_mut();
    }

    let results = with_db(handle, Results::empty(), |db| {
        Ok(db.container()?.all_documents())
    });
    NativeDocs::into_raw(results)
}

/// Creates a cursor over the documents matching `query`.
///
/// The query is appended to `collection('xmldb')` and evaluated lazily;
/// documents that are not well-formed are skipped.
///
/// # Returns
///
/// A cursor to release with `xmldb_docs_free`; null only for a null handle.
/// If the query cannot be built the cursor is already exhausted and the
/// error is set on `handle`.
///
/// # Safety
///
/// - `handle` must be a valid database handle or null
/// - `query` must be a valid null-terminated UTF-8 string or null
#[no_mangle]
pub unsafe extern "C" fn xmldb_get_query(
    handle: *mut XmlDbHandle,
    query: *const c_char,
) -> *mut XmlDbDocs {
    if handle.is_null() {
        return ptr::null_mut();
    }

    let results = with_db(handle, Results::empty(), |db| {
        let query = str_arg(query, "query")?;
        db.container()?;

        let mut context = db.manager.create_query_context(EvaluationType::Lazy);
        context.set_default_collection(ALIAS);
        let expr = format!("collection('{ALIAS}'){query}");
        Ok(db.manager.query(&expr, &context)?)
    });
    NativeDocs::into_raw(results)
}

/// Returns the library version as a null-terminated string.
///
/// The returned pointer is static and should not be freed.
#[no_mangle]
pub extern "C" fn xmldb_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast()
}
