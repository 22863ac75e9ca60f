//! Document cursor FFI functions.

use crate::error::{c_string, Failure};
use crate::types::XmlDbDocs;
use std::ffi::{c_char, c_int, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use xmldb_container::{Document, Results};

const EMPTY: &CStr = c"";

/// Internal cursor state behind an `XmlDbDocs`.
///
/// Name and content are converted to C strings on first request and cached
/// until the cursor moves.
pub(crate) struct NativeDocs {
    /// `None` once exhausted.
    results: Option<Results>,
    current: Option<Document>,
    name: Option<CString>,
    content: Option<CString>,
}

impl NativeDocs {
    pub(crate) fn into_raw(results: Results) -> *mut XmlDbDocs {
        let docs = Box::new(Self {
            results: Some(results),
            current: None,
            name: None,
            content: None,
        });
        Box::into_raw(docs) as *mut XmlDbDocs
    }

    fn advance(&mut self) -> bool {
        self.name = None;
        self.content = None;
        self.current = self.results.as_mut().and_then(Iterator::next);
        if self.current.is_none() {
            self.results = None;
        }
        self.current.is_some()
    }

    fn name(&mut self) -> *const c_char {
        match &self.current {
            Some(doc) => self.name.get_or_insert_with(|| c_string(doc.name())).as_ptr(),
            None => EMPTY.as_ptr(),
        }
    }

    fn content(&mut self) -> *const c_char {
        match &self.current {
            Some(doc) => self
                .content
                .get_or_insert_with(|| c_string(doc.content()))
                .as_ptr(),
            None => EMPTY.as_ptr(),
        }
    }

    fn exhaust(&mut self) {
        self.results = None;
        self.current = None;
        self.name = None;
        self.content = None;
    }
}

/// Runs `op` on the cursor. A panic exhausts the cursor and returns
/// `fallback`.
unsafe fn with_docs<T>(docs: *mut XmlDbDocs, fallback: T, op: impl FnOnce(&mut NativeDocs) -> T) -> T {
    let Some(native) = (docs as *mut NativeDocs).as_mut() else {
        return fallback;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| op(&mut *native))) {
        Ok(value) => value,
        Err(payload) => {
            let failure = Failure::panic(&*payload);
            tracing::error!(error = %failure, "cursor operation panicked");
            native.exhaust();
            fallback
        }
    }
}

/// Advances the cursor.
///
/// # Returns
///
/// 1 if the cursor is positioned on a document, 0 once exhausted. An
/// exhausted cursor stays exhausted.
///
/// # Safety
///
/// `docs` must be a valid cursor handle or null.
#[no_mangle]
pub unsafe extern "C" fn xmldb_docs_next(docs: *mut XmlDbDocs) -> c_int {
    with_docs(docs, 0, |native| c_int::from(native.advance()))
}

/// Returns the name of the current document, or `""` when the cursor is not
/// positioned.
///
/// # Safety
///
/// `docs` must be a valid cursor handle or null. The returned pointer is
/// valid until the cursor is advanced or freed.
#[no_mangle]
pub unsafe extern "C" fn xmldb_docs_name(docs: *mut XmlDbDocs) -> *const c_char {
    with_docs(docs, EMPTY.as_ptr(), NativeDocs::name)
}

/// Returns the content of the current document, or `""` when the cursor is
/// not positioned.
///
/// # Safety
///
/// `docs` must be a valid cursor handle or null. The returned pointer is
/// valid until the cursor is advanced or freed.
#[no_mangle]
pub unsafe extern "C" fn xmldb_docs_content(docs: *mut XmlDbDocs) -> *const c_char {
    with_docs(docs, EMPTY.as_ptr(), NativeDocs::content)
}

/// Frees a cursor. Null is a no-op.
///
/// # Safety
///
/// `docs` must have been returned by `xmldb_get_all` or `xmldb_get_query`
/// or be null, and must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn xmldb_docs_free(docs: *mut XmlDbDocs) {
    if docs.is_null() {
        return;
    }

    let native = Box::from_raw(docs as *mut NativeDocs);
    if panic::catch_unwind(AssertUnwindSafe(move || drop(native))).is_err() {
        tracing::error!("panic while releasing cursor");
    }
}
