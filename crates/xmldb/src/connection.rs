//! Database connections.

use crate::documents::{CursorShared, Documents};
use crate::error::{Error, Result};
use crate::native::{copy_str, path_cstring, to_cstring, DbPtr, DocsPtr, Failure};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::c_int;
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use xmldb_ffi::{
    xmldb_get, xmldb_get_all, xmldb_get_query, xmldb_merge, xmldb_open, xmldb_put_file,
    xmldb_put_xml, xmldb_remove, xmldb_size, XmlDbDocs, XmlDbHandle, XmlDbResult,
};

/// A thread-safe connection to an XML document database.
///
/// `Connection` is a cheap, cloneable handle; clones share the same native
/// database. Every operation holds the connection lock for its whole
/// duration, so calls from different threads are serialized.
///
/// Opening a path that another connection holds for writing falls back to
/// a read-only connection; writes through it fail with
/// [`Error::ReadOnly`].
///
/// Closing the connection (explicitly, or by dropping the last clone)
/// closes every cursor it created.
///
/// ```rust,no_run
/// use xmldb::Connection;
///
/// # fn main() -> xmldb::Result<()> {
/// let db = Connection::open("/tmp/library")?;
/// db.put_xml("dune.xml", "<book><title>Dune</title></book>", false)?;
///
/// let docs = db.query("/book[title = 'Dune']")?;
/// while docs.next() {
///     println!("{}", docs.name());
/// }
/// db.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

pub(crate) struct ConnectionInner {
    path: PathBuf,
    state: Mutex<ConnectionState>,
    /// Leaf lock: never held while acquiring another lock.
    children: Mutex<HashMap<u64, Weak<CursorShared>>>,
}

struct ConnectionState {
    handle: Option<DbPtr>,
    next_id: u64,
}

impl ConnectionInner {
    pub(crate) fn deregister(&self, id: u64) {
        self.children.lock().remove(&id);
    }

    fn close(&self) {
        let mut state = self.state.lock();
        let Some(handle) = state.handle.take() else {
            return;
        };

        let children = mem::take(&mut *self.children.lock());
        let mut forced = 0usize;
        for child in children.into_values().filter_map(|weak| weak.upgrade()) {
            child.force_close();
            forced += 1;
        }

        drop(handle);
        tracing::debug!(path = %self.path.display(), forced, "closed database");
    }
}

impl Drop for ConnectionInner {
    fn drop(&mut self) {
        self.close();
    }
}

impl Connection {
    /// Opens the database at `path`, creating it if it does not exist.
    ///
    /// If the database is held for writing by another connection, it is
    /// opened read-only instead.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the path is not valid UTF-8 or contains NUL
    /// - `Open` if neither a read-write nor a read-only open succeeds
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let c_path = path_cstring(path)?;

        // SAFETY: `c_path` is a valid C string for the duration of the call.
        let raw = unsafe { xmldb_open(c_path.as_ptr()) };
        let handle = DbPtr::new(raw).ok_or_else(|| Error::Open {
            code: XmlDbResult::Error,
            message: "xmldb_open returned a null handle".to_string(),
        })?;

        if let Some(failure) = handle.failure() {
            tracing::debug!(path = %path.display(), error = %failure.message, "open failed");
            drop(handle);
            return Err(Error::open(failure));
        }

        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self {
            inner: Arc::new(ConnectionInner {
                path: path.to_path_buf(),
                state: Mutex::new(ConnectionState {
                    handle: Some(handle),
                    next_id: 0,
                }),
                children: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Runs `op` with the connection lock held.
    fn with_handle<T>(&self, op: impl FnOnce(&DbPtr) -> Result<T>) -> Result<T> {
        let state = self.inner.state.lock();
        let handle = state.handle.as_ref().ok_or(Error::Closed)?;
        op(handle)
    }

    /// Stores the local file at `path` as a document named `path`.
    ///
    /// With `replace`, an existing document of that name is replaced.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the name is taken and `replace` is false
    /// - `NotWellFormed` if the file is not XML
    /// - `ReadOnly` on a read-only connection
    pub fn put_file(&self, path: impl AsRef<Path>, replace: bool) -> Result<()> {
        let c_path = path_cstring(path.as_ref())?;

        self.with_handle(|handle| {
            // SAFETY: the handle is live under the lock; `c_path` outlives the call.
            unsafe { xmldb_put_file(handle.as_ptr(), c_path.as_ptr(), c_int::from(replace)) };
            handle.check()
        })
    }

    /// Stores `content` as a document named `name`.
    ///
    /// # Errors
    ///
    /// As for [`put_file`](Self::put_file).
    pub fn put_xml(&self, name: &str, content: &str, replace: bool) -> Result<()> {
        let c_name = to_cstring(name, "name")?;
        let c_content = to_cstring(content, "content")?;

        self.with_handle(|handle| {
            // SAFETY: the handle is live under the lock; the strings outlive the call.
            unsafe {
                xmldb_put_xml(
                    handle.as_ptr(),
                    c_name.as_ptr(),
                    c_content.as_ptr(),
                    c_int::from(replace),
                )
            };
            handle.check()
        })
    }

    /// Copies every document of the database at `other` into this one.
    ///
    /// The source is opened read-only. The merge is not atomic: it stops at
    /// the first document that cannot be stored and keeps the documents
    /// copied before it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no database at `other`
    /// - `AlreadyExists` for a duplicate name when `replace` is false
    pub fn merge(&self, other: impl AsRef<Path>, replace: bool) -> Result<()> {
        let c_other = path_cstring(other.as_ref())?;

        self.with_handle(|handle| {
            // SAFETY: the handle is live under the lock; `c_other` outlives the call.
            unsafe { xmldb_merge(handle.as_ptr(), c_other.as_ptr(), c_int::from(replace)) };
            handle.check()
        })
    }

    /// Deletes the document named `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such document.
    pub fn remove(&self, name: &str) -> Result<()> {
        let c_name = to_cstring(name, "name")?;

        self.with_handle(|handle| {
            // SAFETY: the handle is live under the lock; `c_name` outlives the call.
            unsafe { xmldb_remove(handle.as_ptr(), c_name.as_ptr()) };
            handle.check()
        })
    }

    /// Returns the content of the document named `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such document.
    pub fn get(&self, name: &str) -> Result<String> {
        let c_name = to_cstring(name, "name")?;

        self.with_handle(|handle| {
            // SAFETY: the returned string is owned by the handle and copied
            // before the lock is released.
            let content = unsafe { xmldb_get(handle.as_ptr(), c_name.as_ptr()) };
            handle.check()?;
            Ok(unsafe { copy_str(content) })
        })
    }

    /// Returns the number of documents.
    pub fn size(&self) -> Result<u64> {
        self.with_handle(|handle| {
            // SAFETY: the handle is live under the lock.
            let size = unsafe { xmldb_size(handle.as_ptr()) };
            handle.check()?;
            Ok(size)
        })
    }

    /// Returns a cursor over every document.
    pub fn all(&self) -> Result<Documents> {
        // SAFETY: called with a live handle under the lock.
        self.open_cursor(
            |handle| unsafe { xmldb_get_all(handle) },
            |failure| Error::from(failure),
        )
    }

    /// Returns a cursor over the documents matching `expr`.
    ///
    /// `expr` continues `collection('xmldb')`: a location path such as
    /// `//book[@lang = 'en']` or a document predicate such as
    /// `[count(//item) > 2]`. A document matches when the expression
    /// selects at least one node.
    ///
    /// # Errors
    ///
    /// `Query` if the expression is invalid.
    pub fn query(&self, expr: &str) -> Result<Documents> {
        let c_expr = to_cstring(expr, "query")?;
        // SAFETY: called with a live handle under the lock; `c_expr`
        // outlives the call.
        self.open_cursor(
            |handle| unsafe { xmldb_get_query(handle, c_expr.as_ptr()) },
            Error::query,
        )
    }

    fn open_cursor(
        &self,
        create: impl FnOnce(*mut XmlDbHandle) -> *mut XmlDbDocs,
        on_failure: fn(Failure) -> Error,
    ) -> Result<Documents> {
        let mut state = self.inner.state.lock();
        let handle = state.handle.as_ref().ok_or(Error::Closed)?;

        let cursor = DocsPtr::new(create(handle.as_ptr()));
        if let Some(failure) = handle.failure() {
            // The native cursor is already exhausted; release it here.
            drop(cursor);
            return Err(on_failure(failure));
        }
        let cursor = cursor.ok_or_else(|| Error::Native {
            code: XmlDbResult::Error,
            message: "native layer returned a null cursor".to_string(),
        })?;

        let id = state.next_id;
        state.next_id += 1;

        let shared = Arc::new(CursorShared::new(id, Arc::downgrade(&self.inner), cursor));
        self.inner.children.lock().insert(id, Arc::downgrade(&shared));
        tracing::trace!(id, "opened cursor");
        Ok(Documents::new(shared))
    }

    /// Closes the connection and every cursor it created.
    ///
    /// Closing twice is a no-op. Other clones see the connection as closed.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Returns true until the connection is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.state.lock().handle.is_some()
    }

    /// Returns the path the connection was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Returns the number of cursors that are still open.
    #[must_use]
    pub fn open_iterators(&self) -> usize {
        self.inner.children.lock().len()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.inner.path)
            .field("open", &self.is_open())
            .finish()
    }
}
