//! Document cursors.

use crate::connection::ConnectionInner;
use crate::native::{copy_str, DocsPtr};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use xmldb_ffi::{xmldb_docs_content, xmldb_docs_name, xmldb_docs_next};

/// A forward-only cursor over documents, created by
/// [`Connection::all`](crate::Connection::all) or
/// [`Connection::query`](crate::Connection::query).
///
/// All methods take `&self`, so a cursor can be shared between threads and
/// closed from one thread while another is iterating. A closed cursor is
/// inert: `next` returns false and `name`/`content` return empty strings.
///
/// The cursor closes itself when it is exhausted, when it is dropped, and
/// when its connection is closed.
///
/// ```rust,no_run
/// # fn main() -> xmldb::Result<()> {
/// let db = xmldb::Connection::open("/tmp/library")?;
/// let docs = db.all()?;
/// while docs.next() {
///     println!("{}", docs.name());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Documents {
    shared: Arc<CursorShared>,
}

pub(crate) struct CursorShared {
    id: u64,
    owner: Weak<ConnectionInner>,
    state: Mutex<CursorState>,
}

struct CursorState {
    cursor: Option<DocsPtr>,
    started: bool,
}

impl CursorShared {
    pub(crate) fn new(id: u64, owner: Weak<ConnectionInner>, cursor: DocsPtr) -> Self {
        Self {
            id,
            owner,
            state: Mutex::new(CursorState {
                cursor: Some(cursor),
                started: false,
            }),
        }
    }

    /// Releases the cursor and removes it from the owner's registry.
    fn close(&self) {
        let mut state = self.state.lock();
        let Some(cursor) = state.cursor.take() else {
            return;
        };
        drop(cursor);

        let owner = self.owner.upgrade();
        if let Some(owner) = &owner {
            owner.deregister(self.id);
        }
        drop(state);
        // `owner` may be the last handle to the connection; release it
        // outside the cursor lock.
        drop(owner);
    }

    /// Releases the cursor without touching the registry. Used by the owner
    /// while it closes.
    pub(crate) fn force_close(&self) {
        let cursor = self.state.lock().cursor.take();
        if cursor.is_some() {
            tracing::trace!(id = self.id, "cursor closed by its connection");
        }
    }
}

impl Drop for CursorShared {
    fn drop(&mut self) {
        self.close();
    }
}

impl Documents {
    pub(crate) fn new(shared: Arc<CursorShared>) -> Self {
        Self { shared }
    }

    /// Moves to the next document.
    ///
    /// Returns false once the cursor is exhausted or closed; it then stays
    /// false.
    pub fn next(&self) -> bool {
        let mut state = self.shared.state.lock();
        let advanced = match &state.cursor {
            // SAFETY: the cursor is live while it is in the state.
            Some(cursor) => unsafe { xmldb_docs_next(cursor.as_ptr()) == 1 },
            None => return false,
        };
        state.started = true;

        if !advanced {
            drop(state);
            self.shared.close();
        }
        advanced
    }

    /// Returns the name of the current document.
    ///
    /// Empty before the first successful `next` and after close.
    #[must_use]
    pub fn name(&self) -> String {
        let state = self.shared.state.lock();
        match (&state.cursor, state.started) {
            // SAFETY: the cursor is live and the string is copied before
            // the lock is released.
            (Some(cursor), true) => unsafe { copy_str(xmldb_docs_name(cursor.as_ptr())) },
            _ => String::new(),
        }
    }

    /// Returns the content of the current document.
    ///
    /// Empty before the first successful `next` and after close. Content is
    /// only extracted when asked for.
    #[must_use]
    pub fn content(&self) -> String {
        let state = self.shared.state.lock();
        match (&state.cursor, state.started) {
            // SAFETY: as in `name`.
            (Some(cursor), true) => unsafe { copy_str(xmldb_docs_content(cursor.as_ptr())) },
            _ => String::new(),
        }
    }

    /// Closes the cursor. Closing twice is a no-op.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Returns true until the cursor is closed or exhausted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.state.lock().cursor.is_some()
    }

    /// Returns the cursor's id within its connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }
}

impl fmt::Debug for Documents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Documents")
            .field("id", &self.shared.id)
            .field("open", &self.is_open())
            .finish()
    }
}
