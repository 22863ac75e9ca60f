//! # xmldb
//!
//! Safe, thread-safe handles over the xmldb C ABI.
//!
//! This crate provides:
//! - [`Connection`]: a cloneable database connection whose operations are
//!   serialized by a per-connection lock
//! - [`Documents`]: forward-only cursors over all documents or query results
//! - Deterministic cleanup: closing a connection closes its cursors, and
//!   dropping the last handle closes whatever is still open
//!
//! Every native handle is released exactly once, whichever of explicit
//! close, drop, or connection close happens first.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use xmldb::Connection;
//!
//! # fn main() -> xmldb::Result<()> {
//! let db = Connection::open("/tmp/notes")?;
//! db.put_xml("n1", "<note><to>Ann</to></note>", true)?;
//! assert_eq!(db.get("n1")?, "<note><to>Ann</to></note>");
//!
//! let hits = db.query("//to[. = 'Ann']")?;
//! while hits.next() {
//!     println!("{}: {}", hits.name(), hits.content());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod connection;
mod documents;
mod error;
mod native;

pub use connection::Connection;
pub use documents::Documents;
pub use error::{Error, Result};
pub use xmldb_ffi::XmlDbResult;

/// Returns the version of the native library.
#[must_use]
pub fn native_version() -> String {
    // SAFETY: the version string is static and null-terminated.
    unsafe { native::copy_str(xmldb_ffi::xmldb_version()) }
}
