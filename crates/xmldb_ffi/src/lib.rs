//! # xmldb FFI
//!
//! Stable C ABI over the xmldb container engine.
//!
//! This crate provides:
//! - C-compatible function exports for databases and document cursors
//! - A sticky per-handle error state (flag, message, result code)
//! - Memory ownership conventions
//!
//! Every exported function runs its engine call inside a panic boundary and
//! reports failure through its return value: `0` for `c_int` results, `0`
//! for counts, null for strings. The cause is then available from
//! `xmldb_error`, `xmldb_errstring` and `xmldb_errcode` until the next call
//! on the same handle.
//!
//! Strings returned by the library are owned by the handle that produced
//! them and must not be freed by the caller.

#![warn(missing_docs)]

pub mod database;
pub mod error;
pub mod iterator;
pub mod types;

pub use database::*;
pub use error::{ErrorCode, XmlDbResult};
pub use iterator::*;
pub use types::*;
