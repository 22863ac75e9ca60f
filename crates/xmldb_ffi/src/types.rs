//! Type definitions for FFI.

/// An opaque database handle.
///
/// This is a pointer to the internal database structure.
/// Never dereference or modify directly.
#[repr(C)]
pub struct XmlDbHandle {
    _private: [u8; 0],
}

/// An opaque document cursor handle.
#[repr(C)]
pub struct XmlDbDocs {
    _private: [u8; 0],
}

/// Alias every handle binds its container to.
///
/// Queries are evaluated against `collection('xmldb')`.
pub const ALIAS: &str = "xmldb";
