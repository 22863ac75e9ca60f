//! XML documents.

use crate::error::{ContainerError, ContainerResult};
use crate::format;
use std::fmt;
use std::sync::Arc;

/// A named XML document.
///
/// Documents are immutable and cheap to clone; the content is shared
/// between the container, any open results and every clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    inner: Arc<Stored>,
}

#[derive(PartialEq, Eq)]
struct Stored {
    name: String,
    content: String,
}

impl Document {
    /// Creates a document after checking the name and well-formedness.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if the name is empty or contains a NUL byte
    /// - `DocumentTooLarge` if the name or content exceeds `u32::MAX` bytes
    /// - `NotWellFormed` if the content does not parse as XML
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> ContainerResult<Self> {
        let name = name.into();
        let content = content.into();
        validate_name(&name)?;
        format::check_len(&name, name.len())?;
        format::check_len(&name, content.len())?;
        check_well_formed(&name, &content)?;
        Ok(Self::from_trusted(name, content))
    }

    /// Creates a document from data that has already been validated.
    pub(crate) fn from_trusted(name: String, content: String) -> Self {
        Self {
            inner: Arc::new(Stored { name, content }),
        }
    }

    /// Returns the document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the serialized XML content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.inner.content
    }

    /// Parses the content.
    pub(crate) fn parse(&self) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
        roxmltree::Document::parse(&self.inner.content)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.inner.name)
            .field("len", &self.inner.content.len())
            .finish()
    }
}

fn validate_name(name: &str) -> ContainerResult<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(ContainerError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_well_formed(name: &str, content: &str) -> ContainerResult<()> {
    roxmltree::Document::parse(content)
        .map(|_| ())
        .map_err(|e| ContainerError::NotWellFormed {
            name: name.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed() {
        let doc = Document::new("a.xml", "<a><b>text</b></a>").unwrap();
        assert_eq!(doc.name(), "a.xml");
        assert_eq!(doc.content(), "<a><b>text</b></a>");
    }

    #[test]
    fn rejects_malformed() {
        let err = Document::new("bad.xml", "<a><b></a>").unwrap_err();
        assert!(matches!(err, ContainerError::NotWellFormed { .. }));
    }

    #[test]
    fn rejects_empty_name() {
        let err = Document::new("", "<a/>").unwrap_err();
        assert!(matches!(err, ContainerError::InvalidName { .. }));
    }

    #[test]
    fn clones_share_content() {
        let doc = Document::new("a", "<a/>").unwrap();
        let copy = doc.clone();
        assert_eq!(doc, copy);
        assert!(std::ptr::eq(doc.content(), copy.content()));
    }
}
