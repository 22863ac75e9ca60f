//! Input streams for document content.

use crate::error::ContainerResult;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A source of document content that is read once when the document is
/// stored.
pub struct InputStream {
    reader: Box<dyn Read + Send>,
    source: String,
}

impl InputStream {
    /// Opens a local file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn from_file(path: &Path) -> ContainerResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: Box::new(BufReader::new(file)),
            source: path.display().to_string(),
        })
    }

    /// Wraps an arbitrary reader.
    pub fn from_reader(reader: impl Read + Send + 'static, source: impl Into<String>) -> Self {
        Self {
            reader: Box::new(reader),
            source: source.into(),
        }
    }

    /// Describes where the content comes from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Reads the whole stream as UTF-8.
    pub(crate) fn read_to_string(mut self) -> ContainerResult<String> {
        let mut content = String::new();
        self.reader.read_to_string(&mut content)?;
        Ok(content)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_stream() {
        let stream = InputStream::from_reader(Cursor::new(b"<a/>".to_vec()), "memory");
        assert_eq!(stream.source(), "memory");
        assert_eq!(stream.read_to_string().unwrap(), "<a/>");
    }

    #[test]
    fn missing_file() {
        assert!(InputStream::from_file(Path::new("/definitely/not/here.xml")).is_err());
    }
}
