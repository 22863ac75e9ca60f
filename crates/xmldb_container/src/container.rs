//! Document containers.

use crate::config::ContainerConfig;
use crate::dir::ContainerDir;
use crate::document::Document;
use crate::error::{ContainerError, ContainerResult};
use crate::results::Results;
use crate::stream::InputStream;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A persistent collection of named XML documents.
///
/// `Container` is a cheap, cloneable handle; all clones share the same
/// documents. The write lock on the directory is held until the last clone
/// (including clones held by a `Manager` alias) is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use xmldb_container::{ContainerConfig, Manager};
///
/// let manager = Manager::new();
/// let container = manager.create_container(path, ContainerConfig::default())?;
/// container.put_document("a.xml", "<a/>")?;
/// assert_eq!(container.num_documents(), 1);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    dir: ContainerDir,
    sync_on_write: bool,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    documents: BTreeMap<String, Document>,
    dirty: bool,
}

impl Container {
    /// Creates a new container at `path`.
    pub(crate) fn create(path: &Path, config: &ContainerConfig) -> ContainerResult<Self> {
        if config.read_only {
            return Err(ContainerError::read_only(path));
        }
        let dir = ContainerDir::create(path)?;
        tracing::debug!(path = %path.display(), "created container");
        Ok(Self::from_parts(dir, config, BTreeMap::new()))
    }

    /// Opens an existing container at `path`.
    pub(crate) fn open(path: &Path, config: &ContainerConfig) -> ContainerResult<Self> {
        let dir = ContainerDir::open(path, config.read_only)?;
        let documents = dir
            .load()?
            .into_iter()
            .map(|(name, content)| {
                let doc = Document::from_trusted(name.clone(), content);
                (name, doc)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            path = %path.display(),
            read_only = config.read_only,
            documents = documents.len(),
            "opened container"
        );
        Ok(Self::from_parts(dir, config, documents))
    }

    fn from_parts(
        dir: ContainerDir,
        config: &ContainerConfig,
        documents: BTreeMap<String, Document>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                dir,
                sync_on_write: config.sync_on_write,
                state: RwLock::new(State {
                    documents,
                    dirty: false,
                }),
            }),
        }
    }

    /// Returns the container path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.dir.path()
    }

    /// Returns true if writes are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        !self.inner.dir.is_writable()
    }

    /// Returns true if both handles refer to the same open container.
    #[must_use]
    pub fn same_container(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stores a new document.
    ///
    /// # Errors
    ///
    /// - `ReadOnly` for read-only containers
    /// - `DocumentExists` if the name is taken
    /// - `InvalidName` / `NotWellFormed` for bad input
    pub fn put_document(&self, name: &str, content: &str) -> ContainerResult<()> {
        let doc = Document::new(name, content)?;
        self.put_existing(&doc)
    }

    /// Stores a new document whose content is read from `stream`.
    pub fn put_document_from_stream(&self, name: &str, stream: InputStream) -> ContainerResult<()> {
        self.check_writable()?;
        let content = stream.read_to_string()?;
        self.put_document(name, &content)
    }

    /// Stores a copy of a document taken from another container.
    pub fn put_existing(&self, doc: &Document) -> ContainerResult<()> {
        self.check_writable()?;

        let mut state = self.inner.state.write();
        if state.documents.contains_key(doc.name()) {
            return Err(ContainerError::DocumentExists {
                name: doc.name().to_string(),
            });
        }
        state.documents.insert(doc.name().to_string(), doc.clone());

        if let Err(e) = self.persist(&mut state) {
            state.documents.remove(doc.name());
            return Err(e);
        }
        tracing::trace!(name = doc.name(), "stored document");
        Ok(())
    }

    /// Deletes a document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` if there is no document with this name.
    pub fn delete_document(&self, name: &str) -> ContainerResult<()> {
        self.check_writable()?;

        let mut state = self.inner.state.write();
        let removed = state
            .documents
            .remove(name)
            .ok_or_else(|| ContainerError::document_not_found(name))?;

        if let Err(e) = self.persist(&mut state) {
            state.documents.insert(name.to_string(), removed);
            return Err(e);
        }
        tracing::trace!(name, "deleted document");
        Ok(())
    }

    /// Fetches a document by name.
    pub fn get_document(&self, name: &str) -> ContainerResult<Document> {
        self.inner
            .state
            .read()
            .documents
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::document_not_found(name))
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn num_documents(&self) -> usize {
        self.inner.state.read().documents.len()
    }

    /// Returns lazy results over every document.
    ///
    /// The results see the documents as of this call; later writes are not
    /// reflected.
    #[must_use]
    pub fn all_documents(&self) -> Results {
        Results::all(self.snapshot())
    }

    /// Writes pending changes to disk.
    pub fn flush(&self) -> ContainerResult<()> {
        let mut state = self.inner.state.write();
        self.inner.flush_locked(&mut state)
    }

    pub(crate) fn snapshot(&self) -> Vec<Document> {
        self.inner.state.read().documents.values().cloned().collect()
    }

    fn check_writable(&self) -> ContainerResult<()> {
        if self.is_read_only() {
            return Err(ContainerError::read_only(self.path()));
        }
        Ok(())
    }

    fn persist(&self, state: &mut State) -> ContainerResult<()> {
        state.dirty = true;
        if self.inner.sync_on_write {
            self.inner.flush_locked(state)?;
        }
        Ok(())
    }
}

impl Inner {
    fn flush_locked(&self, state: &mut State) -> ContainerResult<()> {
        if !state.dirty {
            return Ok(());
        }
        self.dir.save(
            state
                .documents
                .values()
                .map(|doc| (doc.name(), doc.content())),
        )?;
        state.dirty = false;
        Ok(())
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.dirty {
            return;
        }
        let result = self.dir.save(
            state
                .documents
                .values()
                .map(|doc| (doc.name(), doc.content())),
        );
        if let Err(e) = result {
            tracing::warn!(path = %self.dir.path().display(), error = %e, "failed to flush container on drop");
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("path", &self.path())
            .field("read_only", &self.is_read_only())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn create(path: &Path) -> Container {
        Container::create(path, &ContainerConfig::default()).unwrap()
    }

    #[test]
    fn put_get_delete() {
        let temp = tempdir().unwrap();
        let container = create(&temp.path().join("c"));

        container.put_document("a", "<a>1</a>").unwrap();
        assert_eq!(container.num_documents(), 1);
        assert_eq!(container.get_document("a").unwrap().content(), "<a>1</a>");

        container.delete_document("a").unwrap();
        assert_eq!(container.num_documents(), 0);
        assert!(matches!(
            container.get_document("a"),
            Err(ContainerError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn duplicate_put_fails_and_keeps_original() {
        let temp = tempdir().unwrap();
        let container = create(&temp.path().join("c"));

        container.put_document("a", "<a>old</a>").unwrap();
        let err = container.put_document("a", "<a>new</a>").unwrap_err();
        assert!(matches!(err, ContainerError::DocumentExists { .. }));
        assert_eq!(container.get_document("a").unwrap().content(), "<a>old</a>");
    }

    #[test]
    fn delete_missing_fails() {
        let temp = tempdir().unwrap();
        let container = create(&temp.path().join("c"));
        assert!(matches!(
            container.delete_document("nope"),
            Err(ContainerError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn stream_put() {
        let temp = tempdir().unwrap();
        let container = create(&temp.path().join("c"));

        let stream = InputStream::from_reader(Cursor::new(b"<s/>".to_vec()), "memory");
        container.put_document_from_stream("s", stream).unwrap();
        assert_eq!(container.get_document("s").unwrap().content(), "<s/>");
    }

    #[test]
    fn documents_persist_across_reopen() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("c");
        {
            let container = create(&path);
            container.put_document("a", "<a/>").unwrap();
            container.put_document("b", "<b/>").unwrap();
        }

        let container = Container::open(&path, &ContainerConfig::default()).unwrap();
        assert_eq!(container.num_documents(), 2);
        assert_eq!(container.get_document("b").unwrap().content(), "<b/>");
    }

    #[test]
    fn deferred_writes_flush_on_drop() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("c");
        drop(create(&path));

        {
            let config = ContainerConfig::new().sync_on_write(false);
            let container = Container::open(&path, &config).unwrap();
            container.put_document("late", "<late/>").unwrap();

            let reader = Container::open(&path, &ContainerConfig::new().read_only(true)).unwrap();
            assert_eq!(reader.num_documents(), 0);
        }

        let reader = Container::open(&path, &ContainerConfig::new().read_only(true)).unwrap();
        assert_eq!(reader.num_documents(), 1);
    }

    #[test]
    fn read_only_rejects_writes() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("c");
        create(&path).put_document("a", "<a/>").unwrap();

        let reader = Container::open(&path, &ContainerConfig::new().read_only(true)).unwrap();
        assert!(reader.is_read_only());
        assert!(matches!(
            reader.put_document("b", "<b/>"),
            Err(ContainerError::ReadOnly { .. })
        ));
        assert!(matches!(
            reader.delete_document("a"),
            Err(ContainerError::ReadOnly { .. })
        ));
        assert_eq!(reader.num_documents(), 1);
    }

    #[test]
    fn all_documents_is_a_snapshot() {
        let temp = tempdir().unwrap();
        let container = create(&temp.path().join("c"));
        container.put_document("a", "<a/>").unwrap();

        let results = container.all_documents();
        container.put_document("b", "<b/>").unwrap();

        let names: Vec<_> = results.map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["a"]);
    }
}
