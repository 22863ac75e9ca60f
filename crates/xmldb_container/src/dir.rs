//! Container directory management.
//!
//! ```text
//! <container_path>/
//! ├─ DOCUMENTS         # Checksummed document snapshot
//! └─ LOCK              # Advisory lock held by the read-write handle
//! ```
//!
//! Read-write opens hold an exclusive lock on `LOCK` for as long as the
//! directory handle lives. Read-only opens take no lock and see the last
//! snapshot that was renamed into place.

use crate::error::{ContainerError, ContainerResult};
use crate::format;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const DOCUMENTS_FILE: &str = "DOCUMENTS";
const DOCUMENTS_TEMP: &str = "DOCUMENTS.tmp";
const LOCK_FILE: &str = "LOCK";

/// Handle on a container directory.
#[derive(Debug)]
pub struct ContainerDir {
    path: PathBuf,
    /// Lock file handle, present only for read-write opens.
    lock_file: Option<File>,
}

impl ContainerDir {
    /// Returns true if a container exists at `path`.
    #[must_use]
    pub fn exists(path: &Path) -> bool {
        path.join(DOCUMENTS_FILE).is_file()
    }

    /// Creates a new, empty container directory and locks it for writing.
    ///
    /// # Errors
    ///
    /// Returns `ContainerExists` if a container is already present.
    pub fn create(path: &Path) -> ContainerResult<Self> {
        if Self::exists(path) {
            return Err(ContainerError::ContainerExists {
                path: path.to_path_buf(),
            });
        }
        fs::create_dir_all(path)?;

        let dir = Self::lock(path)?;
        dir.save(std::iter::empty())?;
        Ok(dir)
    }

    /// Opens an existing container directory.
    ///
    /// # Errors
    ///
    /// - `ContainerNotFound` if there is no container at `path`
    /// - `ContainerLocked` if a writable open finds the lock held
    pub fn open(path: &Path, read_only: bool) -> ContainerResult<Self> {
        if !Self::exists(path) {
            return Err(ContainerError::container_not_found(path));
        }
        if read_only {
            return Ok(Self {
                path: path.to_path_buf(),
                lock_file: None,
            });
        }
        Self::lock(path)
    }

    fn lock(path: &Path) -> ContainerResult<Self> {
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(ContainerError::ContainerLocked {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            lock_file: Some(lock_file),
        })
    }

    /// Returns the container path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if this handle holds the write lock.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.lock_file.is_some()
    }

    /// Loads the document snapshot.
    pub fn load(&self) -> ContainerResult<Vec<(String, String)>> {
        let mut file = File::open(self.path.join(DOCUMENTS_FILE))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        format::decode(&data)
    }

    /// Saves the document snapshot atomically (write, sync, rename).
    pub fn save<'a, I>(&self, documents: I) -> ContainerResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if !self.is_writable() {
            return Err(ContainerError::read_only(&self.path));
        }

        let temp_path = self.path.join(DOCUMENTS_TEMP);
        let data = format::encode(documents)?;
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.path.join(DOCUMENTS_FILE))?;
        self.sync_directory()?;
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> ContainerResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> ContainerResult<()> {
        Ok(())
    }
}
