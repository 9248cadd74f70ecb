//! File-based byte store for persistent storage.

use crate::error::StorageResult;
use crate::store::ByteStore;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A byte store backed by one file on disk.
///
/// The file is opened once and the handle kept for the life of the
/// store, matching an editing session that holds its file open.
///
/// # Durability
///
/// `write_all` truncates, rewrites and then calls `File::sync_all()`,
/// so a completed write survives process termination.
///
/// # Example
///
/// ```no_run
/// use bsonedit_storage::{ByteStore, FileStore};
/// use std::path::Path;
///
/// let mut store = FileStore::open(Path::new("data.bson")).unwrap();
/// store.write_all(b"new contents").unwrap();
/// assert_eq!(store.read_all().unwrap(), b"new contents");
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: RwLock<File>,
}

impl FileStore {
    /// Opens or creates a file store at the given path.
    ///
    /// An existing file keeps its contents; a missing file is created
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
        })
    }

    /// Opens or creates a file store, creating parent directories if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStore for FileStore {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write_all(&mut self, data: &[u8]) -> StorageResult<()> {
        let mut file = self.file.write();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        let file = self.file.read();
        Ok(file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bson");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.is_empty().unwrap());
        assert!(path.exists());
    }

    #[test]
    fn file_keeps_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bson");
        std::fs::write(&path, b"already here").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.read_all().unwrap(), b"already here");
    }

    #[test]
    fn file_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bson");

        let mut store = FileStore::open(&path).unwrap();
        store.write_all(b"first, a long payload").unwrap();
        store.write_all(b"short").unwrap();

        assert_eq!(store.read_all().unwrap(), b"short");
        assert_eq!(store.len().unwrap(), 5);
    }

    #[test]
    fn file_write_empty_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bson");

        let mut store = FileStore::open(&path).unwrap();
        store.write_all(b"contents").unwrap();
        store.write_all(b"").unwrap();

        assert!(store.is_empty().unwrap());
        assert_eq!(store.read_all().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn file_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bson");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.write_all(b"persistent data").unwrap();
        }

        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.read_all().unwrap(), b"persistent data");
        }
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("test.bson");

        let store = FileStore::open_with_create_dirs(&path).unwrap();
        assert_eq!(store.len().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bson");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.path(), path);
    }
}
