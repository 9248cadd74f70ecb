//! In-memory byte store for testing.

use crate::error::StorageResult;
use crate::store::ByteStore;
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory byte store.
///
/// Suitable for unit tests and ephemeral sessions that don't need
/// persistence. The buffer is shared: clones refer to the same
/// contents, so a test can keep a probe handle while a document owns
/// the store, and observe what was written.
///
/// # Example
///
/// ```rust
/// use bsonedit_storage::{ByteStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let probe = store.clone();
/// store.write_all(b"test data").unwrap();
/// assert_eq!(probe.data(), b"test data");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<Vec<u8>>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store with pre-existing contents.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Clears the contents.
    pub fn clear(&mut self) {
        self.data.write().clear();
    }
}

impl ByteStore for MemoryStore {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        Ok(self.data.read().clone())
    }

    fn write_all(&mut self, data: &[u8]) -> StorageResult<()> {
        let mut contents = self.data.write();
        contents.clear();
        contents.extend_from_slice(data);
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }
}
