//! # bsonedit core
//!
//! The document session state machine for bsonedit.
//!
//! A [`Document`] wraps one byte store with load/edit/persist
//! semantics: the stored BSON is rendered to editable JSON text at
//! construction, every edit is re-validated, and only valid content is
//! ever converted back and written. An invalid edit — or a file that
//! does not decode at all — leaves the stored bytes untouched.
//!
//! ## Example
//!
//! ```
//! use bsonedit_core::{Document, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let probe = store.clone();
//!
//! let mut document = Document::open(Box::new(store), "notes.bson");
//! document.set_content(r#"{"note": "hello"}"#);
//! assert!(document.is_valid());
//! document.save();
//! assert!(!probe.data().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;

pub use bsonedit_codec::TextOptions;
pub use bsonedit_storage::{ByteStore, FileStore, MemoryStore, StorageError};
pub use document::Document;

/// Core library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
