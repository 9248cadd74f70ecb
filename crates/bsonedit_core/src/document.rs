//! The editable document session.

use bsonedit_codec::{
    decode_stream, encode_document, encode_stream, parse_json_lines, parse_text, render_compact,
    render_pretty, TextOptions, LINE_SEPARATOR,
};
use bsonedit_storage::{ByteStore, FileStore, StorageResult};
use std::path::Path;
use tracing::{debug, error, info};

/// One editing session over one BSON file.
///
/// A document loads eagerly at construction: the stored bytes are
/// decoded and rendered to JSON text — pretty-printed for a single
/// record, one compact line per record for a concatenated stream. From
/// then on the session tracks whatever the editor hands to
/// [`set_content`](Self::set_content), marking it valid or invalid, and
/// [`save`](Self::save) converts the text back to bytes **only while
/// the content is valid**. Invalid content stays visible and editable
/// but can never overwrite the previously stored bytes.
///
/// A load failure is captured as state (empty text, invalid, an error
/// message naming the file), never surfaced as an error value; the
/// stored bytes stay untouched for recovery.
///
/// Documents expect to be owned by a single logical editing session;
/// concurrent mutation must be serialized by the caller.
pub struct Document {
    store: Box<dyn ByteStore>,
    name: String,
    options: TextOptions,
    text: Option<String>,
    valid: bool,
    error: Option<String>,
    multi: bool,
}

impl Document {
    /// Opens a session over `store`, loading and converting the current
    /// bytes eagerly. `name` is used in diagnostics only.
    pub fn open(store: Box<dyn ByteStore>, name: impl Into<String>) -> Self {
        Self::open_with_options(store, name, TextOptions::default())
    }

    /// Opens a session with explicit text rendering options.
    pub fn open_with_options(
        store: Box<dyn ByteStore>,
        name: impl Into<String>,
        options: TextOptions,
    ) -> Self {
        let mut document = Self {
            store,
            name: name.into(),
            options,
            text: None,
            valid: true,
            error: None,
            multi: false,
        };
        document.load();
        document
    }

    /// Opens a session over a file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened; a file that opens
    /// but does not decode yields a document in the invalid state
    /// instead.
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let store = FileStore::open(path)?;
        Ok(Self::open(Box::new(store), name))
    }

    fn load(&mut self) {
        let bytes = match self.store.read_all() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(file = %self.name, %err, "failed to read file");
                self.fail_load();
                return;
            }
        };

        if bytes.is_empty() {
            // An empty file is valid; it just has nothing to show.
            self.text = Some(String::new());
            self.valid = true;
            self.error = None;
            self.multi = false;
            return;
        }

        match decode_stream(&bytes) {
            Ok(records) if records.is_empty() => {
                self.text = Some(String::new());
                self.valid = true;
                self.error = None;
                self.multi = false;
            }
            Ok(records) if records.len() == 1 => {
                self.text = Some(render_pretty(&records[0], &self.options));
                self.valid = true;
                self.error = None;
                self.multi = false;
                info!(file = %self.name, records = 1, "converted BSON content to text");
            }
            Ok(records) => {
                let lines: Vec<String> = records.iter().map(render_compact).collect();
                self.text = Some(lines.join(LINE_SEPARATOR));
                self.valid = true;
                self.error = None;
                self.multi = true;
                info!(file = %self.name, records = records.len(), "converted BSON content to text");
            }
            Err(err) => {
                debug!(file = %self.name, %err, "content is not a BSON record stream");
                self.fail_load();
            }
        }
    }

    fn fail_load(&mut self) {
        // The in-memory view is emptied; the stored bytes are not.
        self.text = Some(String::new());
        self.valid = false;
        self.error = Some(format!(
            "File does not appear to be a valid BSON:\n{}",
            self.name
        ));
        self.multi = false;
    }

    /// Replaces the session text with whatever the editor holds and
    /// re-validates it.
    ///
    /// The text is stored unconditionally — the editor must keep
    /// showing exactly what was typed, valid or not. Content with two
    /// or more non-blank lines that each parse on their own is
    /// classified as a multi-record stream; otherwise the whole text
    /// must parse as one value. When validation fails, the multi-record
    /// classification keeps its last validated state.
    pub fn set_content(&mut self, text: &str) {
        self.text = Some(text.to_owned());

        if text.trim().is_empty() {
            self.valid = true;
            self.error = None;
            self.multi = false;
            return;
        }

        if parse_json_lines(text).is_some() {
            self.valid = true;
            self.error = None;
            self.multi = true;
            return;
        }

        // A single record, possibly pretty-printed across many lines.
        match parse_text(text.trim()) {
            Ok(_) => {
                self.valid = true;
                self.error = None;
                self.multi = false;
            }
            Err(err) => {
                debug!(file = %self.name, %err, "content is not valid JSON");
                self.valid = false;
            }
        }
    }

    /// Writes the current content back to the store as BSON.
    ///
    /// Invalid content is never written: the previously stored bytes
    /// survive an in-progress bad edit. Empty content writes zero bytes
    /// explicitly — encoding "no value" would produce a document that
    /// renders as a spurious null record on the next load. The
    /// single-vs-stream classification is re-derived from the current
    /// text rather than trusting the stored flag.
    pub fn save(&mut self) {
        if !self.valid {
            debug!(file = %self.name, "not saving invalid content to preserve the stored bytes");
            return;
        }
        let Some(text) = self.text.clone() else {
            return;
        };

        if text.trim().is_empty() {
            self.write(&[]);
            return;
        }

        let encoded = match parse_json_lines(&text) {
            Some(records) => encode_stream(&records).map_err(|err| err.to_string()),
            None => parse_text(text.trim())
                .map_err(|err| err.to_string())
                .and_then(|record| encode_document(&record).map_err(|err| err.to_string())),
        };

        match encoded {
            Ok(bytes) => self.write(&bytes),
            Err(err) => {
                // Reachable: a lone scalar passes JSON validation but
                // has no top-level wire form. The stored bytes stay
                // untouched either way.
                error!(file = %self.name, %err, "failed to convert JSON to BSON");
                self.valid = false;
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        if let Err(err) = self.store.write_all(bytes) {
            error!(file = %self.name, %err, "failed to write file");
        }
    }

    /// The current text rendering; empty when invalid or never loaded.
    #[must_use]
    pub fn to_json(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether the current content converts to BSON.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The message for the most recent load failure, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the content is classified as a multi-record stream.
    #[must_use]
    pub fn has_multiple_entries(&self) -> bool {
        self.multi
    }

    /// The display name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("valid", &self.valid)
            .field("multi", &self.multi)
            .finish_non_exhaustive()
    }
}
