//! Check command implementation.

use bsonedit_core::Document;
use std::path::Path;

/// Runs the check command: reports whether the file is a valid BSON
/// record stream, failing the process when it is not.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::open_path(path)?;
    if document.is_valid() {
        let kind = if document.has_multiple_entries() {
            "record stream"
        } else if document.to_json().is_empty() {
            "empty"
        } else {
            "single record"
        };
        println!("{}: valid BSON ({kind})", path.display());
        Ok(())
    } else {
        let message = document
            .error_message()
            .unwrap_or("file is not valid BSON");
        Err(message.to_owned().into())
    }
}
