//! View command implementation.

use bsonedit_core::Document;
use std::path::Path;

/// Runs the view command: prints the editable text form of the file.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::open_path(path)?;
    if !document.is_valid() {
        let message = document
            .error_message()
            .unwrap_or("file is not valid BSON");
        return Err(message.to_owned().into());
    }
    println!("{}", document.to_json());
    Ok(())
}
