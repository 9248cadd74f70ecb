//! Conversion commands between BSON files and JSON text.

use bsonedit_codec::{
    decode_stream, encode_document, encode_stream, parse_json_lines, parse_text, render_compact,
    render_pretty, TextOptions, LINE_SEPARATOR,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Runs the to-json command.
///
/// A single record is pretty-printed; a concatenated stream becomes one
/// compact JSON line per record.
pub fn to_json(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let records = decode_stream(&bytes)?;
    info!(records = records.len(), "decoded record stream");

    let text = match records.as_slice() {
        [] => String::new(),
        [record] => render_pretty(record, &TextOptions::default()),
        records => {
            let lines: Vec<String> = records.iter().map(render_compact).collect();
            lines.join(LINE_SEPARATOR)
        }
    };

    match output {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

/// Runs the from-json command.
///
/// Applies the same single-vs-stream classification as an editing
/// session: two or more non-blank lines that each parse on their own
/// become a record stream, anything else must parse as one record.
pub fn from_json(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(input)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fs::write(output, b"")?;
        return Ok(());
    }

    let bytes = match parse_json_lines(&text) {
        Some(records) => {
            info!(records = records.len(), "encoding JSON-Lines stream");
            encode_stream(&records)?
        }
        None => encode_document(&parse_text(trimmed)?)?,
    };

    fs::write(output, bytes)?;
    Ok(())
}
