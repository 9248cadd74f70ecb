//! # bsonedit codec
//!
//! Conversion between the BSON wire format and an editable JSON text
//! form, one record at a time.
//!
//! The codec is stateless: pure functions over byte and text buffers.
//! A file is treated as a stream of self-delimiting records laid
//! back-to-back, so [`decode_stream`] recovers one or many documents
//! from a single buffer, and [`encode_stream`] writes them back with no
//! separator.
//!
//! On the text side, parsing is strict — duplicate keys are rejected so
//! an edit can never silently drop data — and BSON-specific types render
//! as Extended JSON `$` wrappers that parse back to the same value.
//!
//! ## Usage
//!
//! ```
//! use bsonedit_codec::{decode_stream, encode_document, parse_text, render_compact};
//!
//! let record = parse_text(r#"{"name":"test"}"#).unwrap();
//! let bytes = encode_document(&record).unwrap();
//! let decoded = decode_stream(&bytes).unwrap();
//! assert_eq!(render_compact(&decoded[0]), r#"{"name":"test"}"#);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod options;
mod text;
mod value;

pub use decoder::{decode_document, decode_stream, WireDecoder};
pub use encoder::{encode_document, encode_stream, WireEncoder};
pub use error::{DecodeError, EncodeError, TextError};
pub use options::TextOptions;
pub use text::{
    parse_json_lines, parse_text, render_compact, render_pretty, LINE_SEPARATOR,
};
pub use value::Value;
