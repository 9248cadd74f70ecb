//! BSON wire-format encoder.

use crate::error::EncodeError;
use crate::value::Value;

/// Encode exactly one record to its wire form.
///
/// The top level must be a document; BSON has no scalar or array
/// top-level encoding.
///
/// # Errors
///
/// Returns an error if the value is not a document, or if a key or
/// regex component contains a NUL byte.
pub fn encode_document(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let Value::Document(fields) = value else {
        return Err(EncodeError::TopLevelNotDocument);
    };
    let mut encoder = WireEncoder::new();
    encoder.write_document(fields)?;
    Ok(encoder.into_bytes())
}

/// Encode a sequence of records to one concatenated byte stream.
///
/// Records are laid back-to-back with no separator; the wire form is
/// self-delimiting.
///
/// # Errors
///
/// Returns the first error produced by any single record.
pub fn encode_stream(records: &[Value]) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = WireEncoder::new();
    for record in records {
        let Value::Document(fields) = record else {
            return Err(EncodeError::TopLevelNotDocument);
        };
        encoder.write_document(fields)?;
    }
    Ok(encoder.into_bytes())
}

/// A BSON wire encoder.
///
/// Size prefixes are written as placeholders and patched once a
/// document body is complete, so the output is produced in one pass.
pub struct WireEncoder {
    buffer: Vec<u8>,
}

impl WireEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Append one document to the buffer.
    pub fn write_document(&mut self, fields: &[(String, Value)]) -> Result<(), EncodeError> {
        let start = self.begin_document();
        for (key, value) in fields {
            self.write_element(key, value)?;
        }
        self.end_document(start)
    }

    fn begin_document(&mut self) -> usize {
        let start = self.buffer.len();
        // Placeholder for the size field, patched in end_document.
        self.buffer.extend_from_slice(&[0u8; 4]);
        start
    }

    fn end_document(&mut self, start: usize) -> Result<(), EncodeError> {
        self.buffer.push(0);
        let size =
            i32::try_from(self.buffer.len() - start).map_err(|_| EncodeError::RecordTooLarge)?;
        self.buffer[start..start + 4].copy_from_slice(&size.to_le_bytes());
        Ok(())
    }

    fn write_element(&mut self, key: &str, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Double(f) => {
                self.buffer.push(0x01);
                self.write_cstring(key)?;
                self.buffer.extend_from_slice(&f.to_le_bytes());
            }
            Value::String(s) => {
                self.buffer.push(0x02);
                self.write_cstring(key)?;
                self.write_string(s)?;
            }
            Value::Document(fields) => {
                self.buffer.push(0x03);
                self.write_cstring(key)?;
                self.write_document(fields)?;
            }
            Value::Array(items) => {
                self.buffer.push(0x04);
                self.write_cstring(key)?;
                // Arrays are documents keyed by the ascending index.
                let start = self.begin_document();
                for (index, item) in items.iter().enumerate() {
                    self.write_element(&index.to_string(), item)?;
                }
                self.end_document(start)?;
            }
            Value::Binary { subtype, data } => {
                self.buffer.push(0x05);
                self.write_cstring(key)?;
                let len = i32::try_from(data.len()).map_err(|_| EncodeError::RecordTooLarge)?;
                self.buffer.extend_from_slice(&len.to_le_bytes());
                self.buffer.push(*subtype);
                self.buffer.extend_from_slice(data);
            }
            Value::ObjectId(id) => {
                self.buffer.push(0x07);
                self.write_cstring(key)?;
                self.buffer.extend_from_slice(id);
            }
            Value::Boolean(b) => {
                self.buffer.push(0x08);
                self.write_cstring(key)?;
                self.buffer.push(u8::from(*b));
            }
            Value::DateTime(ms) => {
                self.buffer.push(0x09);
                self.write_cstring(key)?;
                self.buffer.extend_from_slice(&ms.to_le_bytes());
            }
            Value::Null => {
                self.buffer.push(0x0a);
                self.write_cstring(key)?;
            }
            Value::Regex { pattern, options } => {
                self.buffer.push(0x0b);
                self.write_cstring(key)?;
                self.write_cstring(pattern)?;
                self.write_cstring(options)?;
            }
            Value::Int32(n) => {
                self.buffer.push(0x10);
                self.write_cstring(key)?;
                self.buffer.extend_from_slice(&n.to_le_bytes());
            }
            Value::Timestamp { time, increment } => {
                self.buffer.push(0x11);
                self.write_cstring(key)?;
                self.buffer.extend_from_slice(&increment.to_le_bytes());
                self.buffer.extend_from_slice(&time.to_le_bytes());
            }
            Value::Int64(n) => {
                self.buffer.push(0x12);
                self.write_cstring(key)?;
                self.buffer.extend_from_slice(&n.to_le_bytes());
            }
            Value::MinKey => {
                self.buffer.push(0xff);
                self.write_cstring(key)?;
            }
            Value::MaxKey => {
                self.buffer.push(0x7f);
                self.write_cstring(key)?;
            }
        }
        Ok(())
    }

    fn write_cstring(&mut self, text: &str) -> Result<(), EncodeError> {
        if text.as_bytes().contains(&0) {
            return Err(EncodeError::NulInCstring {
                text: text.to_string(),
            });
        }
        self.buffer.extend_from_slice(text.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> Result<(), EncodeError> {
        let len = i32::try_from(text.len() + 1).map_err(|_| EncodeError::RecordTooLarge)?;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        self.buffer.extend_from_slice(text.as_bytes());
        self.buffer.push(0);
        Ok(())
    }
}

impl Default for WireEncoder {
    fn default() -> Self {
        Self::new()
    }
}
