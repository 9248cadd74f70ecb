//! BSON wire-format decoder.
//!
//! BSON is a little-endian binary format. Every document is
//! length-prefixed and self-delimiting, so a stream is documents laid
//! back-to-back with no outer framing.

use crate::error::DecodeError;
use crate::value::Value;

/// Maximum nesting depth for embedded documents and arrays.
/// This prevents stack exhaustion from deeply nested untrusted input.
const MAX_DEPTH: usize = 128;

/// Smallest well-formed document: the size field plus the terminator.
const MIN_DOCUMENT_SIZE: usize = 5;

/// Decode exactly one record from a byte buffer.
///
/// # Errors
///
/// Returns an error if the bytes are not one well-formed BSON document,
/// including the case of trailing bytes after the record.
pub fn decode_document(bytes: &[u8]) -> Result<Value, DecodeError> {
    let mut decoder = WireDecoder::new(bytes);
    let record = decoder.read_document()?;
    if !decoder.is_empty() {
        return Err(DecodeError::size_mismatch(format!(
            "{} trailing bytes after the record",
            decoder.remaining_len()
        )));
    }
    Ok(record)
}

/// Decode zero or more concatenated records from a byte buffer.
///
/// Repeatedly invokes the single-record reader until input is
/// exhausted. A zero-length input yields an empty stream.
///
/// # Errors
///
/// Returns an error if any byte range cannot be parsed as a
/// well-formed record.
pub fn decode_stream(bytes: &[u8]) -> Result<Vec<Value>, DecodeError> {
    let mut decoder = WireDecoder::new(bytes);
    let mut records = Vec::new();
    while !decoder.is_empty() {
        records.push(decoder.read_document()?);
    }
    Ok(records)
}

/// A cursor-based BSON decoder.
///
/// Validates all declared sizes against the actual input so corrupt
/// length fields cannot cause reads past the buffer or silent
/// mis-framing of a concatenated stream.
pub struct WireDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> WireDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read the next record at the cursor.
    pub fn read_document(&mut self) -> Result<Value, DecodeError> {
        Ok(Value::Document(self.read_document_fields()?))
    }

    fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.data.len() - self.pos {
            return Err(DecodeError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.read_exact(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let bytes = self.read_exact(8)?;
        Ok(i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.read_exact(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Reads a NUL-terminated key or regex component.
    fn read_cstring(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos] != 0 {
            self.pos += 1;
        }
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| DecodeError::InvalidUtf8)?;
        self.pos += 1; // skip the NUL terminator
        Ok(text.to_string())
    }

    /// Reads a length-prefixed string. The declared length includes the
    /// trailing NUL.
    fn read_string(&mut self) -> Result<String, DecodeError> {
        let declared = self.read_i32()?;
        if declared < 1 {
            return Err(DecodeError::size_mismatch(format!(
                "string length {declared} is below the 1-byte minimum"
            )));
        }
        let bytes = self.read_exact(declared as usize)?;
        let (content, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator != [0] {
            return Err(DecodeError::size_mismatch(
                "string is not NUL-terminated at its declared length",
            ));
        }
        let text = std::str::from_utf8(content).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(text.to_string())
    }

    fn read_document_fields(&mut self) -> Result<Vec<(String, Value)>, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::DepthLimitExceeded {
                max_depth: MAX_DEPTH,
            });
        }
        self.depth += 1;
        let fields = self.read_document_body();
        self.depth -= 1;
        fields
    }

    fn read_document_body(&mut self) -> Result<Vec<(String, Value)>, DecodeError> {
        let start = self.pos;
        let declared = self.read_i32()?;
        if declared < MIN_DOCUMENT_SIZE as i32 {
            return Err(DecodeError::size_mismatch(format!(
                "document size {declared} is below the {MIN_DOCUMENT_SIZE}-byte minimum"
            )));
        }
        let size = declared as usize;
        if size > self.data.len() - start {
            return Err(DecodeError::UnexpectedEof);
        }
        // One past the terminator byte.
        let end = start + size;

        let mut fields = Vec::new();
        loop {
            if self.pos >= end {
                return Err(DecodeError::size_mismatch(
                    "document is missing its terminator",
                ));
            }
            let element_type = self.read_u8()?;
            if element_type == 0 {
                if self.pos != end {
                    return Err(DecodeError::size_mismatch(
                        "document is shorter than its declared size",
                    ));
                }
                break;
            }
            let key = self.read_cstring()?;
            let value = self.read_element(element_type)?;
            if self.pos > end {
                return Err(DecodeError::size_mismatch(
                    "element crosses the declared document end",
                ));
            }
            fields.push((key, value));
        }
        Ok(fields)
    }

    fn read_element(&mut self, element_type: u8) -> Result<Value, DecodeError> {
        match element_type {
            0x01 => Ok(Value::Double(self.read_f64()?)),
            0x02 => Ok(Value::String(self.read_string()?)),
            0x03 => Ok(Value::Document(self.read_document_fields()?)),
            0x04 => {
                // Arrays are documents with ascending numeric keys; the
                // keys are redundant and dropped.
                let fields = self.read_document_fields()?;
                Ok(Value::Array(fields.into_iter().map(|(_, v)| v).collect()))
            }
            0x05 => {
                let declared = self.read_i32()?;
                if declared < 0 {
                    return Err(DecodeError::size_mismatch(format!(
                        "negative binary length {declared}"
                    )));
                }
                let subtype = self.read_u8()?;
                let data = self.read_exact(declared as usize)?.to_vec();
                Ok(Value::Binary { subtype, data })
            }
            0x07 => {
                let bytes = self.read_exact(12)?;
                let mut id = [0u8; 12];
                id.copy_from_slice(bytes);
                Ok(Value::ObjectId(id))
            }
            0x08 => match self.read_u8()? {
                0 => Ok(Value::Boolean(false)),
                1 => Ok(Value::Boolean(true)),
                byte => Err(DecodeError::malformed(format!(
                    "invalid boolean byte 0x{byte:02x}"
                ))),
            },
            0x09 => Ok(Value::DateTime(self.read_i64()?)),
            0x0a => Ok(Value::Null),
            0x0b => {
                let pattern = self.read_cstring()?;
                let options = self.read_cstring()?;
                Ok(Value::Regex { pattern, options })
            }
            0x10 => Ok(Value::Int32(self.read_i32()?)),
            0x11 => {
                // Low half is the increment, high half the seconds.
                let increment = self.read_u32()?;
                let time = self.read_u32()?;
                Ok(Value::Timestamp { time, increment })
            }
            0x12 => Ok(Value::Int64(self.read_i64()?)),
            0xff => Ok(Value::MinKey),
            0x7f => Ok(Value::MaxKey),
            type_byte => Err(DecodeError::UnsupportedType { type_byte }),
        }
    }
}
