//! Dynamic BSON value type.

/// A dynamic BSON value.
///
/// This type represents any element value the codec can move between the
/// binary wire form and the JSON text form. Embedded documents preserve
/// field order, which is significant in BSON.
///
/// Deprecated element types (undefined, DBPointer, JavaScript code,
/// symbol) and Decimal128 are intentionally not represented; the wire
/// decoder rejects them as unsupported.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit IEEE 754 floating point (element type 0x01).
    Double(f64),
    /// UTF-8 string (0x02). May contain interior NUL bytes.
    String(String),
    /// Embedded document (0x03). Field order is preserved.
    Document(Vec<(String, Value)>),
    /// Array (0x04).
    Array(Vec<Value>),
    /// Binary data (0x05).
    Binary {
        /// BSON binary subtype byte.
        subtype: u8,
        /// Raw payload bytes.
        data: Vec<u8>,
    },
    /// ObjectId, 12 raw bytes (0x07).
    ObjectId([u8; 12]),
    /// Boolean (0x08).
    Boolean(bool),
    /// UTC datetime, milliseconds since the Unix epoch (0x09).
    DateTime(i64),
    /// Null (0x0a).
    Null,
    /// Regular expression (0x0b).
    Regex {
        /// Pattern source. NUL-terminated on the wire, so it cannot
        /// contain NUL bytes.
        pattern: String,
        /// Option flags, e.g. `"i"`.
        options: String,
    },
    /// 32-bit signed integer (0x10).
    Int32(i32),
    /// Internal replication timestamp (0x11).
    Timestamp {
        /// Seconds since the Unix epoch.
        time: u32,
        /// Ordinal within the second.
        increment: u32,
    },
    /// 64-bit signed integer (0x12).
    Int64(i64),
    /// MinKey sentinel (0xff).
    MinKey,
    /// MaxKey sentinel (0x7f).
    MaxKey,
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an `i64`, widening from Int32 if needed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a double, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Get this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get this value's fields, if it is a document.
    pub fn as_document(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Document(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a field in this document value.
    ///
    /// Returns the first match when the document carries duplicate keys
    /// (possible for wire-decoded values; the text parser rejects them).
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Document(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Boolean(true).is_null());

        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Int32(42).as_bool(), None);

        assert_eq!(Value::Int32(42).as_i64(), Some(42));
        assert_eq!(Value::Int64(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::String("42".to_string()).as_i64(), None);

        assert_eq!(Value::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::String("hello".to_string()).as_str(), Some("hello"));

        let array = Value::Array(vec![Value::Int32(1)]);
        assert_eq!(array.as_array(), Some(&[Value::Int32(1)][..]));
        assert_eq!(array.as_document(), None);

        let doc = Value::Document(vec![("a".to_string(), Value::Null)]);
        assert_eq!(
            doc.as_document(),
            Some(&[("a".to_string(), Value::Null)][..])
        );
        assert_eq!(doc.as_array(), None);
    }

    #[test]
    fn document_get() {
        let doc = Value::Document(vec![
            ("name".to_string(), Value::from("Alice")),
            ("age".to_string(), Value::from(30)),
        ]);

        assert_eq!(doc.get("name"), Some(&Value::String("Alice".to_string())));
        assert_eq!(doc.get("age"), Some(&Value::Int32(30)));
        assert_eq!(doc.get("missing"), None);
        assert_eq!(Value::Null.get("name"), None);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(42i32), Value::Int32(42));
        assert_eq!(Value::from(42i64), Value::Int64(42));
        assert_eq!(Value::from(2.5f64), Value::Double(2.5));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(
            Value::from(vec![1i32, 2, 3]),
            Value::Array(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)])
        );
    }
}
