//! JSON text form of BSON values.
//!
//! Parsing is strict: duplicate keys inside one object are rejected at
//! every nesting level, and `$`-prefixed wrapper objects (the Extended
//! JSON convention) are converted to their typed values. Rendering
//! always uses `\n` line terminators so the text form is stable across
//! platforms and editor diffing stays deterministic.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::TextError;
use crate::options::TextOptions;
use crate::value::Value;

/// The canonical line terminator of the text form, independent of the
/// host platform.
pub const LINE_SEPARATOR: &str = "\n";

/// Parse one JSON value from text.
///
/// # Errors
///
/// Returns an error on malformed JSON, a duplicate key within one
/// object, an unrecognized or malformed `$` wrapper, or an integer
/// outside the signed 64-bit range.
pub fn parse_text(text: &str) -> Result<Value, TextError> {
    Ok(serde_json::from_str(text)?)
}

/// Render a value as multi-line indented JSON.
///
/// Lines are joined with [`LINE_SEPARATOR`]; the indent comes from
/// `options`.
pub fn render_pretty(value: &Value, options: &TextOptions) -> String {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(options.indent.as_bytes());
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    // Value serialization is total and the Vec sink cannot fail.
    let _ = value.serialize(&mut serializer);
    String::from_utf8(out).unwrap_or_default()
}

/// Render a value as single-line JSON, used as one line of a
/// multi-record stream.
pub fn render_compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Parse text as JSON-Lines: two or more non-blank lines, each one a
/// standalone JSON value.
///
/// Returns the parsed records in line order, or `None` when the text
/// does not classify as JSON-Lines — fewer than two non-blank lines, or
/// any line that does not parse on its own. A single line is never
/// JSON-Lines even if it parses, so a lone record keeps its
/// single-record rendering.
pub fn parse_json_lines(text: &str) -> Option<Vec<Value>> {
    let lines: Vec<&str> = text
        .split(LINE_SEPARATOR)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 2 {
        return None;
    }
    lines.iter().map(|line| parse_text(line).ok()).collect()
}

// ---------------------------------------------------------------------
// Rendering

/// `{"$numberLong":"<n>"}`
struct LongWrapper(i64);

impl Serialize for LongWrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$numberLong", &self.0.to_string())?;
        map.end()
    }
}

/// `{"base64":"<b64>","subType":"<2 hex>"}`
struct BinaryBody<'a> {
    subtype: u8,
    data: &'a [u8],
}

impl Serialize for BinaryBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("base64", &BASE64.encode(self.data))?;
        map.serialize_entry("subType", &format!("{:02x}", self.subtype))?;
        map.end()
    }
}

/// `{"pattern":"<p>","options":"<o>"}`
struct RegexBody<'a> {
    pattern: &'a str,
    options: &'a str,
}

impl Serialize for RegexBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("pattern", self.pattern)?;
        map.serialize_entry("options", self.options)?;
        map.end()
    }
}

/// `{"t":<u32>,"i":<u32>}`
struct TimestampBody {
    time: u32,
    increment: u32,
}

impl Serialize for TimestampBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("t", &self.time)?;
        map.serialize_entry("i", &self.increment)?;
        map.end()
    }
}

fn wrapper_entry<S: Serializer, T: Serialize>(
    serializer: S,
    key: &str,
    body: &T,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, body)?;
    map.end()
}

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int32(n) => serializer.serialize_i32(*n),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Double(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Double(f) => wrapper_entry(serializer, "$numberDouble", &non_finite_name(*f)),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Document(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::ObjectId(id) => wrapper_entry(serializer, "$oid", &hex_string(id)),
            Value::DateTime(ms) => wrapper_entry(serializer, "$date", &LongWrapper(*ms)),
            Value::Binary { subtype, data } => wrapper_entry(
                serializer,
                "$binary",
                &BinaryBody {
                    subtype: *subtype,
                    data,
                },
            ),
            Value::Regex { pattern, options } => wrapper_entry(
                serializer,
                "$regularExpression",
                &RegexBody { pattern, options },
            ),
            Value::Timestamp { time, increment } => wrapper_entry(
                serializer,
                "$timestamp",
                &TimestampBody {
                    time: *time,
                    increment: *increment,
                },
            ),
            Value::MinKey => wrapper_entry(serializer, "$minKey", &1i32),
            Value::MaxKey => wrapper_entry(serializer, "$maxKey", &1i32),
        }
    }
}

// ---------------------------------------------------------------------
// Parsing

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Boolean(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        // Integers take the narrowest width that holds them, matching
        // the wire format's own int32/int64 split.
        Ok(match i32::try_from(n) {
            Ok(small) => Value::Int32(small),
            Err(_) => Value::Int64(n),
        })
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        match i64::try_from(n) {
            Ok(signed) => self.visit_i64(signed),
            Err(_) => Err(E::custom(format!(
                "integer {n} does not fit a signed 64-bit value"
            ))),
        }
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Double(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_owned()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut fields: Vec<(String, Value)> = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: Value = map.next_value()?;
            if fields.iter().any(|(existing, _)| *existing == key) {
                return Err(de::Error::custom(format!("duplicate key {key:?}")));
            }
            fields.push((key, value));
        }
        unwrap_extended(fields).map_err(de::Error::custom)
    }
}

/// Converts a parsed object into its typed value when it is an Extended
/// JSON wrapper; an object whose first key starts with `$` but does not
/// form a recognized wrapper is rejected so it cannot silently change
/// meaning on the next render.
fn unwrap_extended(fields: Vec<(String, Value)>) -> Result<Value, String> {
    let wrapper_shaped = fields
        .first()
        .is_some_and(|(key, _)| key.starts_with('$'));
    if !wrapper_shaped {
        return Ok(Value::Document(fields));
    }
    match fields.as_slice() {
        [(key, Value::String(hex))] if key == "$oid" => parse_object_id(hex).map(Value::ObjectId),
        [(key, value)] if key == "$date" => parse_date(value),
        [(key, Value::Document(body))] if key == "$binary" => parse_binary(body),
        [(key, Value::Document(body))] if key == "$regularExpression" => parse_regex(body),
        [(key, Value::Document(body))] if key == "$timestamp" => parse_timestamp(body),
        [(key, Value::String(digits))] if key == "$numberInt" => digits
            .parse::<i32>()
            .map(Value::Int32)
            .map_err(|_| format!("invalid $numberInt value {digits:?}")),
        [(key, Value::String(digits))] if key == "$numberLong" => digits
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|_| format!("invalid $numberLong value {digits:?}")),
        [(key, Value::String(digits))] if key == "$numberDouble" => digits
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| format!("invalid $numberDouble value {digits:?}")),
        [(key, Value::Int32(1))] if key == "$minKey" => Ok(Value::MinKey),
        [(key, Value::Int32(1))] if key == "$maxKey" => Ok(Value::MaxKey),
        _ => Err(format!(
            "unrecognized extended JSON wrapper starting with key {:?}",
            fields[0].0
        )),
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn parse_object_id(hex: &str) -> Result<[u8; 12], String> {
    let bytes = hex.as_bytes();
    if bytes.len() != 24 {
        return Err(format!(
            "$oid must be 24 hex characters, got {}",
            bytes.len()
        ));
    }
    let mut id = [0u8; 12];
    for (slot, pair) in id.iter_mut().zip(bytes.chunks_exact(2)) {
        let hi = hex_digit(pair[0]).ok_or_else(|| format!("invalid hex in $oid: {hex:?}"))?;
        let lo = hex_digit(pair[1]).ok_or_else(|| format!("invalid hex in $oid: {hex:?}"))?;
        *slot = (hi << 4) | lo;
    }
    Ok(id)
}

fn parse_date(value: &Value) -> Result<Value, String> {
    // The payload arrives post-unwrapping, so both {"$numberLong":"ms"}
    // and a bare integer show up here as an integer value.
    match value.as_i64() {
        Some(ms) => Ok(Value::DateTime(ms)),
        None => Err("$date requires an integer millisecond timestamp".to_string()),
    }
}

fn parse_binary(body: &[(String, Value)]) -> Result<Value, String> {
    let mut encoded = None;
    let mut subtype_hex = None;
    for (key, value) in body {
        match (key.as_str(), value) {
            ("base64", Value::String(s)) => encoded = Some(s),
            ("subType", Value::String(s)) => subtype_hex = Some(s),
            _ => return Err(format!("unexpected field {key:?} in $binary")),
        }
    }
    let encoded = encoded.ok_or_else(|| "missing base64 in $binary".to_string())?;
    let subtype_hex = subtype_hex.ok_or_else(|| "missing subType in $binary".to_string())?;
    if subtype_hex.len() != 2 {
        return Err(format!("subType must be 2 hex characters, got {subtype_hex:?}"));
    }
    let subtype = u8::from_str_radix(subtype_hex, 16)
        .map_err(|_| format!("invalid subType {subtype_hex:?}"))?;
    let data = BASE64
        .decode(encoded)
        .map_err(|err| format!("invalid base64 in $binary: {err}"))?;
    Ok(Value::Binary { subtype, data })
}

fn parse_regex(body: &[(String, Value)]) -> Result<Value, String> {
    let mut pattern = None;
    let mut options = None;
    for (key, value) in body {
        match (key.as_str(), value) {
            ("pattern", Value::String(s)) => pattern = Some(s.clone()),
            ("options", Value::String(s)) => options = Some(s.clone()),
            _ => return Err(format!("unexpected field {key:?} in $regularExpression")),
        }
    }
    match (pattern, options) {
        (Some(pattern), Some(options)) => Ok(Value::Regex { pattern, options }),
        _ => Err("$regularExpression requires pattern and options".to_string()),
    }
}

fn parse_timestamp(body: &[(String, Value)]) -> Result<Value, String> {
    let mut time = None;
    let mut increment = None;
    for (key, value) in body {
        let number = value
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| format!("$timestamp field {key:?} must be an unsigned 32-bit integer"))?;
        match key.as_str() {
            "t" => time = Some(number),
            "i" => increment = Some(number),
            _ => return Err(format!("unexpected field {key:?} in $timestamp")),
        }
    }
    match (time, increment) {
        (Some(time), Some(increment)) => Ok(Value::Timestamp { time, increment }),
        _ => Err("$timestamp requires t and i".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: Vec<(&str, Value)>) -> Value {
        Value::Document(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn parse_scalars() {
        assert_eq!(parse_text("null").unwrap(), Value::Null);
        assert_eq!(parse_text("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse_text("\"hi\"").unwrap(), Value::from("hi"));
        assert_eq!(parse_text("1.5").unwrap(), Value::Double(1.5));
    }

    #[test]
    fn integers_take_narrowest_width() {
        assert_eq!(parse_text("5").unwrap(), Value::Int32(5));
        assert_eq!(parse_text("-5").unwrap(), Value::Int32(-5));
        assert_eq!(
            parse_text("2147483647").unwrap(),
            Value::Int32(i32::MAX)
        );
        assert_eq!(
            parse_text("2147483648").unwrap(),
            Value::Int64(i64::from(i32::MAX) + 1)
        );
        assert_eq!(
            parse_text("-2147483649").unwrap(),
            Value::Int64(i64::from(i32::MIN) - 1)
        );
    }

    #[test]
    fn reject_integer_above_i64() {
        assert!(parse_text("18446744073709551615").is_err());
    }

    #[test]
    fn parse_document_preserves_order() {
        let parsed = parse_text(r#"{"z": 1, "a": 2}"#).unwrap();
        assert_eq!(
            parsed,
            doc(vec![("z", Value::Int32(1)), ("a", Value::Int32(2))])
        );
    }

    #[test]
    fn reject_duplicate_keys() {
        assert!(parse_text(r#"{"a": 1, "a": 2}"#).is_err());
    }

    #[test]
    fn reject_duplicate_keys_nested() {
        assert!(parse_text(r#"{"outer": {"a": 1, "a": 2}}"#).is_err());
    }

    #[test]
    fn reject_syntax_error() {
        assert!(parse_text("{not json").is_err());
        assert!(parse_text("").is_err());
        assert!(parse_text(r#"{"a": 1,}"#).is_err());
    }

    #[test]
    fn object_id_wrapper_round_trips() {
        let value = Value::ObjectId([
            0x50, 0x7f, 0x19, 0x1e, 0x81, 0x0c, 0x19, 0x72, 0x9d, 0xe8, 0x60, 0xea,
        ]);
        let text = render_compact(&value);
        assert_eq!(text, r#"{"$oid":"507f191e810c19729de860ea"}"#);
        assert_eq!(parse_text(&text).unwrap(), value);
    }

    #[test]
    fn reject_malformed_object_id() {
        assert!(parse_text(r#"{"$oid":"zz7f191e810c19729de860ea"}"#).is_err());
        assert!(parse_text(r#"{"$oid":"507f"}"#).is_err());
        assert!(parse_text(r#"{"$oid":5}"#).is_err());
    }

    #[test]
    fn date_wrapper_round_trips() {
        let value = Value::DateTime(1_356_351_330_501);
        let text = render_compact(&value);
        assert_eq!(text, r#"{"$date":{"$numberLong":"1356351330501"}}"#);
        assert_eq!(parse_text(&text).unwrap(), value);
        // A bare integer payload is also accepted.
        assert_eq!(
            parse_text(r#"{"$date":1356351330501}"#).unwrap(),
            value
        );
    }

    #[test]
    fn binary_wrapper_round_trips() {
        let value = Value::Binary {
            subtype: 0x05,
            data: vec![1, 2, 3, 4],
        };
        let text = render_compact(&value);
        assert_eq!(text, r#"{"$binary":{"base64":"AQIDBA==","subType":"05"}}"#);
        assert_eq!(parse_text(&text).unwrap(), value);
    }

    #[test]
    fn regex_wrapper_round_trips() {
        let value = Value::Regex {
            pattern: "^a.*z$".to_string(),
            options: "ix".to_string(),
        };
        let text = render_compact(&value);
        assert_eq!(
            text,
            r#"{"$regularExpression":{"pattern":"^a.*z$","options":"ix"}}"#
        );
        assert_eq!(parse_text(&text).unwrap(), value);
    }

    #[test]
    fn timestamp_wrapper_round_trips() {
        let value = Value::Timestamp {
            time: 4_000_000_000,
            increment: 1,
        };
        let text = render_compact(&value);
        assert_eq!(text, r#"{"$timestamp":{"t":4000000000,"i":1}}"#);
        assert_eq!(parse_text(&text).unwrap(), value);
    }

    #[test]
    fn min_and_max_key_round_trip() {
        assert_eq!(render_compact(&Value::MinKey), r#"{"$minKey":1}"#);
        assert_eq!(render_compact(&Value::MaxKey), r#"{"$maxKey":1}"#);
        assert_eq!(parse_text(r#"{"$minKey":1}"#).unwrap(), Value::MinKey);
        assert_eq!(parse_text(r#"{"$maxKey":1}"#).unwrap(), Value::MaxKey);
    }

    #[test]
    fn canonical_number_wrappers_parse() {
        assert_eq!(
            parse_text(r#"{"$numberInt":"42"}"#).unwrap(),
            Value::Int32(42)
        );
        assert_eq!(
            parse_text(r#"{"$numberLong":"42"}"#).unwrap(),
            Value::Int64(42)
        );
        assert_eq!(
            parse_text(r#"{"$numberDouble":"2.5"}"#).unwrap(),
            Value::Double(2.5)
        );
    }

    #[test]
    fn non_finite_doubles_round_trip() {
        let text = render_compact(&Value::Double(f64::INFINITY));
        assert_eq!(text, r#"{"$numberDouble":"Infinity"}"#);
        assert_eq!(parse_text(&text).unwrap(), Value::Double(f64::INFINITY));

        let nan = parse_text(r#"{"$numberDouble":"NaN"}"#).unwrap();
        assert!(matches!(nan, Value::Double(f) if f.is_nan()));

        assert_eq!(
            parse_text(r#"{"$numberDouble":"-Infinity"}"#).unwrap(),
            Value::Double(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn reject_unrecognized_wrapper() {
        assert!(parse_text(r#"{"$unknown": 1}"#).is_err());
        assert!(parse_text(r#"{"$oid":"507f191e810c19729de860ea","extra":1}"#).is_err());
    }

    #[test]
    fn dollar_key_not_first_is_plain_document() {
        let parsed = parse_text(r#"{"a": 1, "$oid": 2}"#).unwrap();
        assert_eq!(
            parsed,
            doc(vec![("a", Value::Int32(1)), ("$oid", Value::Int32(2))])
        );
    }

    #[test]
    fn render_pretty_uses_newlines_and_indent() {
        let record = doc(vec![
            ("name", Value::from("test")),
            ("value", Value::Int32(123)),
        ]);
        let text = render_pretty(&record, &TextOptions::default());
        assert_eq!(text, "{\n  \"name\": \"test\",\n  \"value\": 123\n}");
        assert!(!text.contains('\r'));
    }

    #[test]
    fn render_pretty_custom_indent() {
        let record = doc(vec![("a", Value::Int32(1))]);
        let text = render_pretty(&record, &TextOptions::new().indent("    "));
        assert_eq!(text, "{\n    \"a\": 1\n}");
    }

    #[test]
    fn render_compact_is_single_line() {
        let record = doc(vec![
            ("name", Value::from("test")),
            ("nested", doc(vec![("key", Value::from("value"))])),
        ]);
        let text = render_compact(&record);
        assert_eq!(text, r#"{"name":"test","nested":{"key":"value"}}"#);
        assert!(!text.contains('\n'));
    }

    #[test]
    fn doubles_render_with_decimal_point() {
        // A double with an integral value must not collapse into an
        // integer on the next parse.
        assert_eq!(render_compact(&Value::Double(5.0)), "5.0");
        assert_eq!(parse_text("5.0").unwrap(), Value::Double(5.0));
    }

    #[test]
    fn small_int64_narrows_through_text() {
        // Width drift is by design: the text form carries no width for
        // integers a 32-bit value can hold.
        let text = render_compact(&Value::Int64(5));
        assert_eq!(text, "5");
        assert_eq!(parse_text(&text).unwrap(), Value::Int32(5));
    }

    #[test]
    fn json_lines_requires_two_parseable_lines() {
        assert!(parse_json_lines(r#"{"a":1}"#).is_none());
        assert!(parse_json_lines("{\"a\":1}\n").is_none());
        assert!(parse_json_lines("{\"a\":1}\n{not json}").is_none());

        let records = parse_json_lines("{\"a\":1}\n{\"b\":2}").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some(&Value::Int32(1)));
        assert_eq!(records[1].get("b"), Some(&Value::Int32(2)));
    }

    #[test]
    fn json_lines_skips_blank_lines() {
        let records = parse_json_lines("\n{\"a\":1}\n\n  \n{\"b\":2}\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn pretty_single_record_is_not_json_lines() {
        let record = doc(vec![
            ("name", Value::from("test")),
            ("nested", doc(vec![("key", Value::from("value"))])),
        ]);
        let text = render_pretty(&record, &TextOptions::default());
        assert!(text.lines().count() > 1);
        assert!(parse_json_lines(&text).is_none());
    }

    #[test]
    fn pretty_parse_is_idempotent() {
        let text = r#"{"name": "test", "values": [1, 2.5, null], "nested": {"ok": true}}"#;
        let first = parse_text(text).unwrap();
        let second = parse_text(&render_pretty(&first, &TextOptions::default())).unwrap();
        assert_eq!(first, second);
    }
}
