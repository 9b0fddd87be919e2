//! Database value model and the JSON-safe conversion.
//!
//! [`Value`] is the tagged representation of anything a database cell (or a
//! composite nested inside one) can hold. [`safe_value`] turns it into a
//! [`serde_json::Value`] that serializes without loss: binary content is
//! wrapped as `{"__bytes__": "<base64>"}`, composites are converted
//! recursively, and scalars pass through.
//!
//! # Examples
//!
//! ```
//! use table_snapshot_core::{Value, decode_bytes, safe_value};
//!
//! let json = safe_value(Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]));
//! assert_eq!(json, serde_json::json!({"__bytes__": "3q2+7w=="}));
//! assert_eq!(decode_bytes(&json), Some(vec![0xDE, 0xAD, 0xBE, 0xEF]));
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Number};

/// Key of the single-entry object that wraps binary content.
pub const BYTES_TAG: &str = "__bytes__";

/// A value read from the database, tagged by its runtime shape.
///
/// SQLite itself only produces the scalar variants and [`Value::Bytes`];
/// [`Value::Sequence`] and [`Value::Mapping`] exist so that composite values
/// (for example, previously converted JSON fed back in) are handled by the
/// same conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Boolean.
    Boolean(bool),
    /// Raw binary content.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Keyed mapping; entry order is preserved.
    Mapping(Vec<(String, Value)>),
}

/// Converts a [`Value`] into its JSON-safe form.
///
/// Total over every variant:
///
/// - `Bytes` becomes `{"__bytes__": <standard padded base64>}`.
/// - `Sequence` becomes an array of converted elements, same length and order.
/// - `Mapping` becomes an object with the same keys and converted values.
/// - `Null`, `Integer`, `Text` and `Boolean` are returned unchanged.
/// - `Real` becomes a JSON number, or `null` when it is NaN or infinite,
///   since JSON has no encoding for those.
pub fn safe_value(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Real(f) => Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Bytes(bytes) => {
            let mut wrapper = Map::with_capacity(1);
            wrapper.insert(
                BYTES_TAG.to_string(),
                serde_json::Value::String(STANDARD.encode(bytes)),
            );
            serde_json::Value::Object(wrapper)
        }
        Value::Sequence(items) => {
            serde_json::Value::Array(items.into_iter().map(safe_value).collect())
        }
        Value::Mapping(entries) => serde_json::Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key, safe_value(value)))
                .collect(),
        ),
    }
}

/// Recovers the original bytes from a `{"__bytes__": ...}` wrapper.
///
/// Returns `None` when `value` is not exactly a single-key wrapper object or
/// when its payload is not valid base64.
pub fn decode_bytes(value: &serde_json::Value) -> Option<Vec<u8>> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let encoded = object.get(BYTES_TAG)?.as_str()?;
    STANDARD.decode(encoded).ok()
}

impl From<serde_json::Value> for Value {
    /// Lifts already-converted JSON back into a [`Value`].
    ///
    /// Byte wrappers stay as mappings, so converting the result again with
    /// [`safe_value`] reproduces the input instead of wrapping twice.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
