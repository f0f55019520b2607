//! Wire values: the encodable form of record fields.
//!
//! [`WireValue`] is a closed set of shapes that can be rendered as JSON, as a
//! query parameter, or as a multipart part. [`ToWire`] converts Rust values
//! into it.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeSeq};
use serde_json::Number;

use crate::EncodeError;
use crate::multipart::MultipartFile;

// ============================================================================
// Wire Value
// ============================================================================

/// An encodable value.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Finite number.
    Number(Number),
    /// Text.
    String(String),
    /// Raw bytes (base64 in JSON).
    Bytes(Bytes),
    /// Ordered collection.
    List(Vec<WireValue>),
    /// Nested record.
    Map(WireMap),
    /// File reference for multipart bodies.
    File(MultipartFile),
}

impl WireValue {
    /// Returns `true` for [`WireValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the file if this is a [`WireValue::File`].
    #[must_use]
    pub const fn as_file(&self) -> Option<&MultipartFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Returns the text if this is a [`WireValue::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Number from a float, rejecting `NaN` and infinities.
    pub fn float(value: f64) -> Result<Self, EncodeError> {
        Number::from_f64(value)
            .map(Self::Number)
            .ok_or(EncodeError::NonFiniteNumber(value))
    }

    /// Flat string form used for query parameters and multipart fields.
    ///
    /// Booleans are `true`/`false`, numbers use their decimal form, nested
    /// maps render as JSON, lists as `[a, b]` and null as the empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    fn write_list_item(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(text) => write!(f, "{text:?}"),
            Self::Null => f.write_str("null"),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Bytes(value) => f.write_str(&String::from_utf8_lossy(value)),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_list_item(f)?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            Self::File(file) => f.write_str(file.filename()),
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Number(value) => value.serialize(serializer),
            Self::String(value) => serializer.serialize_str(value),
            Self::Bytes(value) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(value)),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => map.serialize(serializer),
            Self::File(file) => serializer.serialize_str(file.filename()),
        }
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for WireValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Bytes> for WireValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<MultipartFile> for WireValue {
    fn from(value: MultipartFile) -> Self {
        Self::File(value)
    }
}

impl From<WireMap> for WireValue {
    fn from(value: WireMap) -> Self {
        Self::Map(value)
    }
}

// ============================================================================
// Wire Map
// ============================================================================

/// Insertion-ordered map from wire key to [`WireValue`].
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireMap {
    entries: Vec<(String, WireValue)>,
}

impl WireMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a value, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<WireValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<WireValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Flattens the map into query parameters using [`WireValue::to_text`].
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_text()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<WireValue>> FromIterator<(K, V)> for WireMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for WireMap {
    type Item = (String, WireValue);
    type IntoIter = std::vec::IntoIter<(String, WireValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for WireMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ============================================================================
// ToWire
// ============================================================================

/// Conversion into a [`WireValue`].
///
/// Implemented for primitives, strings, collections, URLs, bytes, files and
/// anything deriving `Record`.
pub trait ToWire {
    /// Convert `self` into its wire form.
    fn to_wire(&self) -> Result<WireValue, EncodeError>;
}

macro_rules! impl_to_wire_int {
    ($($ty:ty => $via:ty),* $(,)?) => {
        $(
            impl ToWire for $ty {
                fn to_wire(&self) -> Result<WireValue, EncodeError> {
                    Ok(WireValue::Number(Number::from(<$via>::from(*self))))
                }
            }
        )*
    };
}

impl_to_wire_int!(
    i8 => i64, i16 => i64, i32 => i64, i64 => i64,
    u8 => u64, u16 => u64, u32 => u64, u64 => u64,
);

impl ToWire for isize {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::Number(Number::from(*self)))
    }
}

impl ToWire for usize {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::Number(Number::from(*self)))
    }
}

impl ToWire for f32 {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        WireValue::float(f64::from(*self))
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        WireValue::float(*self)
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::Bool(*self))
    }
}

impl ToWire for char {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::String(self.to_string()))
    }
}

impl ToWire for str {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::String(self.to_string()))
    }
}

impl ToWire for String {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::String(self.clone()))
    }
}

impl ToWire for url::Url {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::String(self.as_str().to_string()))
    }
}

impl ToWire for Bytes {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::Bytes(self.clone()))
    }
}

impl ToWire for MultipartFile {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::File(self.clone()))
    }
}

impl ToWire for WireValue {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(self.clone())
    }
}

impl ToWire for WireMap {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        Ok(WireValue::Map(self.clone()))
    }
}

impl ToWire for serde_json::Value {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        use serde_json::Value;

        Ok(match self {
            Value::Null => WireValue::Null,
            Value::Bool(value) => WireValue::Bool(*value),
            Value::Number(value) => WireValue::Number(value.clone()),
            Value::String(value) => WireValue::String(value.clone()),
            Value::Array(items) => WireValue::List(
                items
                    .iter()
                    .map(ToWire::to_wire)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(object) => WireValue::Map(
                object
                    .iter()
                    .map(|(key, value)| value.to_wire().map(|value| (key.clone(), value)))
                    .collect::<Result<WireMap, _>>()?,
            ),
        })
    }
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        (**self).to_wire()
    }
}

impl<T: ToWire + ?Sized> ToWire for Box<T> {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        (**self).to_wire()
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        self.as_ref().map_or(Ok(WireValue::Null), ToWire::to_wire)
    }
}

impl<T: ToWire> ToWire for [T] {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        self.iter()
            .map(ToWire::to_wire)
            .collect::<Result<_, _>>()
            .map(WireValue::List)
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        self.as_slice().to_wire()
    }
}

impl<T: ToWire, const LEN: usize> ToWire for [T; LEN] {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        self.as_slice().to_wire()
    }
}

impl<K: AsRef<str>, V: ToWire> ToWire for BTreeMap<K, V> {
    fn to_wire(&self) -> Result<WireValue, EncodeError> {
        self.iter()
            .map(|(key, value)| value.to_wire().map(|value| (key.as_ref(), value)))
            .collect::<Result<WireMap, _>>()
            .map(WireValue::Map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_to_wire() {
        assert_eq!(42_u8.to_wire(), Ok(WireValue::from(42_u64)));
        assert_eq!((-3_i32).to_wire(), Ok(WireValue::from(-3_i64)));
        assert_eq!(true.to_wire(), Ok(WireValue::Bool(true)));
        assert_eq!("hi".to_wire(), Ok(WireValue::from("hi")));
        assert_eq!(None::<u32>.to_wire(), Ok(WireValue::Null));
    }

    #[test]
    fn non_finite_float_fails() {
        assert_eq!(
            f64::NAN.to_wire().map_err(|err| err.to_string()),
            Err("non-finite number: NaN".to_string())
        );
        assert!(f64::INFINITY.to_wire().is_err());
        assert!(1.5_f64.to_wire().is_ok());
    }

    #[test]
    fn url_becomes_string() {
        let url = url::Url::parse("https://example.com/a?b=c").expect("url");
        assert_eq!(
            url.to_wire(),
            Ok(WireValue::from("https://example.com/a?b=c"))
        );
    }

    #[test]
    fn text_forms() {
        assert_eq!(WireValue::Bool(false).to_text(), "false");
        assert_eq!(WireValue::from(7_u64).to_text(), "7");
        assert_eq!(WireValue::float(2.5).expect("finite").to_text(), "2.5");
        assert_eq!(WireValue::Null.to_text(), "");
        assert_eq!(
            vec![1, 2, 3].to_wire().expect("list").to_text(),
            "[1, 2, 3]"
        );
        assert_eq!(
            vec!["a", "b"].to_wire().expect("list").to_text(),
            r#"["a", "b"]"#
        );
        let nested = WireMap::new().with("x", 1_u64).with("y", "z");
        assert_eq!(WireValue::Map(nested).to_text(), r#"{"x":1,"y":"z"}"#);
    }

    #[test]
    fn map_insert_replaces_in_place() {
        let mut map = WireMap::new();
        map.insert("a", 1_u64);
        map.insert("b", 2_u64);
        map.insert("a", 3_u64);

        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(map.get("a"), Some(&WireValue::from(3_u64)));
    }

    #[test]
    fn map_serializes_in_order() {
        let map = WireMap::new()
            .with("zeta", "last?")
            .with("alpha", WireValue::Null)
            .with("raw", Bytes::from_static(b"hi"));
        let json = serde_json::to_string(&map).expect("json");
        assert_eq!(json, r#"{"zeta":"last?","alpha":null,"raw":"aGk="}"#);
    }

    #[test]
    fn json_value_to_wire() {
        let value = serde_json::json!({"a": [1, null], "b": {"c": true}});
        let wire = value.to_wire().expect("wire");
        assert_eq!(serde_json::to_value(&wire).expect("json"), value);
    }
}
