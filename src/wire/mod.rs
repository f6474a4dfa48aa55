//! The MessagePack-native value tree that typed values are lowered to before
//! packing, and raised from after unpacking.

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
    ser::SerializeMap,
};
use std::fmt;

use crate::config::CodecConfig;
use crate::error::{DeserializationError, SerializationError};
use crate::refinement::Refinements;

mod decode;
mod encode;

pub use decode::Decoder;
pub use encode::Encoder;

/// Dynamic msgpack value.
///
/// Besides the native msgpack kinds this carries the unknown sentinel, which
/// travels as an extension type on the wire. Map keys may be any value and
/// keep the order in which they were read or inserted.
///
/// # Example
/// ```
/// use cty_msgpack::wire::{self, WireValue};
///
/// let value = WireValue::Map(vec![
///     (WireValue::from("name"), WireValue::from("Alice")),
///     (WireValue::from("age"), WireValue::Integer(30)),
/// ]);
///
/// let bytes = wire::to_vec(&value).unwrap();
/// let decoded = wire::from_slice(&bytes).unwrap();
/// assert_eq!(value, decoded);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// Nil
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer that fits in i64
    Integer(i64),
    /// Unsigned integer above i64::MAX
    Unsigned(u64),
    /// Floating point value
    Float(f64),
    /// Byte string (msgpack bin)
    Bytes(Vec<u8>),
    /// Text string (msgpack str)
    Text(String),
    /// Array of values
    Array(Vec<WireValue>),
    /// Map of values in wire order
    Map(Vec<(WireValue, WireValue)>),
    /// Unknown sentinel, refined when it carries refinements
    Unknown(Option<Refinements>),
}

impl WireValue {
    /// Returns true if the value is nil
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// Returns true if the value is the unknown sentinel
    pub fn is_unknown(&self) -> bool {
        matches!(self, WireValue::Unknown(_))
    }

    /// Returns the value as text, if it is a text string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as bytes, if it is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            WireValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as an array, if it is one
    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the map entries, if this is a map
    pub fn as_map(&self) -> Option<&[(WireValue, WireValue)]> {
        match self {
            WireValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Null => "nil",
            WireValue::Bool(_) => "bool",
            WireValue::Integer(_) | WireValue::Unsigned(_) => "integer",
            WireValue::Float(_) => "float",
            WireValue::Bytes(_) => "bytes",
            WireValue::Text(_) => "text",
            WireValue::Array(_) => "array",
            WireValue::Map(_) => "map",
            WireValue::Unknown(_) => "unknown",
        }
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::Text(s.to_owned())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        WireValue::Text(s)
    }
}

impl From<bool> for WireValue {
    fn from(b: bool) -> Self {
        WireValue::Bool(b)
    }
}

impl From<i64> for WireValue {
    fn from(i: i64) -> Self {
        WireValue::Integer(i)
    }
}

impl From<f64> for WireValue {
    fn from(f: f64) -> Self {
        WireValue::Float(f)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(items: Vec<WireValue>) -> Self {
        WireValue::Array(items)
    }
}

impl Serialize for WireValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            WireValue::Null => serializer.serialize_none(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Integer(i) => serializer.serialize_i64(*i),
            WireValue::Unsigned(u) => serializer.serialize_u64(*u),
            WireValue::Float(f) => serializer.serialize_f64(*f),
            WireValue::Bytes(b) => serializer.serialize_bytes(b),
            WireValue::Text(s) => serializer.serialize_str(s),
            WireValue::Array(a) => a.serialize(serializer),
            WireValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            // The serde data model has no sentinel; unknowns only exist in msgpack.
            WireValue::Unknown(_) => serializer.serialize_unit_variant("WireValue", 9, "unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WireValueVisitor;

        impl<'de> Visitor<'de> for WireValueVisitor {
            type Value = WireValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any msgpack-representable value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<WireValue, E> {
                Ok(WireValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<WireValue, E> {
                Ok(WireValue::Integer(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<WireValue, E> {
                Ok(match i64::try_from(value) {
                    Ok(i) => WireValue::Integer(i),
                    Err(_) => WireValue::Unsigned(value),
                })
            }

            fn visit_f64<E>(self, value: f64) -> Result<WireValue, E> {
                Ok(WireValue::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<WireValue, E>
            where
                E: de::Error,
            {
                Ok(WireValue::Text(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<WireValue, E> {
                Ok(WireValue::Text(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<WireValue, E>
            where
                E: de::Error,
            {
                Ok(WireValue::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<WireValue, E> {
                Ok(WireValue::Bytes(value))
            }

            fn visit_none<E>(self) -> Result<WireValue, E> {
                Ok(WireValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<WireValue, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> Result<WireValue, E> {
                Ok(WireValue::Null)
            }

            fn visit_seq<V>(self, mut visitor: V) -> Result<WireValue, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(WireValue::Array(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<WireValue, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((key, value)) = visitor.next_entry()? {
                    entries.push((key, value));
                }
                Ok(WireValue::Map(entries))
            }
        }

        deserializer.deserialize_any(WireValueVisitor)
    }
}

/// Packs a wire value into msgpack bytes.
pub fn to_vec(value: &WireValue) -> Result<Vec<u8>, SerializationError> {
    let mut buf = Vec::new();
    Encoder::new(&mut buf).encode(value)?;
    Ok(buf)
}

/// Unpacks exactly one wire value from `slice`, with the default configuration.
pub fn from_slice(slice: &[u8]) -> Result<WireValue, DeserializationError> {
    from_slice_with_config(slice, &CodecConfig::default())
}

/// Unpacks exactly one wire value from `slice`. Bytes left over after the
/// value are an error.
pub fn from_slice_with_config(
    slice: &[u8],
    config: &CodecConfig,
) -> Result<WireValue, DeserializationError> {
    let mut reader = slice;
    let value = Decoder::with_config(&mut reader, config).decode()?;
    if !reader.is_empty() {
        return Err(DeserializationError::TrailingBytes(reader.len()));
    }
    Ok(value)
}
