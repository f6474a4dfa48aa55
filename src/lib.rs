//! # cty msgpack
//!
//! A MessagePack codec for cty typed values, byte-compatible with the
//! encoding Terraform uses on its plugin protocol.
//!
//! ## Features
//! - Every cty type: string, number, bool, list, set, map, object (with
//!   optional attributes), tuple and dynamic
//! - Arbitrary-precision numbers, sent as native integers, doubles, or exact
//!   decimal text, whichever loses nothing
//! - Unknown values as msgpack extension 0, and unknown values with
//!   refinements (string prefix, number bounds, length bounds, nullness) as
//!   extension 12
//! - Dynamic values as a `[type descriptor JSON, value]` envelope
//! - Deterministic output: object and map keys sorted, set elements in a
//!   canonical order
//!
//! ## Example
//! ```rust
//! use cty_msgpack::{Type, Value, from_slice, to_vec};
//!
//! let ty = Type::object([("name", Type::String), ("ports", Type::list(Type::Number))]);
//! let value = Value::object([
//!     ("name", Value::string("web")),
//!     ("ports", Value::list(Type::Number, vec![Value::number(80), Value::number(443)])),
//! ]);
//!
//! let bytes = to_vec(&value, &ty).unwrap();
//! let decoded = from_slice(&bytes, &ty).unwrap();
//! assert_eq!(decoded, value);
//! ```
//!
//! Dynamic values carry their own type:
//! ```rust
//! use cty_msgpack::{Type, Value, from_slice, to_vec};
//!
//! let value = Value::dynamic(Value::string("hello"));
//! let bytes = to_vec(&value, &Type::Dynamic).unwrap();
//! assert_eq!(&bytes[..3], &[0x92, 0xc4, 0x08]);
//!
//! let decoded = from_slice(&bytes, &Type::Dynamic).unwrap();
//! assert_eq!(decoded.dynamic_inner().unwrap().as_str(), Some("hello"));
//! ```

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod extension;
pub mod number;
pub mod path;
pub mod refinement;
pub mod types;
pub mod value;
pub mod wire;

pub use config::CodecConfig;
pub use error::{
    DeserializationError, Error, ErrorContext, ErrorKind, Result, SerializationError,
    TypeSpecError, ValidationError,
};
pub use path::{Path, PathStep};
pub use refinement::Refinements;
pub use types::Type;
pub use value::{Known, Value, ValueKind};
pub use wire::WireValue;

const ENCODE_OPERATION: &str = "cty_to_msgpack";
const DECODE_OPERATION: &str = "cty_from_msgpack";

/// Encodes `value` as msgpack, with `ty` as its declared type.
pub fn to_vec(value: &Value, ty: &Type) -> Result<Vec<u8>> {
    let context = ErrorContext {
        operation: ENCODE_OPERATION,
        type_name: ty.to_string(),
        is_null: value.is_null(),
        is_unknown: value.is_unknown(),
    };
    let _span = tracing::debug_span!(
        "cty_to_msgpack",
        ty = %context.type_name,
        is_null = context.is_null,
        is_unknown = context.is_unknown
    )
    .entered();

    encode::to_wire(value, ty)
        .and_then(|lowered| wire::to_vec(&lowered))
        .map_err(|e| fail(context, e))
}

/// Encodes raw data as msgpack after checking it against `ty`.
///
/// ```rust
/// use cty_msgpack::{Type, WireValue, to_vec_native};
///
/// let raw: WireValue = serde_json::from_str(r#"["a", "b"]"#).unwrap();
/// let bytes = to_vec_native(raw, &Type::set(Type::String)).unwrap();
/// assert_eq!(bytes, b"\x92\xa1a\xa1b");
/// ```
pub fn to_vec_native(raw: impl Into<WireValue>, ty: &Type) -> Result<Vec<u8>> {
    let raw = raw.into();
    let context = ErrorContext {
        operation: ENCODE_OPERATION,
        type_name: ty.to_string(),
        is_null: raw.is_null(),
        is_unknown: raw.is_unknown(),
    };
    let value = ty.validate(&raw).map_err(|e| fail(context, e))?;
    to_vec(&value, ty)
}

/// Decodes a value of type `ty` from msgpack, with the default configuration.
pub fn from_slice(bytes: &[u8], ty: &Type) -> Result<Value> {
    from_slice_with_config(bytes, ty, &CodecConfig::default())
}

/// Decodes a value of type `ty` from msgpack.
///
/// Empty input decodes to a null value of `ty`. Bytes left over after the
/// value are an error.
pub fn from_slice_with_config(bytes: &[u8], ty: &Type, config: &CodecConfig) -> Result<Value> {
    let context = ErrorContext {
        operation: DECODE_OPERATION,
        type_name: ty.to_string(),
        is_null: false,
        is_unknown: false,
    };
    let _span = tracing::debug_span!(
        "cty_from_msgpack",
        ty = %context.type_name,
        len = bytes.len()
    )
    .entered();

    decode::from_bytes(bytes, ty, config).map_err(|e| fail(context, e))
}

fn fail(context: ErrorContext, kind: impl Into<ErrorKind>) -> Error {
    let err = Error::new(context, kind);
    tracing::debug!(error = %err, "codec call failed");
    err
}
