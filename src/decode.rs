//! Raising msgpack bytes to typed values.

use crate::config::CodecConfig;
use crate::error::ErrorKind;
use crate::types::Type;
use crate::value::Value;
use crate::wire;

/// Reads a value of type `ty` from `bytes`.
///
/// Empty input is a null of `ty`. Dynamic envelopes are read strictly at
/// every depth: a descriptor that is not JSON, or not a type, fails the
/// decode instead of falling back to inference.
pub fn from_bytes(bytes: &[u8], ty: &Type, config: &CodecConfig) -> Result<Value, ErrorKind> {
    if bytes.is_empty() {
        return Ok(Value::null(ty.clone()));
    }

    let raw = wire::from_slice_with_config(bytes, config)?;
    ty.validate(&raw)
}
