use std::collections::BTreeMap;

use super::{Type, descriptor, infer_type};
use crate::error::{ErrorKind, ValidationError};
use crate::number;
use crate::path::PathStep;
use crate::value::{Known, Value, ValueKind};
use crate::wire::WireValue;

impl Type {
    /// Builds a typed value from raw wire data, checking it against this type.
    ///
    /// Nil gives a null value and the unknown sentinel an unknown one, at any
    /// depth. Strings may arrive as text or bytes and numbers in any of their
    /// wire forms. Objects need every required attribute; absent optional
    /// attributes read as null. A dynamic type takes the dynamic envelope, or
    /// infers a type from the data when there is none.
    ///
    /// An envelope is read the same way at every depth: a descriptor that is
    /// not JSON, or not a type, is a [`DeserializationError`], and data that
    /// does not fit the described type is a validation error at its path.
    ///
    /// [`DeserializationError`]: crate::error::DeserializationError
    ///
    /// # Example
    /// ```
    /// use cty_msgpack::Type;
    /// use cty_msgpack::wire::WireValue;
    ///
    /// let ty = Type::list(Type::Number);
    /// let raw = WireValue::Array(vec![WireValue::Integer(1), WireValue::from("oops")]);
    /// let err = ty.validate(&raw).unwrap_err();
    /// assert_eq!(err.to_string(), "At [1]: \"oops\" is not a decimal number");
    /// ```
    pub fn validate(&self, raw: &WireValue) -> Result<Value, ErrorKind> {
        match raw {
            WireValue::Null => return Ok(Value::null(self.clone())),
            WireValue::Unknown(None) => return Ok(Value::unknown(self.clone())),
            WireValue::Unknown(Some(refinements)) => {
                return Ok(Value::refined_unknown(self.clone(), refinements.clone()));
            }
            _ => {}
        }

        match self {
            Type::String => Ok(validate_string(raw)?),
            Type::Number => number::decode_number(raw)
                .map(Value::number)
                .map_err(|e| ValidationError::new(e.to_string()).into()),
            Type::Bool => match raw {
                WireValue::Bool(b) => Ok(Value::bool(*b)),
                other => Err(mismatch("bool", other).into()),
            },
            Type::List(element) => {
                let items = validate_elements(element, raw, "list")?;
                Ok(Value::list((**element).clone(), items))
            }
            Type::Set(element) => {
                let items = validate_elements(element, raw, "set")?;
                Ok(Value::set((**element).clone(), items))
            }
            Type::Map(element) => {
                let entries = string_keyed(raw, "map")?;
                let mut out = BTreeMap::new();
                for (key, value) in entries {
                    let value = element
                        .validate(value)
                        .map_err(|e| e.within(PathStep::Key(key.clone())))?;
                    out.insert(key, value);
                }
                Ok(Value::new(self.clone(), ValueKind::Known(Known::Map(out))))
            }
            Type::Object {
                attributes,
                optional,
            } => {
                let mut given: BTreeMap<String, &WireValue> =
                    string_keyed(raw, "object")?.into_iter().collect();
                let mut out = BTreeMap::new();
                for (name, attr_ty) in attributes {
                    let value = match given.remove(name) {
                        Some(value) => attr_ty
                            .validate(value)
                            .map_err(|e| e.within(PathStep::Attribute(name.clone())))?,
                        None if optional.contains(name) => Value::null(attr_ty.clone()),
                        None => {
                            return Err(ValidationError::new(format!(
                                "missing required attribute {name:?}"
                            ))
                            .into());
                        }
                    };
                    out.insert(name.clone(), value);
                }
                if let Some(extra) = given.keys().next() {
                    return Err(
                        ValidationError::new(format!("unexpected attribute {extra:?}")).into(),
                    );
                }
                Ok(Value::new(self.clone(), ValueKind::Known(Known::Object(out))))
            }
            Type::Tuple(types) => {
                let items = raw.as_array().ok_or_else(|| mismatch("tuple", raw))?;
                if items.len() != types.len() {
                    return Err(ValidationError::new(format!(
                        "expected tuple of {} elements, got {}",
                        types.len(),
                        items.len()
                    ))
                    .into());
                }
                let items = types
                    .iter()
                    .zip(items)
                    .enumerate()
                    .map(|(i, (ty, item))| ty.validate(item).map_err(|e| e.within(PathStep::Index(i))))
                    .collect::<Result<_, _>>()?;
                Ok(Value::new(self.clone(), ValueKind::Known(Known::Tuple(items))))
            }
            Type::Dynamic => validate_dynamic(raw),
        }
    }
}

fn mismatch(expected: &str, found: &WireValue) -> ValidationError {
    ValidationError::new(format!("expected {expected}, got {}", found.kind_name()))
}

fn validate_string(raw: &WireValue) -> Result<Value, ValidationError> {
    match raw {
        WireValue::Text(s) => Ok(Value::string(s.clone())),
        WireValue::Bytes(b) => String::from_utf8(b.clone())
            .map(Value::string)
            .map_err(|_| ValidationError::new("string bytes are not valid utf-8")),
        other => Err(mismatch("string", other)),
    }
}

fn validate_elements(
    element: &Type,
    raw: &WireValue,
    expected: &str,
) -> Result<Vec<Value>, ErrorKind> {
    let items = raw.as_array().ok_or_else(|| mismatch(expected, raw))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| element.validate(item).map_err(|e| e.within(PathStep::Index(i))))
        .collect()
}

/// Entries of a wire map whose keys are all strings. Later duplicates win.
fn string_keyed<'a>(
    raw: &'a WireValue,
    expected: &str,
) -> Result<Vec<(String, &'a WireValue)>, ValidationError> {
    let entries = raw.as_map().ok_or_else(|| mismatch(expected, raw))?;
    entries
        .iter()
        .map(|(key, value)| match key {
            WireValue::Text(s) => Ok((s.clone(), value)),
            WireValue::Bytes(b) => String::from_utf8(b.clone())
                .map(|s| (s, value))
                .map_err(|_| ValidationError::new(format!("{expected} key is not valid utf-8"))),
            other => Err(ValidationError::new(format!(
                "{expected} keys must be strings, got {}",
                other.kind_name()
            ))),
        })
        .collect()
}

/// A two-element array led by bytes is the `[descriptor, value]` envelope and
/// must resolve. Anything else is plain data and gets an inferred type.
fn validate_dynamic(raw: &WireValue) -> Result<Value, ErrorKind> {
    if let Some([WireValue::Bytes(spec), inner]) = raw.as_array() {
        let ty = descriptor::parse_type_descriptor(spec)?;
        tracing::trace!(ty = %ty, "resolved dynamic value type");
        return Ok(Value::dynamic(ty.validate(inner)?));
    }

    let ty = infer_type(raw);
    Ok(Value::dynamic(ty.validate(raw)?))
}
