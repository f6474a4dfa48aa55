//! Lowering typed values to wire values.

use crate::error::SerializationError;
use crate::number;
use crate::types::{Type, encode_type_descriptor};
use crate::value::{Known, Value, ValueKind};
use crate::wire::WireValue;

type Result<T> = std::result::Result<T, SerializationError>;

/// Lowers `value` to wire form, with `ty` as its declared type.
///
/// Unknowns become the unknown sentinel and nulls become nil whatever the
/// declared type. Known values are shaped by the declared type: objects and
/// maps are written in key order, sets in canonical order, and a dynamic
/// type writes the dynamic envelope around the value's own type.
pub fn to_wire(value: &Value, ty: &Type) -> Result<WireValue> {
    match value.kind() {
        ValueKind::Unknown => Ok(WireValue::Unknown(None)),
        ValueKind::RefinedUnknown(refinements) => Ok(WireValue::Unknown(Some(refinements.clone()))),
        ValueKind::Null => Ok(WireValue::Null),
        ValueKind::Known(known) => known_to_wire(known, ty),
    }
}

fn known_to_wire(known: &Known, ty: &Type) -> Result<WireValue> {
    // A dynamic value placed under a concrete type is written as its inner value.
    if let (Known::Dynamic(inner), false) = (known, ty.is_dynamic()) {
        return to_wire(inner, ty);
    }

    match ty {
        Type::Dynamic => match known {
            Known::Dynamic(inner) => {
                let descriptor = encode_type_descriptor(inner.ty())?;
                let payload = to_wire(inner, inner.ty())?;
                Ok(WireValue::Array(vec![WireValue::Bytes(descriptor), payload]))
            }
            other => Err(SerializationError::DynamicMalformed {
                found: other.kind_name(),
            }),
        },
        Type::Object {
            attributes,
            optional,
        } => {
            let Known::Object(values) = known else {
                return Err(SerializationError::ValueForObject {
                    found: known.kind_name(),
                });
            };
            if let Some(name) = values.keys().find(|name| !attributes.contains_key(*name)) {
                return Err(SerializationError::UndeclaredAttribute { name: name.clone() });
            }
            // Every declared attribute is written; absent optional ones as nil.
            let entries = attributes
                .iter()
                .map(|(name, attr_ty)| {
                    let wire = match values.get(name) {
                        Some(value) => to_wire(value, attr_ty)?,
                        None if optional.contains(name) => WireValue::Null,
                        None => {
                            return Err(SerializationError::MissingAttribute { name: name.clone() });
                        }
                    };
                    Ok((WireValue::Text(name.clone()), wire))
                })
                .collect::<Result<_>>()?;
            Ok(WireValue::Map(entries))
        }
        Type::Map(element) => {
            let (Known::Map(entries) | Known::Object(entries)) = known else {
                return Err(SerializationError::ValueForMap {
                    found: known.kind_name(),
                });
            };
            let entries = entries
                .iter()
                .map(|(key, value)| Ok((WireValue::Text(key.clone()), to_wire(value, element)?)))
                .collect::<Result<_>>()?;
            Ok(WireValue::Map(entries))
        }
        Type::List(element) | Type::Set(element) => {
            let (Known::List(items) | Known::Set(items) | Known::Tuple(items)) = known else {
                return Err(SerializationError::ValueForListSet {
                    found: known.kind_name(),
                });
            };
            let mut ordered: Vec<&Value> = items.iter().collect();
            if matches!(ty, Type::Set(_)) {
                ordered.sort_by_cached_key(|v| v.sort_key());
            }
            let items = ordered
                .into_iter()
                .map(|item| to_wire(item, element))
                .collect::<Result<_>>()?;
            Ok(WireValue::Array(items))
        }
        Type::Tuple(types) => {
            let items = match known {
                Known::Tuple(items) | Known::List(items) if items.len() == types.len() => items,
                Known::Tuple(items) | Known::List(items) => {
                    return Err(SerializationError::ValueForTuple {
                        expected: types.len(),
                        found: format!("{} of {} elements", known.kind_name(), items.len()),
                    });
                }
                other => {
                    return Err(SerializationError::ValueForTuple {
                        expected: types.len(),
                        found: other.kind_name().to_owned(),
                    });
                }
            };
            let items = items
                .iter()
                .zip(types)
                .map(|(item, item_ty)| to_wire(item, item_ty))
                .collect::<Result<_>>()?;
            Ok(WireValue::Array(items))
        }
        Type::String | Type::Number | Type::Bool => scalar_to_wire(known, ty),
    }
}

/// Scalars are written by what they hold; the primitive type is not
/// consulted beyond rejecting containers.
fn scalar_to_wire(known: &Known, ty: &Type) -> Result<WireValue> {
    match known {
        Known::Bool(b) => Ok(WireValue::Bool(*b)),
        Known::Number(n) => Ok(number::encode_number(n)),
        Known::String(s) => Ok(WireValue::Text(s.clone())),
        other => Err(SerializationError::NotMsgpackSerializable {
            found: other.kind_name(),
            ty: ty.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::refinement::Refinements;

    #[test]
    fn test_null_and_unknown_ignore_type() {
        let ty = Type::object([("a", Type::String)]);
        assert_eq!(to_wire(&Value::null(ty.clone()), &ty).unwrap(), WireValue::Null);
        assert_eq!(
            to_wire(&Value::unknown(ty.clone()), &ty).unwrap(),
            WireValue::Unknown(None)
        );
        let refinements = Refinements::default().with_is_known_null(false);
        assert_eq!(
            to_wire(&Value::refined_unknown(ty.clone(), refinements.clone()), &ty).unwrap(),
            WireValue::Unknown(Some(refinements))
        );
    }

    #[test]
    fn test_numbers_use_numeric_codec() {
        let n = Value::number(BigDecimal::from_str("1.23456789012345678901").unwrap());
        assert_eq!(
            to_wire(&n, &Type::Number).unwrap(),
            WireValue::from("1.23456789012345678901")
        );
        assert_eq!(
            to_wire(&Value::number(7), &Type::Number).unwrap(),
            WireValue::Integer(7)
        );
    }

    #[test]
    fn test_object_keys_sorted_and_missing_optional_as_nil() {
        let ty = Type::object_with_optional(
            [("zeta", Type::Bool), ("alpha", Type::String), ("mid", Type::Number)],
            ["mid"],
        );
        let value = Value::new(
            ty.clone(),
            ValueKind::Known(Known::Object(
                [("zeta", Value::bool(true)), ("alpha", Value::string("a"))]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            )),
        );
        assert_eq!(
            to_wire(&value, &ty).unwrap(),
            WireValue::Map(vec![
                (WireValue::from("alpha"), WireValue::from("a")),
                (WireValue::from("mid"), WireValue::Null),
                (WireValue::from("zeta"), WireValue::Bool(true)),
            ])
        );
    }

    #[test]
    fn test_object_attributes_must_match_type() {
        let ty = Type::object([("name", Type::String), ("port", Type::Number)]);

        let missing = Value::object([("name", Value::string("web"))]);
        let err = to_wire(&missing, &ty).unwrap_err();
        assert!(matches!(
            &err,
            SerializationError::MissingAttribute { name } if name == "port"
        ));

        let extra = Value::object([
            ("name", Value::string("web")),
            ("port", Value::number(80)),
            ("debug", Value::bool(true)),
        ]);
        let err = to_wire(&extra, &ty).unwrap_err();
        assert_eq!(err.to_string(), "object value has undeclared attribute \"debug\"");
    }

    #[test]
    fn test_set_written_in_canonical_order() {
        // Built without the set constructor so the elements start out of order.
        let value = Value::new(
            Type::set(Type::Number),
            ValueKind::Known(Known::Set(vec![Value::number(3), Value::number(1), Value::number(2)])),
        );
        assert_eq!(
            to_wire(&value, &Type::set(Type::Number)).unwrap(),
            WireValue::Array(vec![
                WireValue::Integer(1),
                WireValue::Integer(2),
                WireValue::Integer(3)
            ])
        );
    }

    #[test]
    fn test_list_keeps_order() {
        let value = Value::list(Type::String, vec![Value::string("b"), Value::string("a")]);
        assert_eq!(
            to_wire(&value, &Type::list(Type::String)).unwrap(),
            WireValue::Array(vec![WireValue::from("b"), WireValue::from("a")])
        );
    }

    #[test]
    fn test_dynamic_envelope() {
        let value = Value::dynamic(Value::string("hello"));
        assert_eq!(
            to_wire(&value, &Type::Dynamic).unwrap(),
            WireValue::Array(vec![
                WireValue::Bytes(b"\"string\"".to_vec()),
                WireValue::from("hello")
            ])
        );
    }

    #[test]
    fn test_dynamic_needs_wrapped_value() {
        let err = to_wire(&Value::string("hello"), &Type::Dynamic).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::DynamicMalformed { found: "string" }
        ));
    }

    #[test]
    fn test_dynamic_under_concrete_type_is_unwrapped() {
        let value = Value::dynamic(Value::number(5));
        assert_eq!(
            to_wire(&value, &Type::Number).unwrap(),
            WireValue::Integer(5)
        );
    }

    #[test]
    fn test_structural_mismatches() {
        let s = Value::string("x");
        assert!(matches!(
            to_wire(&s, &Type::object([("a", Type::String)])),
            Err(SerializationError::ValueForObject { found: "string" })
        ));
        assert!(matches!(
            to_wire(&s, &Type::map(Type::String)),
            Err(SerializationError::ValueForMap { found: "string" })
        ));
        assert!(matches!(
            to_wire(&s, &Type::list(Type::String)),
            Err(SerializationError::ValueForListSet { found: "string" })
        ));

        let pair = Value::tuple(vec![Value::bool(true), Value::bool(false)]);
        let err = to_wire(&pair, &Type::tuple(vec![Type::Bool])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value for tuple type must be a tuple of 1 elements, got tuple of 2 elements"
        );
    }

    #[test]
    fn test_container_under_primitive_is_not_serializable() {
        let list = Value::list(Type::String, vec![]);
        let err = to_wire(&list, &Type::String).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::NotMsgpackSerializable { found: "list", .. }
        ));
    }
}
