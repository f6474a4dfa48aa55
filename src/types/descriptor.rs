//! JSON type descriptors.
//!
//! The descriptor format is the one Terraform uses for types inside a
//! dynamic value: primitive types are bare strings, other types are arrays
//! headed by the kind name.
//!
//! ```text
//! "string"  "number"  "bool"  "dynamic"
//! ["list", T]  ["set", T]  ["map", T]
//! ["object", {"name": T, ...}]  ["object", {"name": T, ...}, ["optional", ...]]
//! ["tuple", [T, ...]]
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value as Json, json};

use super::Type;
use crate::error::{DeserializationError, TypeSpecError};

/// The JSON descriptor of `ty`.
pub fn to_descriptor(ty: &Type) -> Json {
    match ty {
        Type::String => json!("string"),
        Type::Number => json!("number"),
        Type::Bool => json!("bool"),
        Type::Dynamic => json!("dynamic"),
        Type::List(t) => json!(["list", to_descriptor(t)]),
        Type::Set(t) => json!(["set", to_descriptor(t)]),
        Type::Map(t) => json!(["map", to_descriptor(t)]),
        Type::Object {
            attributes,
            optional,
        } => {
            let attrs: Map<String, Json> = attributes
                .iter()
                .map(|(name, t)| (name.clone(), to_descriptor(t)))
                .collect();
            if optional.is_empty() {
                json!(["object", attrs])
            } else {
                json!(["object", attrs, optional])
            }
        }
        Type::Tuple(types) => {
            let elements: Vec<Json> = types.iter().map(to_descriptor).collect();
            json!(["tuple", elements])
        }
    }
}

/// Compact JSON bytes of the descriptor of `ty`, as placed in the dynamic
/// envelope. Object attributes come out in name order.
pub fn encode_type_descriptor(ty: &Type) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&to_descriptor(ty))
}

/// Reads a type from its JSON descriptor.
pub fn from_descriptor(json: &Json) -> Result<Type, TypeSpecError> {
    match json {
        Json::String(name) => match name.as_str() {
            "string" => Ok(Type::String),
            "number" => Ok(Type::Number),
            "bool" => Ok(Type::Bool),
            "dynamic" => Ok(Type::Dynamic),
            other => Err(TypeSpecError::UnknownPrimitive(other.to_owned())),
        },
        Json::Array(parts) => from_parts(parts),
        other => Err(TypeSpecError::Invalid(format!(
            "expected a type name or [kind, ...] array, got {other}"
        ))),
    }
}

fn from_parts(parts: &[Json]) -> Result<Type, TypeSpecError> {
    let Some(Json::String(kind)) = parts.first() else {
        return Err(TypeSpecError::Invalid(
            "type array must start with a kind name".to_owned(),
        ));
    };

    match kind.as_str() {
        "list" | "set" | "map" => {
            let [_, element] = parts else {
                return Err(TypeSpecError::Invalid(format!(
                    "{kind} takes exactly one element type"
                )));
            };
            let element = Box::new(from_descriptor(element)?);
            Ok(match kind.as_str() {
                "list" => Type::List(element),
                "set" => Type::Set(element),
                _ => Type::Map(element),
            })
        }
        "object" => {
            let (attrs, optional) = match parts {
                [_, attrs] => (attrs, None),
                [_, attrs, optional] => (attrs, Some(optional)),
                _ => {
                    return Err(TypeSpecError::Invalid(
                        "object takes an attribute map and an optional attribute list".to_owned(),
                    ));
                }
            };
            let Json::Object(attrs) = attrs else {
                return Err(TypeSpecError::ObjectSpec(attrs.to_string()));
            };
            let attributes: BTreeMap<String, Type> = attrs
                .iter()
                .map(|(name, t)| Ok((name.clone(), from_descriptor(t)?)))
                .collect::<Result<_, TypeSpecError>>()?;
            let optional = match optional {
                None => Default::default(),
                Some(json) => optional_names(json, &attributes)?,
            };
            Ok(Type::Object {
                attributes,
                optional,
            })
        }
        "tuple" => {
            let [_, elements] = parts else {
                return Err(TypeSpecError::Invalid(
                    "tuple takes exactly one element type list".to_owned(),
                ));
            };
            let Json::Array(elements) = elements else {
                return Err(TypeSpecError::TupleSpec(elements.to_string()));
            };
            let elements = elements
                .iter()
                .map(from_descriptor)
                .collect::<Result<_, _>>()?;
            Ok(Type::Tuple(elements))
        }
        other => Err(TypeSpecError::Invalid(format!("unknown type kind {other:?}"))),
    }
}

fn optional_names(
    json: &Json,
    attributes: &BTreeMap<String, Type>,
) -> Result<BTreeSet<String>, TypeSpecError> {
    let Json::Array(names) = json else {
        return Err(TypeSpecError::Invalid(format!(
            "optional attributes must be a list of names, got {json}"
        )));
    };
    names
        .iter()
        .map(|name| match name {
            Json::String(name) if attributes.contains_key(name) => Ok(name.clone()),
            Json::String(name) => Err(TypeSpecError::Invalid(format!(
                "optional attribute {name:?} is not declared"
            ))),
            other => Err(TypeSpecError::Invalid(format!(
                "optional attribute name must be a string, got {other}"
            ))),
        })
        .collect()
}

/// Reads the type descriptor carried in a dynamic envelope.
pub fn parse_type_descriptor(bytes: &[u8]) -> Result<Type, DeserializationError> {
    let json: Json = serde_json::from_slice(bytes).map_err(DeserializationError::DynamicTypeJson)?;
    from_descriptor(&json).map_err(DeserializationError::DynamicTypeSpec)
}
