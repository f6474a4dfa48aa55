use std::collections::BTreeMap;

use super::Type;
use crate::wire::WireValue;

/// Guesses the type of raw wire data that arrived without one.
///
/// Sequences become lists and maps with string keys become objects. A
/// collection whose elements disagree on their type gets a dynamic element
/// type. Null and unknown elements take part in no decision, since they fit
/// any type.
pub fn infer_type(raw: &WireValue) -> Type {
    match raw {
        WireValue::Null | WireValue::Unknown(_) => Type::Dynamic,
        WireValue::Bool(_) => Type::Bool,
        WireValue::Integer(_) | WireValue::Unsigned(_) | WireValue::Float(_) => Type::Number,
        WireValue::Text(_) | WireValue::Bytes(_) => Type::String,
        WireValue::Array(items) => Type::list(unify(items.iter())),
        WireValue::Map(entries) => {
            let keys: Option<Vec<&str>> = entries.iter().map(|(k, _)| k.as_str()).collect();
            match keys {
                Some(keys) => {
                    let attributes: BTreeMap<String, Type> = keys
                        .into_iter()
                        .zip(entries)
                        .map(|(k, (_, v))| (k.to_owned(), infer_type(v)))
                        .collect();
                    Type::Object {
                        attributes,
                        optional: Default::default(),
                    }
                }
                None => Type::map(unify(entries.iter().map(|(_, v)| v))),
            }
        }
    }
}

/// The one type shared by all the informative values, or dynamic.
fn unify<'a>(values: impl Iterator<Item = &'a WireValue>) -> Type {
    let mut found: Option<Type> = None;
    for value in values.filter(|v| !v.is_null() && !v.is_unknown()) {
        let ty = infer_type(value);
        match &found {
            None => found = Some(ty),
            Some(existing) if *existing == ty => {}
            Some(_) => return Type::Dynamic,
        }
    }
    found.unwrap_or(Type::Dynamic)
}
