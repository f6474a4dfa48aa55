//! cty types.
//!
//! A [`Type`] describes the shape a [`Value`](crate::value::Value) must have.
//! Types are written into the wire format only inside the dynamic envelope,
//! as a JSON type descriptor (see [`descriptor`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub mod descriptor;
mod infer;
mod validate;

pub use descriptor::{encode_type_descriptor, from_descriptor, parse_type_descriptor, to_descriptor};
pub use infer::infer_type;

/// A cty type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    String,
    Number,
    Bool,
    /// Ordered sequence of one element type
    List(Box<Type>),
    /// Unordered collection of distinct values of one element type
    Set(Box<Type>),
    /// String-keyed collection of one element type
    Map(Box<Type>),
    /// Named attributes, each with its own type. Attributes named in
    /// `optional` may be absent, and read back as null.
    Object {
        attributes: BTreeMap<String, Type>,
        optional: BTreeSet<String>,
    },
    /// Positional elements, each with its own type
    Tuple(Vec<Type>),
    /// Any type, decided by the value and carried alongside it on the wire
    Dynamic,
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Type::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Type::Map(Box::new(element))
    }

    /// Object type where every attribute is required.
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
    {
        Type::Object {
            attributes: attributes.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            optional: BTreeSet::new(),
        }
    }

    /// Object type with the named attributes marked optional. Names that are
    /// not attributes are ignored.
    pub fn object_with_optional<I, K, O, N>(attributes: I, optional: O) -> Self
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
        O: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let attributes: BTreeMap<String, Type> =
            attributes.into_iter().map(|(k, t)| (k.into(), t)).collect();
        let optional = optional
            .into_iter()
            .map(Into::into)
            .filter(|name| attributes.contains_key(name))
            .collect();
        Type::Object {
            attributes,
            optional,
        }
    }

    pub fn tuple(elements: Vec<Type>) -> Self {
        Type::Tuple(elements)
    }

    /// Element type of a list, set or map.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(t) | Type::Set(t) | Type::Map(t) => Some(t),
            _ => None,
        }
    }

    /// Attribute types of an object.
    pub fn attribute_types(&self) -> Option<&BTreeMap<String, Type>> {
        match self {
            Type::Object { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Optional attribute names of an object.
    pub fn optional_attributes(&self) -> Option<&BTreeSet<String>> {
        match self {
            Type::Object { optional, .. } => Some(optional),
            _ => None,
        }
    }

    /// Element types of a tuple.
    pub fn element_types(&self) -> Option<&[Type]> {
        match self {
            Type::Tuple(types) => Some(types),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Type::Dynamic)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::String | Type::Number | Type::Bool)
    }

    /// List, set or map.
    pub fn is_collection(&self) -> bool {
        matches!(self, Type::List(_) | Type::Set(_) | Type::Map(_))
    }

    /// Object or tuple.
    pub fn is_structural(&self) -> bool {
        matches!(self, Type::Object { .. } | Type::Tuple(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => f.write_str("string"),
            Type::Number => f.write_str("number"),
            Type::Bool => f.write_str("bool"),
            Type::Dynamic => f.write_str("dynamic"),
            Type::List(t) => write!(f, "list({t})"),
            Type::Set(t) => write!(f, "set({t})"),
            Type::Map(t) => write!(f, "map({t})"),
            Type::Object {
                attributes,
                optional,
            } => {
                f.write_str("object({")?;
                for (i, (name, ty)) in attributes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if optional.contains(name) {
                        write!(f, "{name}=optional({ty})")?;
                    } else {
                        write!(f, "{name}={ty}")?;
                    }
                }
                f.write_str("})")
            }
            Type::Tuple(types) => {
                f.write_str("tuple([")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str("])")
            }
        }
    }
}

// Types serialize as their JSON type descriptor in any serde format.
impl Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_descriptor(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let descriptor = serde_json::Value::deserialize(deserializer)?;
        from_descriptor(&descriptor).map_err(de::Error::custom)
    }
}
