//! Typed cty values.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;

use crate::refinement::Refinements;
use crate::types::Type;

/// A value paired with its type.
///
/// # Example
/// ```
/// use cty_msgpack::{Type, Value};
///
/// let ports = Value::list(Type::Number, vec![Value::number(80), Value::number(443)]);
/// assert_eq!(ports.ty(), &Type::list(Type::Number));
/// assert_eq!(ports.elements().map(|e| e.len()), Some(2));
///
/// let pending = Value::unknown(Type::String);
/// assert!(pending.is_unknown());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    ty: Type,
    kind: ValueKind,
}

/// Whether a value is known, and what is known about it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Known(Known),
    Null,
    /// Not yet known, nothing more is known about it
    Unknown,
    /// Not yet known, with partial knowledge. Never holds empty refinements.
    RefinedUnknown(Refinements),
}

/// The payload of a known value.
#[derive(Debug, Clone, PartialEq)]
pub enum Known {
    Bool(bool),
    Number(BigDecimal),
    String(String),
    List(Vec<Value>),
    /// Elements in canonical order, without duplicates
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(BTreeMap<String, Value>),
    Tuple(Vec<Value>),
    /// A value of some concrete type held where the declared type is dynamic
    Dynamic(Box<Value>),
}

impl Known {
    /// Short name of the payload's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Known::Bool(_) => "bool",
            Known::Number(_) => "number",
            Known::String(_) => "string",
            Known::List(_) => "list",
            Known::Set(_) => "set",
            Known::Map(_) => "map",
            Known::Object(_) => "object",
            Known::Tuple(_) => "tuple",
            Known::Dynamic(_) => "dynamic",
        }
    }
}

impl Value {
    /// Pairs a type with a value state as given, without checking that they agree.
    pub fn new(ty: Type, kind: ValueKind) -> Self {
        Value { ty, kind }
    }

    pub fn null(ty: Type) -> Self {
        Value::new(ty, ValueKind::Null)
    }

    pub fn unknown(ty: Type) -> Self {
        Value::new(ty, ValueKind::Unknown)
    }

    /// Unknown value with partial knowledge. Empty refinements give a plain
    /// unknown.
    pub fn refined_unknown(ty: Type, refinements: Refinements) -> Self {
        if refinements.is_empty() {
            Value::unknown(ty)
        } else {
            Value::new(ty, ValueKind::RefinedUnknown(refinements))
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::new(Type::String, ValueKind::Known(Known::String(s.into())))
    }

    pub fn number(n: impl Into<BigDecimal>) -> Self {
        Value::new(Type::Number, ValueKind::Known(Known::Number(n.into())))
    }

    pub fn bool(b: bool) -> Self {
        Value::new(Type::Bool, ValueKind::Known(Known::Bool(b)))
    }

    pub fn list(element: Type, items: Vec<Value>) -> Self {
        Value::new(Type::list(element), ValueKind::Known(Known::List(items)))
    }

    /// Set of `items`, put in canonical order with duplicates removed.
    pub fn set(element: Type, mut items: Vec<Value>) -> Self {
        items.sort_by_cached_key(Value::sort_key);
        items.dedup();
        Value::new(Type::set(element), ValueKind::Known(Known::Set(items)))
    }

    pub fn map<I, K>(element: Type, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::new(Type::map(element), ValueKind::Known(Known::Map(entries)))
    }

    /// Object whose type is made of its attribute values' types, all required.
    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let attributes: BTreeMap<String, Value> =
            attributes.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let ty = Type::object(attributes.iter().map(|(k, v)| (k.clone(), v.ty.clone())));
        Value::new(ty, ValueKind::Known(Known::Object(attributes)))
    }

    /// Tuple whose type is made of its elements' types.
    pub fn tuple(items: Vec<Value>) -> Self {
        let ty = Type::tuple(items.iter().map(|v| v.ty.clone()).collect());
        Value::new(ty, ValueKind::Known(Known::Tuple(items)))
    }

    /// Wraps a concretely typed value for use where a dynamic value is
    /// expected. Values that are already dynamic are returned as they are.
    pub fn dynamic(inner: Value) -> Self {
        if inner.ty.is_dynamic() {
            return inner;
        }
        Value::new(Type::Dynamic, ValueKind::Known(Known::Dynamic(Box::new(inner))))
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn into_parts(self) -> (Type, ValueKind) {
        (self.ty, self.kind)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    /// True for plain and refined unknowns.
    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, ValueKind::Unknown | ValueKind::RefinedUnknown(_))
    }

    pub fn is_known(&self) -> bool {
        matches!(self.kind, ValueKind::Known(_))
    }

    pub fn known(&self) -> Option<&Known> {
        match &self.kind {
            ValueKind::Known(k) => Some(k),
            _ => None,
        }
    }

    pub fn refinements(&self) -> Option<&Refinements> {
        match &self.kind {
            ValueKind::RefinedUnknown(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.known()? {
            Known::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self.known()? {
            Known::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.known()? {
            Known::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of a list, set or tuple.
    pub fn elements(&self) -> Option<&[Value]> {
        match self.known()? {
            Known::List(items) | Known::Set(items) | Known::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map or attributes of an object.
    pub fn entries(&self) -> Option<&BTreeMap<String, Value>> {
        match self.known()? {
            Known::Map(entries) | Known::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self.known()? {
            Known::Object(attributes) => attributes.get(name),
            _ => None,
        }
    }

    /// The concretely typed value inside a dynamic value.
    pub fn dynamic_inner(&self) -> Option<&Value> {
        match self.known()? {
            Known::Dynamic(inner) => Some(inner),
            _ => None,
        }
    }

    /// Key giving the canonical order of set elements.
    pub fn sort_key(&self) -> SortKey {
        match &self.kind {
            ValueKind::Null => SortKey::Null,
            ValueKind::Unknown | ValueKind::RefinedUnknown(_) => SortKey::Unknown,
            ValueKind::Known(known) => match known {
                Known::Bool(b) => SortKey::Bool(*b),
                Known::Number(n) => SortKey::Number(n.normalized()),
                Known::String(s) => SortKey::String(s.clone()),
                Known::List(items) | Known::Set(items) | Known::Tuple(items) => {
                    SortKey::Seq(items.iter().map(Value::sort_key).collect())
                }
                Known::Map(entries) | Known::Object(entries) => SortKey::Entries(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), v.sort_key()))
                        .collect(),
                ),
                Known::Dynamic(inner) => inner.sort_key(),
            },
        }
    }
}

/// Total order over values, used to lay out sets deterministically.
///
/// Known values sort before null, and null before unknown. Among known
/// values, booleans come first, then numbers, strings, sequences and keyed
/// containers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Bool(bool),
    Number(BigDecimal),
    String(String),
    Seq(Vec<SortKey>),
    Entries(Vec<(String, SortKey)>),
    Null,
    Unknown,
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::number(n)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_empty_refinements_are_plain_unknown() {
        let value = Value::refined_unknown(Type::Number, Refinements::default());
        assert_eq!(value.kind(), &ValueKind::Unknown);
        assert!(value.refinements().is_none());

        let value = Value::refined_unknown(
            Type::String,
            Refinements::default().with_string_prefix("ab"),
        );
        assert!(value.is_unknown());
        assert_eq!(
            value.refinements().unwrap().string_prefix.as_deref(),
            Some("ab")
        );
    }

    #[test]
    fn test_set_is_ordered_and_distinct() {
        let a = Value::set(
            Type::String,
            vec![Value::from("b"), Value::from("a"), Value::from("b")],
        );
        let b = Value::set(Type::String, vec![Value::from("a"), Value::from("b")]);
        assert_eq!(a, b);
        assert_eq!(a.elements().unwrap().len(), 2);
    }

    #[test]
    fn test_set_orders_numbers_numerically() {
        let set = Value::set(
            Type::Number,
            vec![Value::number(10), Value::number(9), Value::number(-1)],
        );
        let numbers: Vec<_> = set
            .elements()
            .unwrap()
            .iter()
            .map(|v| v.as_number().unwrap().to_string())
            .collect();
        assert_eq!(numbers, vec!["-1", "9", "10"]);
    }

    #[test]
    fn test_sort_key_kind_order() {
        let keys = [
            Value::bool(true).sort_key(),
            Value::number(0).sort_key(),
            Value::string("").sort_key(),
            Value::list(Type::Bool, vec![]).sort_key(),
            Value::object(Vec::<(String, Value)>::new()).sort_key(),
            Value::null(Type::Bool).sort_key(),
            Value::unknown(Type::Bool).sort_key(),
        ];
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{:?} < {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_sort_key_ignores_number_scale() {
        let a = Value::number(BigDecimal::from_str("1.50").unwrap());
        let b = Value::number(BigDecimal::from_str("1.5").unwrap());
        assert_eq!(a.sort_key(), b.sort_key());
    }

    #[test]
    fn test_dynamic_does_not_double_wrap() {
        let inner = Value::string("x");
        let wrapped = Value::dynamic(inner.clone());
        assert_eq!(wrapped.ty(), &Type::Dynamic);
        assert_eq!(wrapped.dynamic_inner(), Some(&inner));
        assert_eq!(Value::dynamic(wrapped.clone()), wrapped);
    }

    #[test]
    fn test_structural_constructors_build_types() {
        let obj = Value::object([("name", Value::from("web")), ("port", Value::number(80))]);
        assert_eq!(
            obj.ty(),
            &Type::object([("name", Type::String), ("port", Type::Number)])
        );
        assert_eq!(obj.attribute("port").and_then(Value::as_number), Some(&BigDecimal::from(80i64)));

        let tup = Value::tuple(vec![Value::from(true), Value::from("x")]);
        assert_eq!(tup.ty(), &Type::tuple(vec![Type::Bool, Type::String]));
    }
}
