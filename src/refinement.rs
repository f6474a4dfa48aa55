//! Partial knowledge about unknown values, and its keyed msgpack payload.
//!
//! Each populated field is written under a small integer key, in ascending
//! key order. Unset fields are left out entirely. Number bounds travel as
//! `[decimal text as bin, inclusive]` so they never lose precision.

use bigdecimal::BigDecimal;

use crate::error::DeserializationError;
use crate::number::{self, decimal_text};
use crate::wire::WireValue;

pub const KEY_IS_KNOWN_NULL: i64 = 1;
pub const KEY_STRING_PREFIX: i64 = 2;
pub const KEY_NUMBER_LOWER_BOUND: i64 = 3;
pub const KEY_NUMBER_UPPER_BOUND: i64 = 4;
pub const KEY_COLLECTION_LENGTH_LOWER_BOUND: i64 = 5;
pub const KEY_COLLECTION_LENGTH_UPPER_BOUND: i64 = 6;

/// A number bound and whether it is inclusive.
pub type NumberBound = (BigDecimal, bool);

/// What is already known about a value that is otherwise unknown.
///
/// An empty set of refinements says nothing, and is treated everywhere as a
/// plain unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refinements {
    pub is_known_null: Option<bool>,
    pub string_prefix: Option<String>,
    pub number_lower_bound: Option<NumberBound>,
    pub number_upper_bound: Option<NumberBound>,
    pub collection_length_lower_bound: Option<u64>,
    pub collection_length_upper_bound: Option<u64>,
}

impl Refinements {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.is_known_null.is_none()
            && self.string_prefix.is_none()
            && self.number_lower_bound.is_none()
            && self.number_upper_bound.is_none()
            && self.collection_length_lower_bound.is_none()
            && self.collection_length_upper_bound.is_none()
    }

    pub fn with_is_known_null(mut self, is_known_null: bool) -> Self {
        self.is_known_null = Some(is_known_null);
        self
    }

    pub fn with_string_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.string_prefix = Some(prefix.into());
        self
    }

    pub fn with_number_lower_bound(mut self, bound: BigDecimal, inclusive: bool) -> Self {
        self.number_lower_bound = Some((bound, inclusive));
        self
    }

    pub fn with_number_upper_bound(mut self, bound: BigDecimal, inclusive: bool) -> Self {
        self.number_upper_bound = Some((bound, inclusive));
        self
    }

    pub fn with_collection_length_lower_bound(mut self, len: u64) -> Self {
        self.collection_length_lower_bound = Some(len);
        self
    }

    pub fn with_collection_length_upper_bound(mut self, len: u64) -> Self {
        self.collection_length_upper_bound = Some(len);
        self
    }
}

/// Builds the keyed payload map for `refinements`.
pub fn encode_refinements(refinements: &Refinements) -> WireValue {
    let mut entries = Vec::new();
    if let Some(is_null) = refinements.is_known_null {
        entries.push((WireValue::Integer(KEY_IS_KNOWN_NULL), WireValue::Bool(is_null)));
    }
    if let Some(prefix) = &refinements.string_prefix {
        entries.push((
            WireValue::Integer(KEY_STRING_PREFIX),
            WireValue::Text(prefix.clone()),
        ));
    }
    if let Some(bound) = &refinements.number_lower_bound {
        entries.push((WireValue::Integer(KEY_NUMBER_LOWER_BOUND), encode_bound(bound)));
    }
    if let Some(bound) = &refinements.number_upper_bound {
        entries.push((WireValue::Integer(KEY_NUMBER_UPPER_BOUND), encode_bound(bound)));
    }
    if let Some(len) = refinements.collection_length_lower_bound {
        entries.push((
            WireValue::Integer(KEY_COLLECTION_LENGTH_LOWER_BOUND),
            length_value(len),
        ));
    }
    if let Some(len) = refinements.collection_length_upper_bound {
        entries.push((
            WireValue::Integer(KEY_COLLECTION_LENGTH_UPPER_BOUND),
            length_value(len),
        ));
    }
    WireValue::Map(entries)
}

fn encode_bound((value, inclusive): &NumberBound) -> WireValue {
    WireValue::Array(vec![
        WireValue::Bytes(decimal_text(value).into_bytes()),
        WireValue::Bool(*inclusive),
    ])
}

fn length_value(len: u64) -> WireValue {
    match i64::try_from(len) {
        Ok(i) => WireValue::Integer(i),
        Err(_) => WireValue::Unsigned(len),
    }
}

/// Reads refinements back from their keyed payload map.
///
/// Keys this codec does not know are skipped. A known key holding the wrong
/// kind of data fails the whole payload.
pub fn decode_refinements(payload: &WireValue) -> Result<Refinements, DeserializationError> {
    let entries = payload.as_map().ok_or_else(|| DeserializationError::RefinementField {
        field: "payload",
        reason: format!("expected a map, got {}", payload.kind_name()),
    })?;

    let mut refinements = Refinements::default();
    for (key, value) in entries {
        let key = match key {
            WireValue::Integer(k) => *k,
            _ => {
                tracing::debug!(key = key.kind_name(), "skipping non-integer refinement key");
                continue;
            }
        };
        match key {
            KEY_IS_KNOWN_NULL => {
                refinements.is_known_null = Some(decode_bool("is_known_null", value)?);
            }
            KEY_STRING_PREFIX => {
                refinements.string_prefix = Some(decode_text("string_prefix", value)?);
            }
            KEY_NUMBER_LOWER_BOUND => {
                refinements.number_lower_bound = Some(decode_bound("number_lower_bound", value)?);
            }
            KEY_NUMBER_UPPER_BOUND => {
                refinements.number_upper_bound = Some(decode_bound("number_upper_bound", value)?);
            }
            KEY_COLLECTION_LENGTH_LOWER_BOUND => {
                refinements.collection_length_lower_bound =
                    Some(decode_length("collection_length_lower_bound", value)?);
            }
            KEY_COLLECTION_LENGTH_UPPER_BOUND => {
                refinements.collection_length_upper_bound =
                    Some(decode_length("collection_length_upper_bound", value)?);
            }
            other => tracing::debug!(key = other, "skipping unrecognised refinement key"),
        }
    }
    Ok(refinements)
}

fn field_error(field: &'static str, reason: impl Into<String>) -> DeserializationError {
    DeserializationError::RefinementField {
        field,
        reason: reason.into(),
    }
}

fn decode_bool(field: &'static str, value: &WireValue) -> Result<bool, DeserializationError> {
    match value {
        WireValue::Bool(b) => Ok(*b),
        other => Err(field_error(field, format!("expected bool, got {}", other.kind_name()))),
    }
}

fn decode_text(field: &'static str, value: &WireValue) -> Result<String, DeserializationError> {
    match value {
        WireValue::Text(s) => Ok(s.clone()),
        WireValue::Bytes(b) => String::from_utf8(b.clone())
            .map_err(|e| field_error(field, format!("invalid utf-8: {e}"))),
        other => Err(field_error(field, format!("expected text, got {}", other.kind_name()))),
    }
}

fn decode_bound(field: &'static str, value: &WireValue) -> Result<NumberBound, DeserializationError> {
    let [bound, inclusive] = value.as_array().unwrap_or_default() else {
        return Err(field_error(field, "expected a [value, inclusive] pair"));
    };
    let bound = number::decode_number(bound).map_err(|e| field_error(field, e.to_string()))?;
    Ok((bound, decode_bool(field, inclusive)?))
}

fn decode_length(field: &'static str, value: &WireValue) -> Result<u64, DeserializationError> {
    match value {
        WireValue::Integer(i) => {
            u64::try_from(*i).map_err(|_| field_error(field, format!("negative length {i}")))
        }
        WireValue::Unsigned(u) => Ok(*u),
        other => Err(field_error(
            field,
            format!("expected integer, got {}", other.kind_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_refinements() {
        let refinements = Refinements::default();
        assert!(refinements.is_empty());
        assert_eq!(encode_refinements(&refinements), WireValue::Map(vec![]));
    }

    #[test]
    fn test_keys_in_ascending_order() {
        let refinements = Refinements::default()
            .with_collection_length_upper_bound(10)
            .with_string_prefix("arn:")
            .with_is_known_null(false);
        let encoded = encode_refinements(&refinements);
        let keys: Vec<_> = encoded.as_map().unwrap().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                WireValue::Integer(1),
                WireValue::Integer(2),
                WireValue::Integer(6)
            ]
        );
    }

    #[test]
    fn test_bound_is_decimal_text_bytes() {
        let refinements = Refinements::default().with_number_upper_bound(dec("100.50"), false);
        let encoded = encode_refinements(&refinements);
        assert_eq!(
            encoded.as_map().unwrap()[0].1,
            WireValue::Array(vec![
                WireValue::Bytes(b"100.50".to_vec()),
                WireValue::Bool(false)
            ])
        );
    }

    #[test]
    fn test_decode_all_fields() {
        let payload = WireValue::Map(vec![
            (WireValue::Integer(1), WireValue::Bool(true)),
            (WireValue::Integer(2), WireValue::Bytes(b"arn:aws:".to_vec())),
            (
                WireValue::Integer(3),
                WireValue::Array(vec![WireValue::Bytes(b"10".to_vec()), WireValue::Bool(true)]),
            ),
            (
                WireValue::Integer(4),
                WireValue::Array(vec![WireValue::from("100.5"), WireValue::Bool(false)]),
            ),
            (WireValue::Integer(5), WireValue::Integer(1)),
            (WireValue::Integer(6), WireValue::Integer(10)),
        ]);
        let refinements = decode_refinements(&payload).unwrap();
        assert_eq!(refinements.is_known_null, Some(true));
        assert_eq!(refinements.string_prefix.as_deref(), Some("arn:aws:"));
        assert_eq!(refinements.number_lower_bound, Some((dec("10"), true)));
        assert_eq!(refinements.number_upper_bound, Some((dec("100.5"), false)));
        assert_eq!(refinements.collection_length_lower_bound, Some(1));
        assert_eq!(refinements.collection_length_upper_bound, Some(10));
    }

    #[test]
    fn test_unrecognised_keys_are_skipped() {
        let payload = WireValue::Map(vec![
            (WireValue::Integer(2), WireValue::from("x")),
            (WireValue::Integer(99), WireValue::Null),
            (WireValue::from("note"), WireValue::Bool(true)),
        ]);
        let refinements = decode_refinements(&payload).unwrap();
        assert_eq!(refinements, Refinements::default().with_string_prefix("x"));
    }

    #[test]
    fn test_wrong_field_kind_fails() {
        let payload = WireValue::Map(vec![(WireValue::Integer(1), WireValue::from("no"))]);
        assert!(matches!(
            decode_refinements(&payload),
            Err(DeserializationError::RefinementField {
                field: "is_known_null",
                ..
            })
        ));

        let payload = WireValue::Map(vec![(
            WireValue::Integer(3),
            WireValue::Array(vec![WireValue::Bytes(b"10".to_vec())]),
        )]);
        assert!(decode_refinements(&payload).is_err());

        let payload = WireValue::Map(vec![(WireValue::Integer(5), WireValue::Integer(-1))]);
        assert!(decode_refinements(&payload).is_err());
    }

    #[test]
    fn test_non_map_payload_fails() {
        assert!(decode_refinements(&WireValue::Integer(3)).is_err());
    }
}
