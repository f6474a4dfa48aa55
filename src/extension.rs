//! Reserved msgpack extension codes for unknown values.

use crate::config::CodecConfig;
use crate::error::{DeserializationError, SerializationError};
use crate::refinement::{Refinements, decode_refinements, encode_refinements};
use crate::wire::{self, WireValue};

/// Plain unknown, empty payload.
pub const EXT_UNKNOWN: i8 = 0;

/// Unknown with refinements; the payload is a packed refinement map.
pub const EXT_REFINED_UNKNOWN: i8 = 12;

/// Extension code and payload for an unknown value.
///
/// Missing and empty refinements both produce the plain unknown sentinel, so
/// the two are byte-identical on the wire.
pub fn encode_unknown(
    refinements: Option<&Refinements>,
) -> Result<(i8, Vec<u8>), SerializationError> {
    match refinements {
        Some(refinements) if !refinements.is_empty() => {
            let payload = wire::to_vec(&encode_refinements(refinements))?;
            Ok((EXT_REFINED_UNKNOWN, payload))
        }
        _ => Ok((EXT_UNKNOWN, Vec::new())),
    }
}

/// Turns an extension read from the wire into the value it stands for.
///
/// Unrecognised codes degrade to a plain unknown. A refined unknown whose
/// payload cannot be read is an error rather than a plain unknown.
pub fn decode_extension(
    code: i8,
    payload: &[u8],
    config: &CodecConfig,
) -> Result<WireValue, DeserializationError> {
    match code {
        EXT_UNKNOWN => Ok(WireValue::Unknown(None)),
        EXT_REFINED_UNKNOWN => {
            let refinements = wire::from_slice_with_config(payload, config)
                .and_then(|map| decode_refinements(&map))
                .map_err(|e| DeserializationError::MalformedRefinements {
                    source: Box::new(e),
                })?;
            Ok(WireValue::Unknown(Some(refinements)))
        }
        other => {
            tracing::debug!(code = other, len = payload.len(), "unrecognised extension code, reading as unknown");
            Ok(WireValue::Unknown(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;

    #[test]
    fn test_plain_and_empty_refinements_match() {
        assert_eq!(encode_unknown(None).unwrap(), (EXT_UNKNOWN, vec![]));
        assert_eq!(
            encode_unknown(Some(&Refinements::default())).unwrap(),
            (EXT_UNKNOWN, vec![])
        );
    }

    #[test]
    fn test_refined_unknown_bytes() {
        let refinements = Refinements::default()
            .with_number_lower_bound(BigDecimal::from_str("0").unwrap(), true);
        let value = WireValue::Unknown(Some(refinements));
        assert_eq!(
            wire::to_vec(&value).unwrap(),
            vec![0xc7, 0x07, 0x0c, 0x81, 0x03, 0x92, 0xc4, 0x01, 0x30, 0xc3]
        );
    }

    #[test]
    fn test_refined_unknown_round_trip() {
        let refinements = Refinements::default()
            .with_string_prefix("abc")
            .with_number_lower_bound(BigDecimal::from(5), true);
        let value = WireValue::Unknown(Some(refinements.clone()));
        let decoded = wire::from_slice(&wire::to_vec(&value).unwrap()).unwrap();
        assert_eq!(decoded, WireValue::Unknown(Some(refinements)));
    }

    #[test]
    fn test_corrupted_payload_is_error() {
        // ext8, length 2, code 12, payload is a fixmap header with no entries following
        let err = wire::from_slice(&[0xc7, 0x02, 0x0c, 0x81, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            DeserializationError::MalformedRefinements { .. }
        ));
    }

    #[test]
    fn test_payload_that_is_not_a_map_is_error() {
        let err = decode_extension(EXT_REFINED_UNKNOWN, &[0x2a], &CodecConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            DeserializationError::MalformedRefinements { .. }
        ));
    }

    #[test]
    fn test_other_codes_are_plain_unknown() {
        let value = decode_extension(5, b"anything", &CodecConfig::default()).unwrap();
        assert_eq!(value, WireValue::Unknown(None));
    }
}
