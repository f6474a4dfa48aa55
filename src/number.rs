//! Conversion between arbitrary-precision cty numbers and their wire forms.
//!
//! msgpack only has 64-bit integers and IEEE-754 doubles, so each number is
//! written in the most compact form that loses nothing: a native integer when
//! it is integral and fits in i64, a double when the double reads back as the
//! same decimal, and exact decimal text otherwise. Readers accept all three
//! forms (plus decimal text sent as bytes) in any numeric position.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use thiserror::Error;

use crate::wire::WireValue;

/// Decimals with more fractional digits than this are taken to be the
/// expansion of a double that was converted to decimal earlier, and are sent
/// as that double. Other cty msgpack writers use the same cutoff.
pub const FLOAT_ARTIFACT_DIGITS: i64 = 20;

/// Largest decimal exponent, in either direction, accepted from the wire.
/// Writing such a number out positionally takes about this many bytes.
pub const MAX_DECIMAL_EXPONENT: i64 = 100_000;

/// Why a wire value could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    /// The wire value is not numeric and not decimal text
    #[error("cannot represent {0} as a number")]
    NotNumeric(&'static str),
    /// Text or bytes that do not parse as a decimal
    #[error("{0:?} is not a decimal number")]
    InvalidText(String),
    /// NaN or an infinity, which cty numbers cannot hold
    #[error("non-finite floats are not numbers")]
    NonFinite,
    /// A decimal exponent too large to write out
    #[error("decimal exponent {0} is out of range")]
    ExponentOutOfRange(i64),
}

/// Picks the wire form of `d`.
pub fn encode_number(d: &BigDecimal) -> WireValue {
    if let Some(int) = integral_value(d) {
        return match int.to_i64() {
            Some(i) => WireValue::Integer(i),
            None => WireValue::Text(int.to_string()),
        };
    }

    let text = decimal_text(d);
    let Some(float) = text.parse::<f64>().ok().filter(|f| f.is_finite()) else {
        return WireValue::Text(text);
    };

    if fractional_digits(d) > FLOAT_ARTIFACT_DIGITS {
        tracing::trace!(decimal = %text, "treating long decimal expansion as a float");
        return WireValue::Float(float);
    }

    let float_text = float.to_string();
    let exact = BigDecimal::from_str(&float_text).is_ok_and(|back| back == *d);
    if exact || float_text == text {
        WireValue::Float(float)
    } else {
        WireValue::Text(text)
    }
}

/// Reads a number from any of its wire forms.
pub fn decode_number(value: &WireValue) -> Result<BigDecimal, NumberError> {
    match value {
        WireValue::Integer(i) => Ok(BigDecimal::from(*i)),
        WireValue::Unsigned(u) => Ok(BigDecimal::from(*u)),
        WireValue::Float(f) if f.is_finite() => parse_decimal(&f.to_string()),
        WireValue::Float(_) => Err(NumberError::NonFinite),
        WireValue::Text(s) => parse_decimal(s),
        WireValue::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => parse_decimal(s),
            Err(_) => Err(NumberError::InvalidText(String::from_utf8_lossy(b).into_owned())),
        },
        other => Err(NumberError::NotNumeric(other.kind_name())),
    }
}

/// Parses decimal text, accepting exponent notation within
/// [`MAX_DECIMAL_EXPONENT`].
pub fn parse_decimal(text: &str) -> Result<BigDecimal, NumberError> {
    let d = BigDecimal::from_str(text.trim())
        .map_err(|_| NumberError::InvalidText(text.to_owned()))?;
    let scale = d.as_bigint_and_exponent().1;
    if scale.unsigned_abs() > MAX_DECIMAL_EXPONENT.unsigned_abs() {
        return Err(NumberError::ExponentOutOfRange(-scale));
    }
    Ok(d)
}

/// Exact base-10 text of `d` in positional notation, keeping its scale
/// (`1.50` stays `1.50`).
pub fn decimal_text(d: &BigDecimal) -> String {
    let (int, scale) = d.as_bigint_and_exponent();
    let digits = int.abs().to_string();
    let sign = if int.is_negative() { "-" } else { "" };

    if scale <= 0 {
        let zeros = if int.is_zero() { 0 } else { (-scale) as usize };
        return format!("{sign}{digits}{}", "0".repeat(zeros));
    }

    let scale = scale as usize;
    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{sign}{whole}.{fraction}")
}

/// The integer value of `d`, if it has no fractional part.
fn integral_value(d: &BigDecimal) -> Option<BigInt> {
    let (int, scale) = d.normalized().into_bigint_and_exponent();
    if scale > 0 {
        return None;
    }
    let factor = num_traits::pow(BigInt::from(10u8), (-scale) as usize);
    Some(int * factor)
}

fn fractional_digits(d: &BigDecimal) -> i64 {
    d.as_bigint_and_exponent().1.max(0)
}
