use std::io::Write;

use rmp::encode as rmpe;

use super::WireValue;
use crate::error::SerializationError;
use crate::extension;

/// Writes [`WireValue`]s as msgpack.
///
/// Integers use the smallest marker that holds them (unsigned markers for
/// non-negative values), floats are always float64, text uses the str family
/// and bytes the bin family.
pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn encode(&mut self, value: &WireValue) -> Result<(), SerializationError> {
        match value {
            WireValue::Null => rmpe::write_nil(&mut self.writer)?,
            WireValue::Bool(b) => rmpe::write_bool(&mut self.writer, *b)?,
            WireValue::Integer(i) => {
                rmpe::write_sint(&mut self.writer, *i)?;
            }
            WireValue::Unsigned(u) => {
                rmpe::write_uint(&mut self.writer, *u)?;
            }
            WireValue::Float(f) => rmpe::write_f64(&mut self.writer, *f)?,
            WireValue::Bytes(b) => {
                len_u32(b.len())?;
                rmpe::write_bin(&mut self.writer, b)?;
            }
            WireValue::Text(s) => {
                len_u32(s.len())?;
                rmpe::write_str(&mut self.writer, s)?;
            }
            WireValue::Array(items) => {
                rmpe::write_array_len(&mut self.writer, len_u32(items.len())?)?;
                for item in items {
                    self.encode(item)?;
                }
            }
            WireValue::Map(entries) => {
                rmpe::write_map_len(&mut self.writer, len_u32(entries.len())?)?;
                for (key, value) in entries {
                    self.encode(key)?;
                    self.encode(value)?;
                }
            }
            WireValue::Unknown(refinements) => {
                let (code, payload) = extension::encode_unknown(refinements.as_ref())?;
                self.write_ext(code, &payload)?;
            }
        }
        Ok(())
    }

    /// Writes an extension header followed by its raw payload.
    pub fn write_ext(&mut self, code: i8, payload: &[u8]) -> Result<(), SerializationError> {
        rmpe::write_ext_meta(&mut self.writer, len_u32(payload.len())?, code)?;
        self.writer.write_all(payload)?;
        Ok(())
    }
}

fn len_u32(len: usize) -> Result<u32, SerializationError> {
    u32::try_from(len).map_err(|_| SerializationError::LengthOverflow(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::to_vec;

    #[test]
    fn test_integer_markers_match_reference_packer() {
        let cases: [(i64, &[u8]); 9] = [
            (0, &[0x00]),
            (127, &[0x7f]),
            (128, &[0xcc, 0x80]),
            (256, &[0xcd, 0x01, 0x00]),
            (65536, &[0xce, 0x00, 0x01, 0x00, 0x00]),
            (-1, &[0xff]),
            (-32, &[0xe0]),
            (-33, &[0xd0, 0xdf]),
            (i64::MAX, &[0xcf, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ];
        for (value, expected) in cases {
            assert_eq!(to_vec(&WireValue::Integer(value)).unwrap(), expected, "{value}");
        }
    }

    #[test]
    fn test_float_is_always_float64() {
        let bytes = to_vec(&WireValue::Float(1.5)).unwrap();
        assert_eq!(bytes[0], 0xcb);
        assert_eq!(&bytes[1..], &1.5f64.to_be_bytes());
    }

    #[test]
    fn test_bool_markers() {
        assert_eq!(to_vec(&WireValue::Bool(true)).unwrap(), vec![0xc3]);
        assert_eq!(to_vec(&WireValue::Bool(false)).unwrap(), vec![0xc2]);
    }

    #[test]
    fn test_empty_ext_uses_ext8() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_ext(0, &[]).unwrap();
        assert_eq!(buf, vec![0xc7, 0x00, 0x00]);
    }

    #[test]
    fn test_plain_unknown_sentinel() {
        assert_eq!(
            to_vec(&WireValue::Unknown(None)).unwrap(),
            vec![0xc7, 0x00, 0x00]
        );
    }

    #[test]
    fn test_array_header() {
        let value = WireValue::Array(vec![WireValue::Integer(1), WireValue::Integer(2)]);
        assert_eq!(to_vec(&value).unwrap(), vec![0x92, 0x01, 0x02]);
    }
}
