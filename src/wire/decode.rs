use std::io::Read;

use rmp::Marker;

use super::WireValue;
use crate::config::CodecConfig;
use crate::error::DeserializationError;
use crate::extension;

type Result<T> = std::result::Result<T, DeserializationError>;

/// Reads [`WireValue`]s from msgpack.
///
/// Extension payloads are handed to the extension registry as they are
/// read, so unknown sentinels come out as [`WireValue::Unknown`]. Text
/// markers always produce text and bin markers always produce bytes.
pub struct Decoder<R: Read> {
    reader: R,
    depth: usize,
    max_depth: usize,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &CodecConfig::default())
    }

    pub fn with_config(reader: R, config: &CodecConfig) -> Self {
        Decoder {
            reader,
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        // Lengths come from untrusted input; only allocate what is really there.
        let mut buf = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(DeserializationError::UnexpectedEof);
        }
        Ok(buf)
    }

    fn read_text(&mut self, len: usize) -> Result<WireValue> {
        let bytes = self.read_bytes(len)?;
        Ok(WireValue::Text(String::from_utf8(bytes)?))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(DeserializationError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn read_array(&mut self, len: usize) -> Result<WireValue> {
        self.enter()?;
        let mut items = Vec::new();
        for _ in 0..len {
            items.push(self.decode()?);
        }
        self.depth -= 1;
        Ok(WireValue::Array(items))
    }

    fn read_map(&mut self, len: usize) -> Result<WireValue> {
        self.enter()?;
        let mut entries = Vec::new();
        for _ in 0..len {
            let key = self.decode()?;
            let value = self.decode()?;
            entries.push((key, value));
        }
        self.depth -= 1;
        Ok(WireValue::Map(entries))
    }

    fn read_ext(&mut self, len: usize) -> Result<WireValue> {
        let code = self.read_u8()? as i8;
        let payload = self.read_bytes(len)?;
        self.enter()?;
        let remaining = CodecConfig::default().with_max_depth(self.max_depth - self.depth);
        let value = extension::decode_extension(code, &payload, &remaining)?;
        self.depth -= 1;
        Ok(value)
    }

    /// Reads one complete value.
    pub fn decode(&mut self) -> Result<WireValue> {
        let byte = self.read_u8()?;
        match Marker::from_u8(byte) {
            Marker::Null => Ok(WireValue::Null),
            Marker::True => Ok(WireValue::Bool(true)),
            Marker::False => Ok(WireValue::Bool(false)),
            Marker::FixPos(n) => Ok(WireValue::Integer(n as i64)),
            Marker::FixNeg(n) => Ok(WireValue::Integer(n as i64)),
            Marker::U8 => Ok(WireValue::Integer(self.read_u8()? as i64)),
            Marker::U16 => Ok(WireValue::Integer(self.read_u16()? as i64)),
            Marker::U32 => Ok(WireValue::Integer(self.read_u32()? as i64)),
            Marker::U64 => {
                let value = self.read_u64()?;
                Ok(match i64::try_from(value) {
                    Ok(i) => WireValue::Integer(i),
                    Err(_) => WireValue::Unsigned(value),
                })
            }
            Marker::I8 => Ok(WireValue::Integer(self.read_u8()? as i8 as i64)),
            Marker::I16 => Ok(WireValue::Integer(self.read_u16()? as i16 as i64)),
            Marker::I32 => Ok(WireValue::Integer(self.read_u32()? as i32 as i64)),
            Marker::I64 => Ok(WireValue::Integer(self.read_u64()? as i64)),
            Marker::F32 => Ok(WireValue::Float(f32::from_bits(self.read_u32()?) as f64)),
            Marker::F64 => Ok(WireValue::Float(f64::from_bits(self.read_u64()?))),
            Marker::FixStr(len) => self.read_text(len as usize),
            Marker::Str8 => {
                let len = self.read_u8()? as usize;
                self.read_text(len)
            }
            Marker::Str16 => {
                let len = self.read_u16()? as usize;
                self.read_text(len)
            }
            Marker::Str32 => {
                let len = self.read_u32()? as usize;
                self.read_text(len)
            }
            Marker::Bin8 => {
                let len = self.read_u8()? as usize;
                Ok(WireValue::Bytes(self.read_bytes(len)?))
            }
            Marker::Bin16 => {
                let len = self.read_u16()? as usize;
                Ok(WireValue::Bytes(self.read_bytes(len)?))
            }
            Marker::Bin32 => {
                let len = self.read_u32()? as usize;
                Ok(WireValue::Bytes(self.read_bytes(len)?))
            }
            Marker::FixArray(len) => self.read_array(len as usize),
            Marker::Array16 => {
                let len = self.read_u16()? as usize;
                self.read_array(len)
            }
            Marker::Array32 => {
                let len = self.read_u32()? as usize;
                self.read_array(len)
            }
            Marker::FixMap(len) => self.read_map(len as usize),
            Marker::Map16 => {
                let len = self.read_u16()? as usize;
                self.read_map(len)
            }
            Marker::Map32 => {
                let len = self.read_u32()? as usize;
                self.read_map(len)
            }
            Marker::FixExt1 => self.read_ext(1),
            Marker::FixExt2 => self.read_ext(2),
            Marker::FixExt4 => self.read_ext(4),
            Marker::FixExt8 => self.read_ext(8),
            Marker::FixExt16 => self.read_ext(16),
            Marker::Ext8 => {
                let len = self.read_u8()? as usize;
                self.read_ext(len)
            }
            Marker::Ext16 => {
                let len = self.read_u16()? as usize;
                self.read_ext(len)
            }
            Marker::Ext32 => {
                let len = self.read_u32()? as usize;
                self.read_ext(len)
            }
            Marker::Reserved => Err(DeserializationError::ReservedMarker(byte)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::from_slice;

    #[test]
    fn test_signed_and_unsigned_markers() {
        assert_eq!(from_slice(&[0xd0, 0xdf]).unwrap(), WireValue::Integer(-33));
        assert_eq!(from_slice(&[0xcd, 0x01, 0x00]).unwrap(), WireValue::Integer(256));
        assert_eq!(
            from_slice(&[0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap(),
            WireValue::Unsigned(u64::MAX)
        );
        assert_eq!(
            from_slice(&[0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            WireValue::Integer(i64::MIN)
        );
    }

    #[test]
    fn test_float32_widens() {
        let mut bytes = vec![0xca];
        bytes.extend_from_slice(&2.5f32.to_be_bytes());
        assert_eq!(from_slice(&bytes).unwrap(), WireValue::Float(2.5));
    }

    #[test]
    fn test_str8_and_bin8() {
        assert_eq!(
            from_slice(&[0xd9, 0x02, b'h', b'i']).unwrap(),
            WireValue::from("hi")
        );
        assert_eq!(
            from_slice(&[0xc4, 0x02, 0xff, 0x00]).unwrap(),
            WireValue::Bytes(vec![0xff, 0x00])
        );
    }

    #[test]
    fn test_invalid_utf8_text() {
        let err = from_slice(&[0xa2, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DeserializationError::InvalidUtf8(_)));
    }

    #[test]
    fn test_truncated_input() {
        let err = from_slice(&[0xa5, b'h', b'i']).unwrap_err();
        assert!(matches!(err, DeserializationError::UnexpectedEof));

        let err = from_slice(&[0x92, 0x01]).unwrap_err();
        assert!(matches!(err, DeserializationError::UnexpectedEof));
    }

    #[test]
    fn test_reserved_marker() {
        let err = from_slice(&[0xc1]).unwrap_err();
        assert!(matches!(err, DeserializationError::ReservedMarker(0xc1)));
    }

    #[test]
    fn test_huge_claimed_length_does_not_allocate() {
        let err = from_slice(&[0xc6, 0xff, 0xff, 0xff, 0xff, 0x00]).unwrap_err();
        assert!(matches!(err, DeserializationError::UnexpectedEof));
    }

    #[test]
    fn test_depth_limit() {
        let config = CodecConfig::default().with_max_depth(2);
        let nested = [0x91, 0x91, 0x91, 0xc0];
        let mut reader = &nested[..];
        let err = Decoder::with_config(&mut reader, &config).decode().unwrap_err();
        assert!(matches!(err, DeserializationError::DepthLimitExceeded { limit: 2 }));

        let shallow = [0x91, 0x91, 0xc0];
        let mut reader = &shallow[..];
        assert!(Decoder::with_config(&mut reader, &config).decode().is_ok());
    }

    #[test]
    fn test_unrecognised_ext_code_is_unknown() {
        assert_eq!(
            from_slice(&[0xd4, 0x63, 0x00]).unwrap(),
            WireValue::Unknown(None)
        );
    }
}
