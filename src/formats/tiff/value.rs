//! Typed tag values

use std::io::{self, Cursor};

use super::tags::FieldType;
use crate::io::{ByteOrderHandler, SeekableReader};

/// The decoded values of one directory entry
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(Vec<u8>),
    SByte(Vec<i8>),
    /// Text without its NUL terminator
    Ascii(String),
    Short(Vec<u16>),
    SShort(Vec<i16>),
    Long(Vec<u32>),
    SLong(Vec<i32>),
    Rational(Vec<(u32, u32)>),
    SRational(Vec<(i32, i32)>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Undefined(Vec<u8>),
    Ifd(Vec<u32>),
    Long8(Vec<u64>),
    SLong8(Vec<i64>),
    Ifd8(Vec<u64>),
}

impl TagValue {
    /// Returns the field type this value is stored as
    pub fn field_type(&self) -> FieldType {
        match self {
            TagValue::Byte(_) => FieldType::Byte,
            TagValue::SByte(_) => FieldType::SByte,
            TagValue::Ascii(_) => FieldType::Ascii,
            TagValue::Short(_) => FieldType::Short,
            TagValue::SShort(_) => FieldType::SShort,
            TagValue::Long(_) => FieldType::Long,
            TagValue::SLong(_) => FieldType::SLong,
            TagValue::Rational(_) => FieldType::Rational,
            TagValue::SRational(_) => FieldType::SRational,
            TagValue::Float(_) => FieldType::Float,
            TagValue::Double(_) => FieldType::Double,
            TagValue::Undefined(_) => FieldType::Undefined,
            TagValue::Ifd(_) => FieldType::Ifd,
            TagValue::Long8(_) => FieldType::Long8,
            TagValue::SLong8(_) => FieldType::SLong8,
            TagValue::Ifd8(_) => FieldType::Ifd8,
        }
    }

    /// Number of values as recorded in a directory entry.
    ///
    /// ASCII counts include the NUL terminator.
    pub fn count(&self) -> u64 {
        let n = match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => v.len(),
            TagValue::SByte(v) => v.len(),
            TagValue::Ascii(s) => s.len() + 1,
            TagValue::Short(v) => v.len(),
            TagValue::SShort(v) => v.len(),
            TagValue::Long(v) | TagValue::Ifd(v) => v.len(),
            TagValue::SLong(v) => v.len(),
            TagValue::Rational(v) => v.len(),
            TagValue::SRational(v) => v.len(),
            TagValue::Float(v) => v.len(),
            TagValue::Double(v) => v.len(),
            TagValue::Long8(v) | TagValue::Ifd8(v) => v.len(),
            TagValue::SLong8(v) => v.len(),
        };
        n as u64
    }

    /// Encoded size in bytes
    pub fn byte_len(&self) -> u64 {
        self.count() * self.field_type().size() as u64
    }

    /// Widens unsigned integer values to `u64`
    pub fn as_u64_vec(&self) -> Option<Vec<u64>> {
        match self {
            TagValue::Byte(v) => Some(v.iter().map(|&x| u64::from(x)).collect()),
            TagValue::Short(v) => Some(v.iter().map(|&x| u64::from(x)).collect()),
            TagValue::Long(v) | TagValue::Ifd(v) => Some(v.iter().map(|&x| u64::from(x)).collect()),
            TagValue::Long8(v) | TagValue::Ifd8(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// First value of an unsigned integer field
    pub fn first_u64(&self) -> Option<u64> {
        self.as_u64_vec().and_then(|v| v.first().copied())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// Decodes `count` values of `field_type` from `bytes` in the handler's byte order
    pub fn decode(
        field_type: FieldType,
        count: usize,
        bytes: &[u8],
        handler: &dyn ByteOrderHandler,
    ) -> io::Result<TagValue> {
        let needed = count
            .checked_mul(field_type.size())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "tag value count overflows"))?;
        if bytes.len() < needed {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("tag value needs {} bytes, {} available", needed, bytes.len()),
            ));
        }
        let bytes = &bytes[..needed];
        let mut cursor = Cursor::new(bytes);
        let r: &mut dyn SeekableReader = &mut cursor;

        let value = match field_type {
            FieldType::Byte => TagValue::Byte(bytes.to_vec()),
            FieldType::Undefined => TagValue::Undefined(bytes.to_vec()),
            FieldType::SByte => TagValue::SByte(bytes.iter().map(|&b| b as i8).collect()),
            FieldType::Ascii => {
                let text = String::from_utf8_lossy(bytes);
                TagValue::Ascii(text.trim_end_matches('\0').to_string())
            }
            FieldType::Short => TagValue::Short(read_n(count, || handler.read_u16(r))?),
            FieldType::SShort => TagValue::SShort(read_n(count, || handler.read_i16(r))?),
            FieldType::Long => TagValue::Long(read_n(count, || handler.read_u32(r))?),
            FieldType::Ifd => TagValue::Ifd(read_n(count, || handler.read_u32(r))?),
            FieldType::SLong => TagValue::SLong(read_n(count, || handler.read_i32(r))?),
            FieldType::Rational => TagValue::Rational(read_n(count, || {
                Ok((handler.read_u32(r)?, handler.read_u32(r)?))
            })?),
            FieldType::SRational => TagValue::SRational(read_n(count, || {
                Ok((handler.read_i32(r)?, handler.read_i32(r)?))
            })?),
            FieldType::Float => TagValue::Float(read_n(count, || handler.read_f32(r))?),
            FieldType::Double => TagValue::Double(read_n(count, || handler.read_f64(r))?),
            FieldType::Long8 => TagValue::Long8(read_n(count, || handler.read_u64(r))?),
            FieldType::Ifd8 => TagValue::Ifd8(read_n(count, || handler.read_u64(r))?),
            FieldType::SLong8 => TagValue::SLong8(read_n(count, || handler.read_i64(r))?),
        };
        Ok(value)
    }

    /// Encodes the values in the handler's byte order
    pub fn encode(&self, handler: &dyn ByteOrderHandler) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => out.extend_from_slice(v),
            TagValue::SByte(v) => out.extend(v.iter().map(|&x| x as u8)),
            TagValue::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            TagValue::Short(v) => for &x in v { handler.write_u16(&mut out, x)? },
            TagValue::SShort(v) => for &x in v { handler.write_i16(&mut out, x)? },
            TagValue::Long(v) | TagValue::Ifd(v) => for &x in v { handler.write_u32(&mut out, x)? },
            TagValue::SLong(v) => for &x in v { handler.write_i32(&mut out, x)? },
            TagValue::Rational(v) => {
                for &(n, d) in v {
                    handler.write_u32(&mut out, n)?;
                    handler.write_u32(&mut out, d)?;
                }
            }
            TagValue::SRational(v) => {
                for &(n, d) in v {
                    handler.write_i32(&mut out, n)?;
                    handler.write_i32(&mut out, d)?;
                }
            }
            TagValue::Float(v) => for &x in v { handler.write_f32(&mut out, x)? },
            TagValue::Double(v) => for &x in v { handler.write_f64(&mut out, x)? },
            TagValue::Long8(v) | TagValue::Ifd8(v) => for &x in v { handler.write_u64(&mut out, x)? },
            TagValue::SLong8(v) => for &x in v { handler.write_i64(&mut out, x)? },
        }
        Ok(out)
    }
}

fn read_n<T>(count: usize, mut next: impl FnMut() -> io::Result<T>) -> io::Result<Vec<T>> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(next()?);
    }
    Ok(values)
}

/// Element types that can be fetched from and stored into custom array tags
pub trait TagArray: Sized + Clone {
    /// The field type values of this element are stored as
    const FIELD_TYPE: FieldType;

    /// Reconstructs the array, or `None` if the stored type cannot represent it
    fn from_value(value: &TagValue) -> Option<Vec<Self>>;

    fn into_value(values: Vec<Self>) -> TagValue;
}

impl TagArray for u8 {
    const FIELD_TYPE: FieldType = FieldType::Byte;

    fn from_value(value: &TagValue) -> Option<Vec<Self>> {
        match value {
            TagValue::Byte(v) | TagValue::Undefined(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(values: Vec<Self>) -> TagValue {
        TagValue::Byte(values)
    }
}

impl TagArray for u16 {
    const FIELD_TYPE: FieldType = FieldType::Short;

    fn from_value(value: &TagValue) -> Option<Vec<Self>> {
        match value {
            TagValue::Short(v) => Some(v.clone()),
            TagValue::Byte(v) => Some(v.iter().map(|&x| u16::from(x)).collect()),
            _ => None,
        }
    }

    fn into_value(values: Vec<Self>) -> TagValue {
        TagValue::Short(values)
    }
}

impl TagArray for u32 {
    const FIELD_TYPE: FieldType = FieldType::Long;

    fn from_value(value: &TagValue) -> Option<Vec<Self>> {
        match value {
            TagValue::Long(v) | TagValue::Ifd(v) => Some(v.clone()),
            TagValue::Short(v) => Some(v.iter().map(|&x| u32::from(x)).collect()),
            TagValue::Byte(v) => Some(v.iter().map(|&x| u32::from(x)).collect()),
            _ => None,
        }
    }

    fn into_value(values: Vec<Self>) -> TagValue {
        TagValue::Long(values)
    }
}

impl TagArray for u64 {
    const FIELD_TYPE: FieldType = FieldType::Long8;

    fn from_value(value: &TagValue) -> Option<Vec<Self>> {
        value.as_u64_vec()
    }

    fn into_value(values: Vec<Self>) -> TagValue {
        TagValue::Long8(values)
    }
}

impl TagArray for f64 {
    const FIELD_TYPE: FieldType = FieldType::Double;

    fn from_value(value: &TagValue) -> Option<Vec<Self>> {
        match value {
            TagValue::Double(v) => Some(v.clone()),
            TagValue::Float(v) => Some(v.iter().map(|&x| f64::from(x)).collect()),
            _ => None,
        }
    }

    fn into_value(values: Vec<Self>) -> TagValue {
        TagValue::Double(values)
    }
}
