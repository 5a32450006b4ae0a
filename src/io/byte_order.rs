//! Byte order (endianness) handling
//!
//! Provides utilities for reading and writing multi-byte values in the byte
//! order declared by a TIFF header.

use std::io::{self, Result, Write};

use crate::io::SeekableReader;

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    #[default]
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    /// The two header bytes announcing this byte order
    pub fn tiff_magic(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    /// Reads and detects byte order from a reader
    ///
    /// Reads the first 2 bytes and attempts to identify the byte order
    /// based on TIFF magic number conventions.
    pub fn detect<R: SeekableReader>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic)?;

        Self::from_tiff_magic(magic).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid byte order magic bytes: {:02X}{:02X}", magic[0], magic[1])
            )
        })
    }

    /// Creates a handler for this byte order
    pub fn handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndian),
            ByteOrder::BigEndian => Box::new(BigEndian),
        }
    }
}

/// Trait for reading and writing typed values with a specific byte order
///
/// Only the unsigned primitives differ between orders; the signed and
/// floating point forms are bit casts of them.
pub trait ByteOrderHandler: Send + Sync {
    /// Reads an unsigned 16-bit integer
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    /// Reads an unsigned 32-bit integer
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    /// Reads an unsigned 64-bit integer
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;

    fn write_u16(&self, writer: &mut dyn Write, value: u16) -> Result<()>;

    fn write_u32(&self, writer: &mut dyn Write, value: u32) -> Result<()>;

    fn write_u64(&self, writer: &mut dyn Write, value: u64) -> Result<()>;

    /// Reads a signed 16-bit integer
    fn read_i16(&self, reader: &mut dyn SeekableReader) -> Result<i16> {
        self.read_u16(reader).map(|v| v as i16)
    }

    /// Reads a signed 32-bit integer
    fn read_i32(&self, reader: &mut dyn SeekableReader) -> Result<i32> {
        self.read_u32(reader).map(|v| v as i32)
    }

    /// Reads a signed 64-bit integer
    fn read_i64(&self, reader: &mut dyn SeekableReader) -> Result<i64> {
        self.read_u64(reader).map(|v| v as i64)
    }

    /// Reads a 32-bit floating point number
    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32> {
        self.read_u32(reader).map(f32::from_bits)
    }

    /// Reads a 64-bit floating point number
    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        self.read_u64(reader).map(f64::from_bits)
    }

    fn write_i16(&self, writer: &mut dyn Write, value: i16) -> Result<()> {
        self.write_u16(writer, value as u16)
    }

    fn write_i32(&self, writer: &mut dyn Write, value: i32) -> Result<()> {
        self.write_u32(writer, value as u32)
    }

    fn write_i64(&self, writer: &mut dyn Write, value: i64) -> Result<()> {
        self.write_u64(writer, value as u64)
    }

    fn write_f32(&self, writer: &mut dyn Write, value: f32) -> Result<()> {
        self.write_u32(writer, value.to_bits())
    }

    fn write_f64(&self, writer: &mut dyn Write, value: f64) -> Result<()> {
        self.write_u64(writer, value.to_bits())
    }
}

struct LittleEndian;

impl ByteOrderHandler for LittleEndian {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write_u16(&self, writer: &mut dyn Write, value: u16) -> Result<()> {
        writer.write_all(&value.to_le_bytes())
    }

    fn write_u32(&self, writer: &mut dyn Write, value: u32) -> Result<()> {
        writer.write_all(&value.to_le_bytes())
    }

    fn write_u64(&self, writer: &mut dyn Write, value: u64) -> Result<()> {
        writer.write_all(&value.to_le_bytes())
    }
}

struct BigEndian;

impl ByteOrderHandler for BigEndian {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn write_u16(&self, writer: &mut dyn Write, value: u16) -> Result<()> {
        writer.write_all(&value.to_be_bytes())
    }

    fn write_u32(&self, writer: &mut dyn Write, value: u32) -> Result<()> {
        writer.write_all(&value.to_be_bytes())
    }

    fn write_u64(&self, writer: &mut dyn Write, value: u64) -> Result<()> {
        writer.write_all(&value.to_be_bytes())
    }
}
