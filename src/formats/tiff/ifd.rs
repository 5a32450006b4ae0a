//! Image File Directory (IFD) structures

use std::collections::btree_map::{self, BTreeMap};
use std::io::{self, Cursor};

use super::tags::{self, FieldType};
use super::value::TagValue;
use crate::error::{Error, Result};
use crate::io::ByteOrderHandler;

/// A raw directory entry as laid out on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Raw field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Inline value bytes or the offset to the value, in file byte order.
    /// Classic TIFF only uses the first 4 bytes.
    pub value_field: [u8; 8],
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value_field: [u8; 8]) -> Self {
        Self {
            tag,
            field_type,
            count,
            value_field,
        }
    }

    /// The field type, if it is one this crate understands
    pub fn field_type(&self) -> Option<FieldType> {
        FieldType::try_from(self.field_type).ok()
    }

    /// Total size of the entry's values in bytes
    pub fn byte_len(&self) -> Option<u64> {
        let size = self.field_type()?.size() as u64;
        self.count.checked_mul(size)
    }

    /// Returns whether the value is stored inline (in the value field)
    pub fn is_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        matches!(self.byte_len(), Some(len) if len <= inline_size)
    }

    /// Interprets the value field as an offset into the file
    pub fn value_offset(&self, handler: &dyn ByteOrderHandler, is_big_tiff: bool) -> io::Result<u64> {
        let mut cursor = Cursor::new(&self.value_field[..]);
        if is_big_tiff {
            handler.read_u64(&mut cursor)
        } else {
            handler.read_u32(&mut cursor).map(u64::from)
        }
    }
}

/// A decoded Image File Directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IFD {
    /// Offset to this IFD in file
    pub offset: u64,
    fields: BTreeMap<u16, TagValue>,
}

impl IFD {
    /// Creates a new IFD
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            fields: BTreeMap::new(),
        }
    }

    /// Stores a value, replacing any previous value for the tag
    pub fn insert(&mut self, tag: u16, value: TagValue) -> Option<TagValue> {
        self.fields.insert(tag, value)
    }

    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.fields.get(&tag)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Iterates over the fields in ascending tag order
    pub fn iter(&self) -> btree_map::Iter<'_, u16, TagValue> {
        self.fields.iter()
    }

    /// Returns number of entries
    pub fn entry_count(&self) -> usize {
        self.fields.len()
    }

    /// Gets the first value of an unsigned integer tag
    pub fn get_u64(&self, tag: u16) -> Option<u64> {
        self.get(tag).and_then(TagValue::first_u64)
    }

    /// Gets all values of an unsigned integer tag
    pub fn get_u64_vec(&self, tag: u16) -> Option<Vec<u64>> {
        self.get(tag).and_then(TagValue::as_u64_vec)
    }

    /// Returns compression type (default: none)
    pub fn compression(&self) -> u64 {
        self.get_u64(tags::COMPRESSION).unwrap_or(u64::from(tags::COMPRESSION_NONE))
    }

    /// Returns samples per pixel
    pub fn samples_per_pixel(&self) -> u64 {
        self.get_u64(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Returns bits per sample of the first sample
    pub fn bits_per_sample(&self) -> Option<u64> {
        self.get_u64(tags::BITS_PER_SAMPLE)
    }

    /// Rows per strip, defaulting to the whole image
    pub fn rows_per_strip(&self) -> Option<u64> {
        self.get_u64(tags::ROWS_PER_STRIP)
            .or_else(|| self.get_u64(tags::IMAGE_LENGTH))
    }

    /// Size in bytes of one scanline: `ceil(width * samples * bits / 8)`
    pub fn scanline_size(&self) -> Result<usize> {
        let width = self.get_u64(tags::IMAGE_WIDTH)
            .ok_or(Error::MissingTag(tags::IMAGE_WIDTH))?;
        let bits = self.bits_per_sample().unwrap_or(1);
        let samples = self.samples_per_pixel();

        width
            .checked_mul(samples)
            .and_then(|n| n.checked_mul(bits))
            .map(|total_bits| total_bits.div_ceil(8))
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(|| Error::InvalidFormat("scanline size overflows".to_string()))
    }

    /// Returns whether this IFD represents a tiled image
    pub fn is_tiled(&self) -> bool {
        self.contains(tags::TILE_WIDTH)
    }
}
