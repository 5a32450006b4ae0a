//! Directory and tag value reading operations

use std::io::SeekFrom;

use tracing::warn;

use crate::error::{Error, Result};
use crate::formats::tiff::{IFDEntry, TagValue, IFD};
use crate::io::{ByteOrderHandler, SeekableReader};

/// Reads directory entries and their values from a TIFF stream
pub struct TagReader<'a> {
    reader: &'a mut dyn SeekableReader,
    handler: &'a dyn ByteOrderHandler,
    is_big_tiff: bool,
    stream_len: u64,
}

impl<'a> TagReader<'a> {
    pub fn new(
        reader: &'a mut dyn SeekableReader,
        handler: &'a dyn ByteOrderHandler,
        is_big_tiff: bool,
        stream_len: u64,
    ) -> Self {
        Self {
            reader,
            handler,
            is_big_tiff,
            stream_len,
        }
    }

    fn entry_size(&self) -> u64 {
        if self.is_big_tiff { 20 } else { 12 }
    }

    /// Reads the directory at `offset` and returns it with the offset of the next one
    pub fn read_ifd(&mut self, offset: u64) -> Result<(IFD, u64)> {
        self.reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            self.handler.read_u64(self.reader)?
        } else {
            u64::from(self.handler.read_u16(self.reader)?)
        };

        let table_fits = entry_count
            .checked_mul(self.entry_size())
            .and_then(|len| offset.checked_add(len))
            .is_some_and(|end| end <= self.stream_len);
        if !table_fits {
            return Err(Error::InvalidFormat(format!(
                "IFD at {} declares {} entries past end of file",
                offset, entry_count
            )));
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(self.read_entry()?);
        }

        let next_offset = if self.is_big_tiff {
            self.handler.read_u64(self.reader)?
        } else {
            u64::from(self.handler.read_u32(self.reader)?)
        };

        let mut ifd = IFD::new(offset);
        for entry in &entries {
            if let Some(value) = self.read_value(entry)? {
                ifd.insert(entry.tag, value);
            }
        }

        Ok((ifd, next_offset))
    }

    /// Reads one raw entry at the current position
    pub fn read_entry(&mut self) -> Result<IFDEntry> {
        let tag = self.handler.read_u16(self.reader)?;
        let field_type = self.handler.read_u16(self.reader)?;

        let mut value_field = [0u8; 8];
        let count = if self.is_big_tiff {
            let count = self.handler.read_u64(self.reader)?;
            self.reader.read_exact(&mut value_field)?;
            count
        } else {
            let count = u64::from(self.handler.read_u32(self.reader)?);
            self.reader.read_exact(&mut value_field[..4])?;
            count
        };

        Ok(IFDEntry::new(tag, field_type, count, value_field))
    }

    /// Decodes an entry's values, reading out-of-line data from the stream.
    ///
    /// Entries with a field type this crate does not know are skipped.
    pub fn read_value(&mut self, entry: &IFDEntry) -> Result<Option<TagValue>> {
        let Some(field_type) = entry.field_type() else {
            warn!(tag = entry.tag, field_type = entry.field_type, "skipping entry with unknown field type");
            return Ok(None);
        };

        let byte_len = entry
            .byte_len()
            .filter(|len| *len <= self.stream_len)
            .ok_or_else(|| Error::InvalidFormat(format!("tag {} has an impossible value count {}", entry.tag, entry.count)))?;
        let count = entry.count as usize;

        if entry.is_inline(self.is_big_tiff) {
            let value = TagValue::decode(field_type, count, &entry.value_field, self.handler)?;
            return Ok(Some(value));
        }

        let offset = entry.value_offset(self.handler, self.is_big_tiff)?;
        if offset.checked_add(byte_len).map_or(true, |end| end > self.stream_len) {
            return Err(Error::InvalidFormat(format!(
                "tag {} value at {} (+{} bytes) lies past end of file",
                entry.tag, offset, byte_len
            )));
        }

        let mut bytes = vec![0u8; byte_len as usize];
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut bytes)?;

        let value = TagValue::decode(field_type, count, &bytes, self.handler)?;
        Ok(Some(value))
    }
}
