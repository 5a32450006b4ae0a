//! TIFF writer: one scanline per strip, appended as rows arrive

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::formats::tiff::tags;
use crate::formats::tiff::{TagValue, BIGTIFF_MAGIC, IFD, TIFF_MAGIC};
use crate::io::{ByteOrder, ByteOrderHandler, SeekableWriter};

/// Writes a single-image, uncompressed, strip-per-row TIFF or BigTIFF file.
///
/// Strip data is appended at the end of the file. Every call to
/// [`flush`](Self::flush) appends a directory describing the rows written so
/// far and points the header at it, so the file is readable after each flush.
pub struct TiffWriter {
    writer: BufWriter<File>,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    ifd: IFD,
    /// `(offset, byte_count)` per row; `None` until the row is written
    strips: Vec<Option<(u64, u64)>>,
    /// End of file; the underlying stream is positioned here between calls
    position: u64,
}

impl TiffWriter {
    /// Creates (or truncates) `path` and writes the header
    pub fn create<P: AsRef<Path>>(path: P, byte_order: ByteOrder, is_big_tiff: bool) -> Result<Self> {
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        let handler = byte_order.handler();

        writer.write_all(&byte_order.tiff_magic())?;
        let position = if is_big_tiff {
            handler.write_u16(&mut writer, BIGTIFF_MAGIC)?;
            handler.write_u16(&mut writer, 8)?;
            handler.write_u16(&mut writer, 0)?;
            handler.write_u64(&mut writer, 0)?;
            16
        } else {
            handler.write_u16(&mut writer, TIFF_MAGIC)?;
            handler.write_u32(&mut writer, 0)?;
            8
        };

        debug!(path = %path.as_ref().display(), ?byte_order, is_big_tiff, "created TIFF for writing");

        Ok(Self {
            writer,
            byte_order,
            is_big_tiff,
            ifd: IFD::new(0),
            strips: Vec::new(),
            position,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Fields set so far
    pub fn ifd(&self) -> &IFD {
        &self.ifd
    }

    /// Stores a field for the next directory written.
    ///
    /// Strip offsets and byte counts are maintained by the writer itself.
    pub fn set_field(&mut self, tag: u16, value: TagValue) -> Result<()> {
        if tag == tags::STRIP_OFFSETS || tag == tags::STRIP_BYTE_COUNTS {
            return Err(Error::Unsupported(format!(
                "{} is maintained by the writer",
                tags::tag_name(tag)
            )));
        }
        self.ifd.insert(tag, value);
        Ok(())
    }

    pub fn scanline_size(&self) -> Result<usize> {
        self.ifd.scanline_size()
    }

    fn height(&self) -> Result<usize> {
        let height = self.ifd.get_u64(tags::IMAGE_LENGTH)
            .ok_or(Error::MissingTag(tags::IMAGE_LENGTH))?;
        usize::try_from(height)
            .map_err(|_| Error::InvalidFormat(format!("image height {} too large", height)))
    }

    /// Appends row `row` taken from the front of `buf`.
    ///
    /// Writing a row again appends a new copy and repoints its strip.
    pub fn write_scanline(&mut self, buf: &[u8], row: u32) -> Result<()> {
        let rows_per_strip = self.ifd.get_u64(tags::ROWS_PER_STRIP);
        if rows_per_strip != Some(1) {
            return Err(Error::Unsupported(format!(
                "writing requires RowsPerStrip = 1, found {:?}",
                rows_per_strip
            )));
        }

        let height = self.height()?;
        let row_index = row as usize;
        if row_index >= height {
            return Err(Error::InvalidFormat(format!("row {} outside image height {}", row, height)));
        }

        let scanline = self.scanline_size()?;
        if buf.len() < scanline {
            return Err(Error::BufferTooSmall { expected: scanline, got: buf.len() });
        }

        if !self.is_big_tiff && self.position + scanline as u64 > u64::from(u32::MAX) {
            return Err(Error::Unsupported(format!(
                "row {} would end past the 4 GiB offset limit of classic TIFF",
                row
            )));
        }

        if self.strips.len() != height {
            self.strips.resize(height, None);
        }

        self.writer.write_all(&buf[..scanline])?;
        self.strips[row_index] = Some((self.position, scanline as u64));
        trace!(row, offset = self.position, "wrote scanline");
        self.position += scanline as u64;
        Ok(())
    }

    /// Writes a directory checkpoint for the rows written so far
    pub fn flush(&mut self) -> Result<()> {
        let offset = self.write_directory(false)?;
        debug!(offset, "wrote directory checkpoint");
        Ok(())
    }

    /// Zero-fills rows never written, writes the final directory and flushes
    pub fn finish(&mut self) -> Result<()> {
        let offset = self.write_directory(true)?;
        debug!(offset, rows = self.strips.len(), "finished TIFF");
        Ok(())
    }

    fn write_directory(&mut self, fill_missing: bool) -> Result<u64> {
        let height = self.height()?;
        if self.strips.len() != height {
            self.strips.resize(height, None);
        }

        if fill_missing {
            self.fill_missing_strips()?;
        }

        let handler = self.byte_order.handler();
        let mut fields: Vec<(u16, TagValue)> = self.ifd
            .iter()
            .map(|(tag, value)| (*tag, value.clone()))
            .collect();

        let offsets: Vec<u64> = self.strips.iter().map(|s| s.map_or(0, |(o, _)| o)).collect();
        let counts: Vec<u64> = self.strips.iter().map(|s| s.map_or(0, |(_, c)| c)).collect();
        fields.push((tags::STRIP_OFFSETS, TagValue::Long8(offsets)));
        fields.push((tags::STRIP_BYTE_COUNTS, TagValue::Long8(counts)));
        fields.sort_by_key(|(tag, _)| *tag);

        if !self.is_big_tiff {
            fields = fields
                .into_iter()
                .map(|(tag, value)| narrow_for_classic(tag, value).map(|v| (tag, v)))
                .collect::<Result<_>>()?;
        }

        if self.position % 2 == 1 {
            self.writer.write_all(&[0])?;
            self.position += 1;
        }
        let dir_offset = self.position;

        let blob = self.encode_directory(&fields, dir_offset, &*handler)?;
        self.writer.write_all(&blob)?;
        self.position += blob.len() as u64;

        point_header_at(&mut self.writer, &*handler, self.is_big_tiff, dir_offset)?;
        self.writer.seek(SeekFrom::Start(self.position))?;
        self.writer.flush()?;

        Ok(dir_offset)
    }

    fn fill_missing_strips(&mut self) -> Result<()> {
        let missing = self.strips.iter().filter(|s| s.is_none()).count();
        if missing == 0 {
            return Ok(());
        }

        warn!(missing, "zero-filling rows that were never written");
        let scanline = self.scanline_size()?;
        let zeros = vec![0u8; scanline];
        for strip in self.strips.iter_mut().filter(|s| s.is_none()) {
            self.writer.write_all(&zeros)?;
            *strip = Some((self.position, scanline as u64));
            self.position += scanline as u64;
        }
        Ok(())
    }

    /// Serialises the entry table followed by the out-of-line values
    fn encode_directory(
        &self,
        fields: &[(u16, TagValue)],
        dir_offset: u64,
        handler: &dyn ByteOrderHandler,
    ) -> Result<Vec<u8>> {
        // (entry count, entry, next-IFD pointer) sizes
        let (count_size, entry_size, next_size) = if self.is_big_tiff { (8, 20, 8) } else { (2, 12, 4) };
        let inline_size = if self.is_big_tiff { 8 } else { 4 };
        let table_len = count_size + fields.len() as u64 * entry_size + next_size;

        let mut table = Vec::with_capacity(table_len as usize);
        let mut data = Vec::new();
        let data_start = dir_offset + table_len;

        if self.is_big_tiff {
            handler.write_u64(&mut table, fields.len() as u64)?;
        } else {
            let count = u16::try_from(fields.len())
                .map_err(|_| Error::Unsupported(format!("{} directory entries", fields.len())))?;
            handler.write_u16(&mut table, count)?;
        }

        for (tag, value) in fields {
            let bytes = value.encode(handler)?;
            handler.write_u16(&mut table, *tag)?;
            handler.write_u16(&mut table, value.field_type().into())?;

            if self.is_big_tiff {
                handler.write_u64(&mut table, value.count())?;
            } else {
                let count = u32::try_from(value.count())
                    .map_err(|_| Error::Unsupported(format!("tag {} has too many values", tag)))?;
                handler.write_u32(&mut table, count)?;
            }

            if bytes.len() <= inline_size {
                let mut field = bytes;
                field.resize(inline_size, 0);
                table.extend_from_slice(&field);
            } else {
                if data.len() % 2 == 1 {
                    data.push(0);
                }
                let offset = data_start + data.len() as u64;
                if self.is_big_tiff {
                    handler.write_u64(&mut table, offset)?;
                } else {
                    classic_offset(offset + bytes.len() as u64)?;
                    handler.write_u32(&mut table, offset as u32)?;
                }
                data.extend_from_slice(&bytes);
            }
        }

        if self.is_big_tiff {
            handler.write_u64(&mut table, 0)?;
        } else {
            handler.write_u32(&mut table, 0)?;
        }

        table.extend_from_slice(&data);
        Ok(table)
    }
}

/// Patches the header's first-IFD pointer; the stream position is left after it
fn point_header_at<W: SeekableWriter>(
    writer: &mut W,
    handler: &dyn ByteOrderHandler,
    is_big_tiff: bool,
    dir_offset: u64,
) -> Result<()> {
    if is_big_tiff {
        writer.seek(SeekFrom::Start(8))?;
        handler.write_u64(writer, dir_offset)?;
    } else {
        writer.seek(SeekFrom::Start(4))?;
        handler.write_u32(writer, classic_offset(dir_offset)?)?;
    }
    Ok(())
}

fn classic_offset(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| {
        Error::Unsupported(format!(
            "offset {} exceeds the classic TIFF limit; write a BigTIFF instead",
            offset
        ))
    })
}

/// Classic TIFF has no 64-bit field types; store them as 32-bit when they fit
fn narrow_for_classic(tag: u16, value: TagValue) -> Result<TagValue> {
    let too_large = || Error::Unsupported(format!(
        "{} ({}) holds 64-bit values that do not fit classic TIFF",
        tags::tag_name(tag),
        tag
    ));

    match value {
        TagValue::Long8(v) => v.into_iter()
            .map(|x| u32::try_from(x).map_err(|_| too_large()))
            .collect::<Result<_>>()
            .map(TagValue::Long),
        TagValue::Ifd8(v) => v.into_iter()
            .map(|x| u32::try_from(x).map_err(|_| too_large()))
            .collect::<Result<_>>()
            .map(TagValue::Ifd),
        TagValue::SLong8(v) => v.into_iter()
            .map(|x| i32::try_from(x).map_err(|_| too_large()))
            .collect::<Result<_>>()
            .map(TagValue::SLong),
        other => Ok(other),
    }
}
