//! TIFF reader: header parsing, first-directory decoding and strip access

pub mod tags;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::formats::tiff::tags::{self as tiff_tags, PlanarConfiguration};
use crate::formats::tiff::{IFD, BIGTIFF_MAGIC, TIFF_MAGIC};
use crate::io::ByteOrder;

use self::tags::TagReader;

/// Reads the first image of a stripped, uncompressed TIFF or BigTIFF file
pub struct TiffReader {
    reader: BufReader<File>,
    mmap: Option<Mmap>,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    ifd: IFD,
    strip_offsets: Vec<u64>,
    strip_byte_counts: Vec<u64>,
}

impl TiffReader {
    /// Opens a TIFF file for reading with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, true)
    }

    /// Opens a TIFF file with custom options
    ///
    /// # Arguments
    /// * `path` - Path to the TIFF file
    /// * `use_mmap` - Whether to serve strip data from a memory map
    pub fn open_with_options<P: AsRef<Path>>(path: P, use_mmap: bool) -> Result<Self> {
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let byte_order = ByteOrder::detect(&mut reader)?;
        let handler = byte_order.handler();

        let magic = handler.read_u16(&mut reader)?;
        let is_big_tiff = match magic {
            TIFF_MAGIC => false,
            BIGTIFF_MAGIC => true,
            _ => return Err(Error::InvalidMagic(magic)),
        };

        let first_ifd_offset = if is_big_tiff {
            let offset_size = handler.read_u16(&mut reader)?;
            if offset_size != 8 {
                return Err(Error::InvalidFormat(
                    format!("Invalid BigTIFF offset size: {}", offset_size)
                ));
            }
            let reserved = handler.read_u16(&mut reader)?;
            if reserved != 0 {
                return Err(Error::InvalidFormat(
                    format!("Invalid BigTIFF reserved field: {}", reserved)
                ));
            }
            handler.read_u64(&mut reader)?
        } else {
            u64::from(handler.read_u32(&mut reader)?)
        };

        if first_ifd_offset == 0 {
            return Err(Error::InvalidFormat("file contains no image directory".to_string()));
        }

        let (ifd, next_ifd_offset) =
            TagReader::new(&mut reader, &*handler, is_big_tiff, file_len).read_ifd(first_ifd_offset)?;
        if next_ifd_offset != 0 {
            warn!(next_ifd_offset, "ignoring additional image directories");
        }

        let strip_offsets = ifd.get_u64_vec(tiff_tags::STRIP_OFFSETS).unwrap_or_default();
        let strip_byte_counts = ifd.get_u64_vec(tiff_tags::STRIP_BYTE_COUNTS).unwrap_or_default();

        let mmap = if use_mmap {
            let mmap = unsafe { Mmap::map(reader.get_ref())? };

            #[cfg(unix)]
            unsafe {
                libc::madvise(
                    mmap.as_ptr() as *mut libc::c_void,
                    mmap.len(),
                    libc::MADV_SEQUENTIAL,
                );
            }

            Some(mmap)
        } else {
            None
        };

        debug!(
            path = %path.as_ref().display(),
            ?byte_order,
            is_big_tiff,
            entries = ifd.entry_count(),
            strips = strip_offsets.len(),
            mmap = mmap.is_some(),
            "opened TIFF for reading"
        );

        Ok(Self {
            reader,
            mmap,
            byte_order,
            is_big_tiff,
            ifd,
            strip_offsets,
            strip_byte_counts,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// The decoded first image directory
    pub fn ifd(&self) -> &IFD {
        &self.ifd
    }

    /// Size in bytes of one decoded scanline
    pub fn scanline_size(&self) -> Result<usize> {
        self.ifd.scanline_size()
    }

    /// Reads row `row` into the front of `buf`
    pub fn read_scanline(&mut self, buf: &mut [u8], row: u32) -> Result<()> {
        self.check_layout()?;

        let scanline = self.scanline_size()?;
        if buf.len() < scanline {
            return Err(Error::BufferTooSmall { expected: scanline, got: buf.len() });
        }

        let height = self.ifd.get_u64(tiff_tags::IMAGE_LENGTH)
            .ok_or(Error::MissingTag(tiff_tags::IMAGE_LENGTH))?;
        if u64::from(row) >= height {
            return Err(Error::InvalidFormat(format!("row {} outside image height {}", row, height)));
        }

        let (start, end) = self.row_location(row, scanline as u64)?;
        let target = &mut buf[..scanline];

        match &self.mmap {
            Some(mmap) => {
                let bytes = usize::try_from(start)
                    .ok()
                    .zip(usize::try_from(end).ok())
                    .and_then(|(s, e)| mmap.get(s..e))
                    .ok_or_else(|| Error::InvalidFormat(format!("strip data for row {} lies past end of file", row)))?;
                target.copy_from_slice(bytes);
            }
            None => {
                self.reader.seek(SeekFrom::Start(start))?;
                self.reader.read_exact(target)?;
            }
        }

        trace!(row, start, "read scanline");
        Ok(())
    }

    fn check_layout(&self) -> Result<()> {
        if self.ifd.is_tiled() {
            return Err(Error::Unsupported("tiled images".to_string()));
        }
        let compression = self.ifd.compression();
        if compression != u64::from(tiff_tags::COMPRESSION_NONE) {
            return Err(Error::Unsupported(format!("compression scheme {}", compression)));
        }
        let planar = self.ifd.get_u64(tiff_tags::PLANAR_CONFIGURATION)
            .unwrap_or(u64::from(u16::from(PlanarConfiguration::Contiguous)));
        if planar != u64::from(u16::from(PlanarConfiguration::Contiguous)) {
            return Err(Error::Unsupported("separate planar configuration".to_string()));
        }
        Ok(())
    }

    /// Byte range of a row inside its strip
    fn row_location(&self, row: u32, scanline: u64) -> Result<(u64, u64)> {
        if self.strip_offsets.is_empty() {
            return Err(Error::MissingTag(tiff_tags::STRIP_OFFSETS));
        }
        if self.strip_byte_counts.is_empty() {
            return Err(Error::MissingTag(tiff_tags::STRIP_BYTE_COUNTS));
        }

        let rows_per_strip = self.ifd.rows_per_strip().unwrap_or(u64::MAX);
        if rows_per_strip == 0 {
            return Err(Error::InvalidFormat("RowsPerStrip is 0".to_string()));
        }

        let row = u64::from(row);
        let strip = (row / rows_per_strip) as usize;
        let within = (row % rows_per_strip) * scanline;

        let (offset, count) = self.strip_offsets.get(strip)
            .zip(self.strip_byte_counts.get(strip))
            .ok_or_else(|| Error::InvalidFormat(format!("no strip {} for row {}", strip, row)))?;

        if within + scanline > *count {
            return Err(Error::InvalidFormat(format!(
                "strip {} holds {} bytes, row {} needs {}",
                strip, count, row, within + scanline
            )));
        }

        let start = offset.checked_add(within)
            .ok_or_else(|| Error::InvalidFormat(format!("strip {} offset overflows", strip)))?;
        Ok((start, start + scanline))
    }
}
