//! `TiffFile`: the exclusively owned native handle behind an image

use std::path::Path;

use super::fields::{FieldInfo, FieldRegistry};
use super::options::{ReadOptions, WriteOptions};
use super::reader::TiffReader;
use super::value::{TagArray, TagValue};
use super::writer::TiffWriter;
use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::Mode;

enum Backend {
    Reader(TiffReader),
    Writer(TiffWriter),
}

/// An open TIFF file in either read or write mode.
///
/// Provides scanline I/O, field access and custom tag arrays. Closing consumes
/// the handle, so it can be released only once.
pub struct TiffFile {
    backend: Backend,
    registry: FieldRegistry,
}

impl TiffFile {
    /// Opens an existing file for reading
    pub fn open_read<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let reader = TiffReader::open_with_options(path, options.use_mmap)?;
        Ok(Self {
            backend: Backend::Reader(reader),
            registry: FieldRegistry::standard(),
        })
    }

    /// Creates a new file for writing, truncating any existing one
    pub fn create<P: AsRef<Path>>(path: P, options: &WriteOptions) -> Result<Self> {
        let writer = TiffWriter::create(path, options.byte_order, options.big_tiff)?;
        Ok(Self {
            backend: Backend::Writer(writer),
            registry: FieldRegistry::standard(),
        })
    }

    pub fn mode(&self) -> Mode {
        match self.backend {
            Backend::Reader(_) => Mode::Read,
            Backend::Writer(_) => Mode::Write,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        match &self.backend {
            Backend::Reader(r) => r.byte_order(),
            Backend::Writer(w) => w.byte_order(),
        }
    }

    pub fn is_big_tiff(&self) -> bool {
        match &self.backend {
            Backend::Reader(r) => r.is_big_tiff(),
            Backend::Writer(w) => w.is_big_tiff(),
        }
    }

    /// The field schema used to validate `set_field`
    pub fn fields(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Merges extra field definitions into this file's schema
    pub fn register_fields(&mut self, infos: &[FieldInfo]) -> Result<()> {
        self.registry.register(infos)
    }

    /// Forces pending writes to storage. A no-op in read mode.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Reader(_) => Ok(()),
            Backend::Writer(w) => w.flush(),
        }
    }

    /// Completes the file and releases it
    pub fn close(self) -> Result<()> {
        match self.backend {
            Backend::Reader(_) => Ok(()),
            Backend::Writer(mut w) => w.finish(),
        }
    }

    /// Size in bytes of one scanline as described by the current fields
    pub fn scanline_size(&self) -> Result<usize> {
        match &self.backend {
            Backend::Reader(r) => r.scanline_size(),
            Backend::Writer(w) => w.scanline_size(),
        }
    }

    pub fn read_scanline(&mut self, buf: &mut [u8], row: u32) -> Result<()> {
        match &mut self.backend {
            Backend::Reader(r) => r.read_scanline(buf, row),
            Backend::Writer(_) => Err(Error::WrongMode { expected: Mode::Read, actual: Mode::Write }),
        }
    }

    pub fn write_scanline(&mut self, buf: &[u8], row: u32) -> Result<()> {
        match &mut self.backend {
            Backend::Writer(w) => w.write_scanline(buf, row),
            Backend::Reader(_) => Err(Error::WrongMode { expected: Mode::Write, actual: Mode::Read }),
        }
    }

    /// Gets a field's value, if present
    pub fn get_field(&self, tag: u16) -> Option<&TagValue> {
        match &self.backend {
            Backend::Reader(r) => r.ifd().get(tag),
            Backend::Writer(w) => w.ifd().get(tag),
        }
    }

    /// Sets a field whose tag is registered with a compatible type
    pub fn set_field(&mut self, tag: u16, value: TagValue) -> Result<()> {
        let Backend::Writer(writer) = &mut self.backend else {
            return Err(Error::WrongMode { expected: Mode::Write, actual: Mode::Read });
        };
        self.registry.check(tag, value.field_type())?;
        writer.set_field(tag, value)
    }

    /// Fetches a custom tag as an array of `T`.
    ///
    /// Fails with `TagNotFound` when the tag is absent and `MemoryError` when
    /// its stored values cannot be reconstructed as `T`.
    pub fn get_custom_array<T: TagArray>(&self, tag: u16) -> Result<Vec<T>> {
        let value = self.get_field(tag).ok_or(Error::TagNotFound(tag))?;
        T::from_value(value).ok_or(Error::MemoryError(tag))
    }

    pub fn set_custom_array<T: TagArray>(&mut self, tag: u16, values: &[T]) -> Result<()> {
        self.set_field(tag, T::into_value(values.to_vec()))
    }

    /// Fetches an ASCII tag without its NUL terminator
    pub fn get_custom_ascii(&self, tag: u16) -> Result<String> {
        let value = self.get_field(tag).ok_or(Error::TagNotFound(tag))?;
        value.as_str().map(str::to_string).ok_or(Error::MemoryError(tag))
    }

    pub fn set_custom_ascii(&mut self, tag: u16, text: &str) -> Result<()> {
        if text.contains('\0') {
            return Err(Error::InvalidFormat(format!("ASCII value for tag {} contains NUL", tag)));
        }
        self.set_field(tag, TagValue::Ascii(text.to_string()))
    }
}
