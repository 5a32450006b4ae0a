//! TIFF and BigTIFF format support

pub mod tags;
pub mod value;
pub mod fields;
pub mod ifd;
pub mod reader;
pub mod writer;
pub mod file;
pub mod options;
pub mod attributes;
pub mod image;
pub mod region;
pub mod geotiff;

pub use ifd::{IFD, IFDEntry};
pub use value::{TagArray, TagValue};
pub use fields::{FieldInfo, FieldRegistry};
pub use reader::TiffReader;
pub use writer::TiffWriter;
pub use file::TiffFile;
pub use options::{ReadOptions, WriteOptions};
pub use attributes::TiffAttributes;
pub use image::LazyTiffImage;
pub use geotiff::{
    DirectoryEntry, GeoKey, GeoKeyDirectory, GeoKeyValue, GeoTiffImage, GeoTiffTag, GEO_FIELDS,
};

/// TIFF magic number (42)
pub const TIFF_MAGIC: u16 = 42;

/// BigTIFF magic number (43)
pub const BIGTIFF_MAGIC: u16 = 43;
