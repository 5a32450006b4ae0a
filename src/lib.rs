//! lazytiff - Typed, lazily evaluated TIFF and GeoTIFF images
//!
//! lazytiff reads and writes single-page, uncompressed, strip-organized TIFF
//! and BigTIFF files one scanline at a time. Images are typed by their
//! channel sample type, and pixel data is only touched by explicit region
//! reads and writes. The GeoTIFF extension adds the geo-key directory and
//! the model transform tags on top of the same handle.
//!
//! # Examples
//!
//! ## Writing and reading an image
//!
//! ```no_run
//! use lazytiff::{Area, LazyTiffImage, Point, Size};
//!
//! let size = Size::new(256, 128);
//! let mut image = LazyTiffImage::<u16>::create("gradient.tif", size, 1, false)?;
//! for y in 0..size.height {
//!     let row: Vec<u16> = (0..size.width).map(|x| (x * y) as u16).collect();
//!     image.write(Area::new(Point::new(0, y), Size::new(size.width, 1)), &row)?;
//! }
//! image.close()?;
//!
//! let mut image = LazyTiffImage::<u16>::open("gradient.tif")?;
//! let window = image.read(Area::new(Point::new(10, 10), Size::new(4, 4)))?;
//! println!("{:?}", window);
//! # Ok::<(), lazytiff::Error>(())
//! ```
//!
//! ## GeoTIFF metadata
//!
//! ```no_run
//! use lazytiff::{GeoKey, GeoTiffImage};
//!
//! let image = GeoTiffImage::<f32>::open("dem.tif")?;
//! let scale = image.get_pixel_scale()?;
//! let tie_point = image.get_tie_point()?;
//! let directory = image.get_directory()?;
//! if let Some(entry) = directory.get(GeoKey::ProjectedCSType) {
//!     println!("EPSG:{} scale {:?} origin {:?}", entry.value_or_index, scale, tie_point);
//! }
//! # Ok::<(), lazytiff::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod formats;

pub use error::{Error, Result};
pub use types::{Area, Channel, ChannelKind, Mode, Point, Size};
pub use formats::tiff::{
    DirectoryEntry, GeoKey, GeoKeyDirectory, GeoKeyValue, GeoTiffImage, LazyTiffImage,
    ReadOptions, TiffAttributes, TiffFile, WriteOptions,
    tags, TIFF_MAGIC, BIGTIFF_MAGIC
};
pub use io::ByteOrder;
