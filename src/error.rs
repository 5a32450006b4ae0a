//! Error types for lazytiff

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Area, ChannelKind, Mode, Size};

/// Result type for lazytiff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in lazytiff operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The file could not be opened or created
    #[error("failed to open {}: {source}", path.display())]
    OpenFailure {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The image handle has been closed
    #[error("image handle has already been closed")]
    InvalidReference,

    /// The operation is not allowed in the handle's mode
    #[error("operation requires {expected:?} mode but the image is open in {actual:?} mode")]
    WrongMode { expected: Mode, actual: Mode },

    /// Pending writes could not be forced to storage
    #[error("failed to flush image: {0}")]
    FlushFailure(#[source] Box<Error>),

    /// The channel element type has no TIFF sample format
    #[error("channel type {0:?} cannot be written to a TIFF file")]
    UnsupportedType(ChannelKind),

    /// The file's bit depth does not match the channel element type
    #[error("file stores {bits_per_sample} bits per sample but the channel type holds {channel_bits}")]
    IncorrectChannelSize { bits_per_sample: u16, channel_bits: u16 },

    /// The requested area does not fit inside the image
    #[error("area {area:?} lies outside an image of {size:?}")]
    AreaOutOfBounds { area: Area, size: Size },

    /// Writes must cover whole scanlines
    #[error("area {area:?} does not cover full scanlines; partial scanline writes are not supported")]
    PartialScanlineUnsupported { area: Area },

    /// A scanline could not be read
    #[error("failed to read scanline {row}: {source}")]
    ScanlineReadFailure {
        row: u32,
        #[source]
        source: Box<Error>,
    },

    /// A scanline could not be written
    #[error("failed to write scanline {row}: {source}")]
    ScanlineWriteFailure {
        row: u32,
        #[source]
        source: Box<Error>,
    },

    /// The codec's scanline geometry disagrees with the image attributes
    #[error("scanline is {actual} bytes but the attributes describe {expected} bytes")]
    InternalInconsistency { expected: usize, actual: usize },

    /// An empty buffer was supplied to a write
    #[error("no pixel data supplied")]
    NoBaseAddress,

    /// The supplied buffer is shorter than the area it describes
    #[error("buffer holds {got} samples but the area needs {expected}")]
    BufferTooSmall { expected: usize, got: usize },

    /// A custom tag is absent from the file
    #[error("tag {0} not found")]
    TagNotFound(u16),

    /// A custom tag is present but its values cannot be reconstructed as the requested type
    #[error("tag {0} is present but its values could not be reconstructed")]
    MemoryError(u16),

    /// The geo-key directory is shorter than its 4-value header
    #[error("geo key directory has {0} values, expected at least 4")]
    DirectoryHeaderTooShort(usize),

    /// The geo-key directory length disagrees with its declared key count
    #[error("geo key directory should have {expected} values but has {got}")]
    DirectorySizeIncorrect { expected: usize, got: usize },

    /// A geo-key directory entry names a key outside the GeoTIFF key set
    #[error("unrecognised geo key {0}")]
    UnrecognisedGeoKey(u16),

    /// A directory cannot be encoded because its key count exceeds the 16-bit count field
    #[error("geo key directory has {0} entries, at most 65535 can be encoded")]
    TooManyGeoKeys(usize),

    /// Field definitions could not be merged into the file's schema
    #[error("failed to register tag {0}: it is already defined with a different type")]
    FailedToAddTags(u16),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid TIFF format
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid TIFF magic number
    #[error("invalid TIFF magic number: {0}")]
    InvalidMagic(u16),

    /// Missing required tag
    #[error("missing required tag: {0}")]
    MissingTag(u16),

    /// The tag has no field definition and cannot be set
    #[error("tag {0} has no field definition")]
    UnknownTag(u16),

    /// Unsupported feature
    #[error("unsupported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFormat("test".to_string());
        assert_eq!(err.to_string(), "invalid format: test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_directory_size_incorrect() {
        let err = Error::DirectorySizeIncorrect { expected: 12, got: 10 };
        let text = err.to_string();
        assert!(text.contains("12"));
        assert!(text.contains("10"));
    }

    #[test]
    fn test_scanline_failure_keeps_source() {
        use std::error::Error as _;

        let err = Error::ScanlineReadFailure {
            row: 7,
            source: Box::new(Error::MissingTag(273)),
        };
        assert!(err.to_string().contains("scanline 7"));
        assert!(err.source().unwrap().to_string().contains("273"));
    }

    #[test]
    fn test_area_out_of_bounds_mentions_area() {
        let err = Error::AreaOutOfBounds {
            area: Area::new(Point::new(90, 0), Size::new(20, 1)),
            size: Size::new(100, 100),
        };
        assert!(err.to_string().contains("90"));
    }
}
