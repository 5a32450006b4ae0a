//! TIFF tag constants and enumerated tag values

use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

/// Image width in pixels
pub const IMAGE_WIDTH: u16 = 256;

/// Image height in pixels
pub const IMAGE_LENGTH: u16 = 257;

/// Bits per sample
pub const BITS_PER_SAMPLE: u16 = 258;

/// Compression scheme
pub const COMPRESSION: u16 = 259;

/// Photometric interpretation
pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;

/// Image description
pub const IMAGE_DESCRIPTION: u16 = 270;

/// Strip offsets
pub const STRIP_OFFSETS: u16 = 273;

/// Orientation of the first row and column
pub const ORIENTATION: u16 = 274;

/// Samples per pixel
pub const SAMPLES_PER_PIXEL: u16 = 277;

/// Rows per strip
pub const ROWS_PER_STRIP: u16 = 278;

/// Strip byte counts
pub const STRIP_BYTE_COUNTS: u16 = 279;

/// X resolution
pub const X_RESOLUTION: u16 = 282;

/// Y resolution
pub const Y_RESOLUTION: u16 = 283;

/// Planar configuration
pub const PLANAR_CONFIGURATION: u16 = 284;

/// Resolution unit
pub const RESOLUTION_UNIT: u16 = 296;

/// Software
pub const SOFTWARE: u16 = 305;

/// Date/time
pub const DATE_TIME: u16 = 306;

/// Tile width
pub const TILE_WIDTH: u16 = 322;

/// Tile length
pub const TILE_LENGTH: u16 = 323;

/// Tile offsets
pub const TILE_OFFSETS: u16 = 324;

/// Tile byte counts
pub const TILE_BYTE_COUNTS: u16 = 325;

/// Extra samples
pub const EXTRA_SAMPLES: u16 = 338;

/// Sample format
pub const SAMPLE_FORMAT: u16 = 339;

/// GeoTIFF ModelPixelScaleTag
pub const MODEL_PIXEL_SCALE: u16 = 33550;

/// GeoTIFF ModelTiepointTag
pub const MODEL_TIEPOINT: u16 = 33922;

/// GeoTIFF ModelTransformationTag
pub const MODEL_TRANSFORMATION: u16 = 34264;

/// GeoTIFF GeoKeyDirectoryTag
pub const GEO_KEY_DIRECTORY: u16 = 34735;

/// GeoTIFF GeoDoubleParamsTag
pub const GEO_DOUBLE_PARAMS: u16 = 34736;

/// GeoTIFF GeoAsciiParamsTag
pub const GEO_ASCII_PARAMS: u16 = 34737;

/// Compression value for uncompressed data
pub const COMPRESSION_NONE: u16 = 1;

/// Returns the name of a TIFF tag
pub fn tag_name(tag: u16) -> &'static str {
    match tag {
        IMAGE_WIDTH => "ImageWidth",
        IMAGE_LENGTH => "ImageLength",
        BITS_PER_SAMPLE => "BitsPerSample",
        COMPRESSION => "Compression",
        PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        IMAGE_DESCRIPTION => "ImageDescription",
        STRIP_OFFSETS => "StripOffsets",
        ORIENTATION => "Orientation",
        SAMPLES_PER_PIXEL => "SamplesPerPixel",
        ROWS_PER_STRIP => "RowsPerStrip",
        STRIP_BYTE_COUNTS => "StripByteCounts",
        X_RESOLUTION => "XResolution",
        Y_RESOLUTION => "YResolution",
        PLANAR_CONFIGURATION => "PlanarConfiguration",
        RESOLUTION_UNIT => "ResolutionUnit",
        SOFTWARE => "Software",
        DATE_TIME => "DateTime",
        TILE_WIDTH => "TileWidth",
        TILE_LENGTH => "TileLength",
        TILE_OFFSETS => "TileOffsets",
        TILE_BYTE_COUNTS => "TileByteCounts",
        EXTRA_SAMPLES => "ExtraSamples",
        SAMPLE_FORMAT => "SampleFormat",
        MODEL_PIXEL_SCALE => "ModelPixelScale",
        MODEL_TIEPOINT => "ModelTiepoint",
        MODEL_TRANSFORMATION => "ModelTransformation",
        GEO_KEY_DIRECTORY => "GeoKeyDirectory",
        GEO_DOUBLE_PARAMS => "GeoDoubleParams",
        GEO_ASCII_PARAMS => "GeoAsciiParams",
        _ => "Unknown",
    }
}

/// Directory entry field types (TIFF 6 plus the BigTIFF additions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum FieldType {
    /// 8-bit unsigned
    Byte = 1,
    /// NUL-terminated text
    Ascii = 2,
    /// 16-bit unsigned
    Short = 3,
    /// 32-bit unsigned
    Long = 4,
    /// Two LONGs: numerator, denominator
    Rational = 5,
    SByte = 6,
    /// Opaque bytes
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    /// 32-bit IEEE float
    Float = 11,
    /// 64-bit IEEE double
    Double = 12,
    /// 32-bit IFD offset
    Ifd = 13,
    /// 64-bit unsigned, BigTIFF
    Long8 = 16,
    /// 64-bit signed, BigTIFF
    SLong8 = 17,
    /// 64-bit IFD offset, BigTIFF
    Ifd8 = 18,
}

impl FieldType {
    /// Returns the size in bytes of one value of this type
    pub fn size(&self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => 4,
            FieldType::Rational
            | FieldType::SRational
            | FieldType::Double
            | FieldType::Long8
            | FieldType::SLong8
            | FieldType::Ifd8 => 8,
        }
    }

    /// Returns the name of this field type
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::SByte => "SBYTE",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Ifd => "IFD",
            FieldType::Long8 => "LONG8",
            FieldType::SLong8 => "SLONG8",
            FieldType::Ifd8 => "IFD8",
        }
    }

    /// Unsigned integer types that store the same kind of quantity at different widths
    pub fn is_unsigned_integer(&self) -> bool {
        matches!(self, FieldType::Short | FieldType::Long | FieldType::Long8)
    }
}

/// SampleFormat tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum SampleFormat {
    Unsigned = 1,
    Signed = 2,
    Float = 3,
    Void = 4,
    ComplexSigned = 5,
    ComplexFloat = 6,
}

/// PhotometricInterpretation tag values.
///
/// Values outside the listed set are kept as `Other`; they do not affect
/// how samples are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum Photometric {
    MinIsWhite = 0,
    MinIsBlack = 1,
    Rgb = 2,
    Palette = 3,
    Mask = 4,
    Separated = 5,
    YCbCr = 6,
    CieLab = 8,
    IccLab = 9,
    ItuLab = 10,
    Cfa = 32803,
    LogL = 32844,
    LogLuv = 32845,
    LinearRaw = 34892,
    #[num_enum(catch_all)]
    Other(u16),
}

impl From<Photometric> for u16 {
    fn from(value: Photometric) -> u16 {
        match value {
            Photometric::MinIsWhite => 0,
            Photometric::MinIsBlack => 1,
            Photometric::Rgb => 2,
            Photometric::Palette => 3,
            Photometric::Mask => 4,
            Photometric::Separated => 5,
            Photometric::YCbCr => 6,
            Photometric::CieLab => 8,
            Photometric::IccLab => 9,
            Photometric::ItuLab => 10,
            Photometric::Cfa => 32803,
            Photometric::LogL => 32844,
            Photometric::LogLuv => 32845,
            Photometric::LinearRaw => 34892,
            Photometric::Other(raw) => raw,
        }
    }
}

/// PlanarConfiguration tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum PlanarConfiguration {
    /// Samples of one pixel are stored next to each other
    Contiguous = 1,
    /// Each sample is stored in its own plane
    Separate = 2,
}

/// Orientation tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Orientation {
    TopLeft = 1,
    TopRight = 2,
    BottomRight = 3,
    BottomLeft = 4,
    LeftTop = 5,
    RightTop = 6,
    RightBottom = 7,
    LeftBottom = 8,
}

/// ExtraSamples tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum ExtraSample {
    Unspecified = 0,
    AssociatedAlpha = 1,
    UnassociatedAlpha = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name(IMAGE_WIDTH), "ImageWidth");
        assert_eq!(tag_name(EXTRA_SAMPLES), "ExtraSamples");
        assert_eq!(tag_name(9999), "Unknown");
    }

    #[test]
    fn test_field_type_from_raw() {
        assert_eq!(FieldType::try_from(3u16).unwrap(), FieldType::Short);
        assert_eq!(FieldType::try_from(16u16).unwrap(), FieldType::Long8);
        assert!(FieldType::try_from(14u16).is_err());
        assert_eq!(u16::from(FieldType::Double), 12);
    }

    #[test]
    fn test_field_type_size_and_name() {
        assert_eq!(FieldType::Byte.size(), 1);
        assert_eq!(FieldType::SShort.size(), 2);
        assert_eq!(FieldType::Float.size(), 4);
        assert_eq!(FieldType::Rational.size(), 8);
        assert_eq!(FieldType::Long8.name(), "LONG8");
    }

    #[test]
    fn test_enumerated_values() {
        assert_eq!(SampleFormat::try_from(3u16).unwrap(), SampleFormat::Float);
        assert_eq!(u16::from(Photometric::Rgb), 2);
        assert_eq!(u16::from(ExtraSample::AssociatedAlpha), 1);
        assert!(PlanarConfiguration::try_from(3u16).is_err());
        assert_eq!(Orientation::try_from(1u16).unwrap(), Orientation::TopLeft);
    }

    #[test]
    fn test_photometric_keeps_unlisted_values() {
        assert_eq!(Photometric::from(32803u16), Photometric::Cfa);
        assert_eq!(Photometric::from(7u16), Photometric::Other(7));
        assert_eq!(u16::from(Photometric::Other(40000)), 40000);
        assert_eq!(u16::from(Photometric::LinearRaw), 34892);
    }
}
