//! Core data types for lazytiff

use std::fmt::Debug;

use crate::formats::tiff::tags::SampleFormat;
use crate::io::ByteOrder;

/// Whether a handle was opened for reading or for writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    Read,
    Write,
}

/// Represents image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Creates a new size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A pixel position, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A rectangular sub-region of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Area {
    pub origin: Point,
    pub size: Size,
}

impl Area {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// The area covering a whole image of the given size
    pub fn full(size: Size) -> Self {
        Self {
            origin: Point::default(),
            size,
        }
    }

    /// Returns true if the area lies inside an image of `image` size.
    ///
    /// An area whose far edge overflows `u32` is never inside.
    pub fn fits_within(&self, image: Size) -> bool {
        let right = self.origin.x.checked_add(self.size.width);
        let bottom = self.origin.y.checked_add(self.size.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= image.width && b <= image.height)
    }

    /// Returns true if every row of the area spans the full image width
    pub fn spans_full_width(&self, image_width: u32) -> bool {
        self.origin.x == 0 && self.size.width == image_width
    }

    /// Number of channel samples covered by the area
    pub fn sample_count(&self, samples_per_pixel: u16) -> usize {
        self.size.width as usize * self.size.height as usize * samples_per_pixel as usize
    }
}

/// The closed set of channel element kinds a handle can be parameterized by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// A caller-defined element with a byte width but no TIFF numeric category.
    /// Such channels can be read, never written.
    Opaque { size: usize },
}

impl ChannelKind {
    /// Returns the size in bytes of one channel sample
    pub fn size(&self) -> usize {
        match self {
            ChannelKind::U8 | ChannelKind::I8 => 1,
            ChannelKind::U16 | ChannelKind::I16 => 2,
            ChannelKind::U32 | ChannelKind::I32 | ChannelKind::F32 => 4,
            ChannelKind::U64 | ChannelKind::I64 | ChannelKind::F64 => 8,
            ChannelKind::Opaque { size } => *size,
        }
    }

    /// Returns the bit width of one channel sample
    pub fn bits(&self) -> u16 {
        (self.size() * 8) as u16
    }

    /// The SampleFormat tag value for this kind, if it has one
    pub fn sample_format(&self) -> Option<SampleFormat> {
        match self {
            ChannelKind::U8 | ChannelKind::U16 | ChannelKind::U32 | ChannelKind::U64 => {
                Some(SampleFormat::Unsigned)
            }
            ChannelKind::I8 | ChannelKind::I16 | ChannelKind::I32 | ChannelKind::I64 => {
                Some(SampleFormat::Signed)
            }
            ChannelKind::F32 | ChannelKind::F64 => Some(SampleFormat::Float),
            ChannelKind::Opaque { .. } => None,
        }
    }
}

/// A channel element type: one scalar sample of a pixel.
///
/// Implementations convert between the element and its on-disk bytes in
/// the file's byte order. `decode` receives exactly `KIND.size()` bytes and
/// `encode` writes exactly that many.
pub trait Channel: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const KIND: ChannelKind;

    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    fn encode(self, out: &mut [u8], order: ByteOrder);
}

macro_rules! impl_channel {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Channel for $ty {
                const KIND: ChannelKind = ChannelKind::$kind;

                fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                    match order {
                        ByteOrder::LittleEndian => <$ty>::from_le_bytes(buf),
                        ByteOrder::BigEndian => <$ty>::from_be_bytes(buf),
                    }
                }

                fn encode(self, out: &mut [u8], order: ByteOrder) {
                    let bytes = match order {
                        ByteOrder::LittleEndian => self.to_le_bytes(),
                        ByteOrder::BigEndian => self.to_be_bytes(),
                    };
                    out[..bytes.len()].copy_from_slice(&bytes);
                }
            }
        )*
    };
}

impl_channel! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
