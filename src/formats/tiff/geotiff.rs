//! GeoTIFF specific functionality
//!
//! The geo-key directory is a SHORT array in tag 34735: a four element header
//! (version, revision, minor revision, key count) followed by one four element
//! entry per key. An entry either holds its value inline or points into the
//! directory itself, GeoDoubleParams or GeoAsciiParams.

use std::num::NonZeroU16;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::debug;

use super::fields::FieldInfo;
use super::image::LazyTiffImage;
use super::options::{ReadOptions, WriteOptions};
use super::tags::{self, FieldType};
use crate::error::{Error, Result};
use crate::types::{Channel, Size};

/// The private tags GeoTIFF stores its metadata in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum GeoTiffTag {
    ModelPixelScale = 33550,
    ModelTiepoint = 33922,
    ModelTransformation = 34264,
    GeoKeyDirectory = 34735,
    GeoDoubleParams = 34736,
    GeoAsciiParams = 34737,
}

/// Schema entries registered on every geo-extended file
pub const GEO_FIELDS: &[FieldInfo] = &[
    FieldInfo::new(tags::MODEL_PIXEL_SCALE, FieldType::Double, "ModelPixelScale"),
    FieldInfo::new(tags::MODEL_TIEPOINT, FieldType::Double, "ModelTiepoint"),
    FieldInfo::new(tags::MODEL_TRANSFORMATION, FieldType::Double, "ModelTransformation"),
    FieldInfo::new(tags::GEO_KEY_DIRECTORY, FieldType::Short, "GeoKeyDirectory"),
    FieldInfo::new(tags::GEO_DOUBLE_PARAMS, FieldType::Double, "GeoDoubleParams"),
    FieldInfo::new(tags::GEO_ASCII_PARAMS, FieldType::Ascii, "GeoAsciiParams"),
];

/// Geo keys defined by GeoTIFF 1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum GeoKey {
    // configuration
    GTModelType = 1024,
    GTRasterType = 1025,
    GTCitation = 1026,

    // geodetic CRS
    GeographicType = 2048,
    GeogCitation = 2049,
    GeodeticDatum = 2050,
    PrimeMeridian = 2051,
    LinearUnits = 2052,
    LinearUnitSize = 2053,
    AngularUnits = 2054,
    AngularUnitSize = 2055,
    Ellipsoid = 2056,
    SemiMajorAxis = 2057,
    SemiMinorAxis = 2058,
    InvFlattening = 2059,
    AzimuthUnits = 2060,
    PrimeMeridianLongitude = 2061,

    // projected CRS
    ProjectedCSType = 3072,
    PCSCitation = 3073,
    Projection = 3074,
    ProjCoordTrans = 3075,
    ProjLinearUnits = 3076,
    ProjLinearUnitSize = 3077,
    ProjStdParallel1 = 3078,
    ProjStdParallel2 = 3079,
    ProjNatOriginLong = 3080,
    ProjNatOriginLat = 3081,
    ProjFalseEasting = 3082,
    ProjFalseNorthing = 3083,
    ProjFalseOriginLong = 3084,
    ProjFalseOriginLat = 3085,
    ProjFalseOriginEasting = 3086,
    ProjFalseOriginNorthing = 3087,
    ProjCenterLong = 3088,
    ProjCenterLat = 3089,
    ProjCenterEasting = 3090,
    ProjCenterNorthing = 3091,
    ProjScaleAtNatOrigin = 3092,
    ProjScaleAtCenter = 3093,
    ProjAzimuthAngle = 3094,
    ProjStraightVertPoleLong = 3095,
    ProjRectifiedGridAngle = 3096,

    // vertical CRS
    VerticalCSType = 4096,
    VerticalCitation = 4097,
    VerticalDatum = 4098,
    VerticalUnits = 4099,
}

/// One key of a geo-key directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryEntry {
    pub key: GeoKey,
    /// Tag holding the value; `None` when `value_or_index` is the value itself
    pub tiff_tag: Option<NonZeroU16>,
    pub value_count: u16,
    pub value_or_index: u16,
}

impl DirectoryEntry {
    /// An entry whose SHORT value is stored in the directory entry itself
    pub fn inline(key: GeoKey, value: u16) -> Self {
        Self {
            key,
            tiff_tag: None,
            value_count: 1,
            value_or_index: value,
        }
    }

    /// An entry pointing at `count` values starting at `index` in `tag`
    pub fn referenced(key: GeoKey, tag: NonZeroU16, count: u16, index: u16) -> Self {
        Self {
            key,
            tiff_tag: Some(tag),
            value_count: count,
            value_or_index: index,
        }
    }
}

/// A decoded geo-key directory
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoKeyDirectory {
    pub major_version: u16,
    pub minor_version: u16,
    pub revision: u16,
    pub entries: Vec<DirectoryEntry>,
}

const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 4;

impl GeoKeyDirectory {
    /// A version 1.1.0 directory holding `entries`
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            major_version: 1,
            minor_version: 1,
            revision: 0,
            entries,
        }
    }

    pub fn get(&self, key: GeoKey) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Unpacks the raw SHORT array stored in the GeoKeyDirectory tag
    pub fn decode(raw: &[u16]) -> Result<Self> {
        if raw.len() < HEADER_LEN {
            return Err(Error::DirectoryHeaderTooShort(raw.len()));
        }

        let count = raw[3] as usize;
        let expected = HEADER_LEN + ENTRY_LEN * count;
        if raw.len() != expected {
            return Err(Error::DirectorySizeIncorrect { expected, got: raw.len() });
        }

        let entries = raw[HEADER_LEN..]
            .chunks_exact(ENTRY_LEN)
            .map(|e| {
                let key = GeoKey::try_from(e[0]).map_err(|_| Error::UnrecognisedGeoKey(e[0]))?;
                Ok(DirectoryEntry {
                    key,
                    tiff_tag: NonZeroU16::new(e[1]),
                    value_count: e[2],
                    value_or_index: e[3],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            major_version: raw[0],
            minor_version: raw[1],
            revision: raw[2],
            entries,
        })
    }

    /// Packs the directory into the layout `decode` expects
    pub fn encode(&self) -> Result<Vec<u16>> {
        let count = u16::try_from(self.entries.len())
            .map_err(|_| Error::TooManyGeoKeys(self.entries.len()))?;

        let mut raw = Vec::with_capacity(HEADER_LEN + ENTRY_LEN * self.entries.len());
        raw.extend_from_slice(&[self.major_version, self.minor_version, self.revision, count]);
        for entry in &self.entries {
            raw.extend_from_slice(&[
                entry.key.into(),
                entry.tiff_tag.map_or(0, NonZeroU16::get),
                entry.value_count,
                entry.value_or_index,
            ]);
        }
        Ok(raw)
    }
}

/// A geo key's value, resolved from wherever its entry points
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKeyValue {
    Short(u16),
    Shorts(Vec<u16>),
    Doubles(Vec<f64>),
    Ascii(String),
}

/// A [`LazyTiffImage`] with access to the GeoTIFF tags.
///
/// Region I/O and the lifecycle methods are reached through `Deref`.
pub struct GeoTiffImage<C: Channel> {
    image: LazyTiffImage<C>,
}

impl<C: Channel> GeoTiffImage<C> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &ReadOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        Self::from_image(LazyTiffImage::open_with_options(path, options)?)
    }

    pub fn create<P: AsRef<Path>>(path: P, size: Size, samples_per_pixel: u16, has_alpha: bool) -> Result<Self> {
        Self::create_with_options(path, size, samples_per_pixel, has_alpha, &WriteOptions::default())
    }

    pub fn create_with_options<P: AsRef<Path>>(
        path: P,
        size: Size,
        samples_per_pixel: u16,
        has_alpha: bool,
        options: &WriteOptions,
    ) -> Result<Self> {
        Self::from_image(LazyTiffImage::create_with_options(path, size, samples_per_pixel, has_alpha, options)?)
    }

    /// Extends an open image with the GeoTIFF field definitions
    pub fn from_image(mut image: LazyTiffImage<C>) -> Result<Self> {
        image.file_mut()?.register_fields(GEO_FIELDS)?;
        debug!(path = %image.path().display(), "registered GeoTIFF fields");
        Ok(Self { image })
    }

    pub fn into_inner(self) -> LazyTiffImage<C> {
        self.image
    }

    /// Decodes the geo-key directory
    pub fn get_directory(&self) -> Result<GeoKeyDirectory> {
        let raw = self.image.file()?.get_custom_array::<u16>(tags::GEO_KEY_DIRECTORY)?;
        GeoKeyDirectory::decode(&raw)
    }

    pub fn set_directory(&mut self, directory: &GeoKeyDirectory) -> Result<()> {
        let raw = directory.encode()?;
        self.image.file_mut()?.set_custom_array(tags::GEO_KEY_DIRECTORY, &raw)
    }

    /// ModelPixelScale: (ScaleX, ScaleY, ScaleZ)
    pub fn get_pixel_scale(&self) -> Result<Vec<f64>> {
        self.image.file()?.get_custom_array(tags::MODEL_PIXEL_SCALE)
    }

    pub fn set_pixel_scale(&mut self, scale: &[f64]) -> Result<()> {
        self.image.file_mut()?.set_custom_array(tags::MODEL_PIXEL_SCALE, scale)
    }

    /// ModelTiepoint: one or more (I, J, K, X, Y, Z) tuples
    pub fn get_tie_point(&self) -> Result<Vec<f64>> {
        self.image.file()?.get_custom_array(tags::MODEL_TIEPOINT)
    }

    pub fn set_tie_point(&mut self, tie_points: &[f64]) -> Result<()> {
        if tie_points.is_empty() || tie_points.len() % 6 != 0 {
            return Err(Error::InvalidFormat(format!(
                "ModelTiepoint needs a multiple of 6 values, got {}",
                tie_points.len()
            )));
        }
        self.image.file_mut()?.set_custom_array(tags::MODEL_TIEPOINT, tie_points)
    }

    /// ModelTransformation: a row-major 4x4 matrix
    pub fn get_transformation(&self) -> Result<Vec<f64>> {
        self.image.file()?.get_custom_array(tags::MODEL_TRANSFORMATION)
    }

    pub fn set_transformation(&mut self, matrix: &[f64; 16]) -> Result<()> {
        self.image.file_mut()?.set_custom_array(tags::MODEL_TRANSFORMATION, &matrix[..])
    }

    pub fn get_double_params(&self) -> Result<Vec<f64>> {
        self.image.file()?.get_custom_array(tags::GEO_DOUBLE_PARAMS)
    }

    pub fn set_double_params(&mut self, params: &[f64]) -> Result<()> {
        self.image.file_mut()?.set_custom_array(tags::GEO_DOUBLE_PARAMS, params)
    }

    /// The GeoAsciiParams block as stored, separators included
    pub fn get_projection(&self) -> Result<String> {
        self.image.file()?.get_custom_ascii(tags::GEO_ASCII_PARAMS)
    }

    /// Stores `projection` in GeoAsciiParams, terminated by `|`
    pub fn set_projection(&mut self, projection: &str) -> Result<()> {
        let mut text = String::with_capacity(projection.len() + 1);
        text.push_str(projection);
        text.push('|');
        self.image.file_mut()?.set_custom_ascii(tags::GEO_ASCII_PARAMS, &text)
    }

    /// Resolves the value of `key`, or `None` if the directory lacks it
    pub fn geo_key_value(&self, key: GeoKey) -> Result<Option<GeoKeyValue>> {
        let directory = self.get_directory()?;
        let Some(entry) = directory.get(key).copied() else {
            return Ok(None);
        };
        let Some(tag) = entry.tiff_tag else {
            return Ok(Some(GeoKeyValue::Short(entry.value_or_index)));
        };

        let start = entry.value_or_index as usize;
        let range = start..start + entry.value_count as usize;
        let out_of_range = |len: usize| {
            Error::InvalidFormat(format!(
                "{:?} refers to values {}..{} of {}, which holds {}",
                key,
                range.start,
                range.end,
                tags::tag_name(tag.get()),
                len
            ))
        };

        let file = self.image.file()?;
        let value = match tag.get() {
            tags::GEO_KEY_DIRECTORY => {
                let raw = file.get_custom_array::<u16>(tags::GEO_KEY_DIRECTORY)?;
                let values = raw.get(range.clone()).ok_or_else(|| out_of_range(raw.len()))?;
                GeoKeyValue::Shorts(values.to_vec())
            }
            tags::GEO_DOUBLE_PARAMS => {
                let params = file.get_custom_array::<f64>(tags::GEO_DOUBLE_PARAMS)?;
                let values = params.get(range.clone()).ok_or_else(|| out_of_range(params.len()))?;
                GeoKeyValue::Doubles(values.to_vec())
            }
            tags::GEO_ASCII_PARAMS => {
                let ascii = file.get_custom_ascii(tags::GEO_ASCII_PARAMS)?;
                let text = ascii.get(range.clone()).ok_or_else(|| out_of_range(ascii.len()))?;
                GeoKeyValue::Ascii(text.strip_suffix('|').unwrap_or(text).to_string())
            }
            other => {
                return Err(Error::Unsupported(format!(
                    "{:?} stored in unrelated tag {}",
                    key, other
                )))
            }
        };
        Ok(Some(value))
    }
}

impl<C: Channel> Deref for GeoTiffImage<C> {
    type Target = LazyTiffImage<C>;

    fn deref(&self) -> &Self::Target {
        &self.image
    }
}

impl<C: Channel> DerefMut for GeoTiffImage<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.image
    }
}
