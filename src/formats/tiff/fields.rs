//! Field schema: which tags a file may carry and how they are typed

use std::collections::BTreeMap;

use tracing::debug;

use super::tags::{self, FieldType};
use crate::error::{Error, Result};

/// Definition of one settable tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub tag: u16,
    pub field_type: FieldType,
    pub name: &'static str,
}

impl FieldInfo {
    pub const fn new(tag: u16, field_type: FieldType, name: &'static str) -> Self {
        Self { tag, field_type, name }
    }
}

const BASELINE_FIELDS: &[FieldInfo] = &[
    FieldInfo::new(tags::IMAGE_WIDTH, FieldType::Long, "ImageWidth"),
    FieldInfo::new(tags::IMAGE_LENGTH, FieldType::Long, "ImageLength"),
    FieldInfo::new(tags::BITS_PER_SAMPLE, FieldType::Short, "BitsPerSample"),
    FieldInfo::new(tags::COMPRESSION, FieldType::Short, "Compression"),
    FieldInfo::new(tags::PHOTOMETRIC_INTERPRETATION, FieldType::Short, "PhotometricInterpretation"),
    FieldInfo::new(tags::IMAGE_DESCRIPTION, FieldType::Ascii, "ImageDescription"),
    FieldInfo::new(tags::STRIP_OFFSETS, FieldType::Long, "StripOffsets"),
    FieldInfo::new(tags::ORIENTATION, FieldType::Short, "Orientation"),
    FieldInfo::new(tags::SAMPLES_PER_PIXEL, FieldType::Short, "SamplesPerPixel"),
    FieldInfo::new(tags::ROWS_PER_STRIP, FieldType::Long, "RowsPerStrip"),
    FieldInfo::new(tags::STRIP_BYTE_COUNTS, FieldType::Long, "StripByteCounts"),
    FieldInfo::new(tags::X_RESOLUTION, FieldType::Rational, "XResolution"),
    FieldInfo::new(tags::Y_RESOLUTION, FieldType::Rational, "YResolution"),
    FieldInfo::new(tags::PLANAR_CONFIGURATION, FieldType::Short, "PlanarConfiguration"),
    FieldInfo::new(tags::RESOLUTION_UNIT, FieldType::Short, "ResolutionUnit"),
    FieldInfo::new(tags::SOFTWARE, FieldType::Ascii, "Software"),
    FieldInfo::new(tags::DATE_TIME, FieldType::Ascii, "DateTime"),
    FieldInfo::new(tags::EXTRA_SAMPLES, FieldType::Short, "ExtraSamples"),
    FieldInfo::new(tags::SAMPLE_FORMAT, FieldType::Short, "SampleFormat"),
];

/// The set of field definitions known to one open file
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: BTreeMap<u16, FieldInfo>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FieldRegistry {
    /// A registry holding the baseline TIFF fields
    pub fn standard() -> Self {
        let fields = BASELINE_FIELDS.iter().map(|f| (f.tag, *f)).collect();
        Self { fields }
    }

    pub fn get(&self, tag: u16) -> Option<&FieldInfo> {
        self.fields.get(&tag)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.fields.contains_key(&tag)
    }

    /// Merges extra field definitions.
    ///
    /// Registering a definition identical in tag and type to an existing one
    /// is a no-op. A conflicting type leaves the registry unchanged and fails
    /// with `FailedToAddTags`.
    pub fn register(&mut self, infos: &[FieldInfo]) -> Result<()> {
        for info in infos {
            if let Some(existing) = self.fields.get(&info.tag) {
                if existing.field_type != info.field_type {
                    return Err(Error::FailedToAddTags(info.tag));
                }
            }
        }
        for info in infos {
            if self.fields.insert(info.tag, *info).is_none() {
                debug!(tag = info.tag, name = info.name, "registered field");
            }
        }
        Ok(())
    }

    /// Checks that a value of `field_type` may be stored under `tag`
    pub fn check(&self, tag: u16, field_type: FieldType) -> Result<()> {
        let info = self.get(tag).ok_or(Error::UnknownTag(tag))?;
        let compatible = info.field_type == field_type
            || (info.field_type.is_unsigned_integer() && field_type.is_unsigned_integer());
        if compatible {
            Ok(())
        } else {
            Err(Error::InvalidFormat(format!(
                "{} is defined as {}, cannot store {}",
                info.name,
                info.field_type.name(),
                field_type.name()
            )))
        }
    }
}
