//! The scalar image descriptor stored in a file's standard tags

use super::file::TiffFile;
use super::tags::{self, ExtraSample, Orientation, Photometric, PlanarConfiguration, SampleFormat};
use super::value::TagValue;
use crate::error::{Error, Result};
use crate::types::{ChannelKind, Size};

/// Dimensions, sample layout and sample format of an image.
///
/// Built fresh from a file's fields on open, or from the requested layout on
/// create; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffAttributes {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub sample_format: SampleFormat,
    pub photometric: Photometric,
    pub planar_configuration: PlanarConfiguration,
    pub orientation: Orientation,
    pub extra_samples: Vec<ExtraSample>,
    pub rows_per_strip: u32,
}

impl TiffAttributes {
    /// Reads the descriptor from a file's fields, applying TIFF 6 defaults
    pub fn read_from(file: &TiffFile) -> Result<Self> {
        let width = required_u32(file, tags::IMAGE_WIDTH)?;
        let height = required_u32(file, tags::IMAGE_LENGTH)?;
        let samples_per_pixel = optional_u16(file, tags::SAMPLES_PER_PIXEL)?.unwrap_or(1);
        let bits_per_sample = uniform_u16(file, tags::BITS_PER_SAMPLE)?.unwrap_or(1);

        let sample_format = match uniform_u16(file, tags::SAMPLE_FORMAT)? {
            Some(raw) => enumerated(tags::SAMPLE_FORMAT, raw)?,
            None => SampleFormat::Unsigned,
        };
        let photometric = match optional_u16(file, tags::PHOTOMETRIC_INTERPRETATION)? {
            Some(raw) => Photometric::from(raw),
            None => Photometric::MinIsBlack,
        };
        let planar_configuration = match optional_u16(file, tags::PLANAR_CONFIGURATION)? {
            Some(raw) => enumerated(tags::PLANAR_CONFIGURATION, raw)?,
            None => PlanarConfiguration::Contiguous,
        };
        if planar_configuration != PlanarConfiguration::Contiguous {
            return Err(Error::Unsupported("separate planar configuration".to_string()));
        }
        let orientation = match optional_u16(file, tags::ORIENTATION)? {
            Some(raw) => enumerated(tags::ORIENTATION, raw)?,
            None => Orientation::TopLeft,
        };
        let extra_samples = match file.get_field(tags::EXTRA_SAMPLES) {
            Some(_) => file
                .get_custom_array::<u16>(tags::EXTRA_SAMPLES)?
                .into_iter()
                .map(|raw| enumerated(tags::EXTRA_SAMPLES, raw))
                .collect::<Result<_>>()?,
            None => Vec::new(),
        };
        let rows_per_strip = match file.get_field(tags::ROWS_PER_STRIP).and_then(TagValue::first_u64) {
            Some(rows) => u32::try_from(rows).unwrap_or(u32::MAX),
            None => height,
        };

        Ok(Self {
            width,
            height,
            samples_per_pixel,
            bits_per_sample,
            sample_format,
            photometric,
            planar_configuration,
            orientation,
            extra_samples,
            rows_per_strip,
        })
    }

    /// Describes a new image of channel `kind`.
    ///
    /// Single-channel images are written as black-is-zero grayscale, all
    /// others as RGB. Samples beyond the three color samples become extra
    /// samples; with `has_alpha` the first of them is associated alpha.
    pub fn for_channel(kind: ChannelKind, size: Size, samples_per_pixel: u16, has_alpha: bool) -> Result<Self> {
        let sample_format = kind.sample_format().ok_or(Error::UnsupportedType(kind))?;
        if samples_per_pixel == 0 {
            return Err(Error::Unsupported("images need at least one sample per pixel".to_string()));
        }
        if has_alpha && samples_per_pixel < 2 {
            return Err(Error::Unsupported("an alpha channel needs at least two samples per pixel".to_string()));
        }

        let photometric = if samples_per_pixel == 1 {
            Photometric::MinIsBlack
        } else {
            Photometric::Rgb
        };
        let mut extra_samples = vec![ExtraSample::Unspecified; samples_per_pixel.saturating_sub(3) as usize];
        if has_alpha {
            match extra_samples.first_mut() {
                Some(first) => *first = ExtraSample::AssociatedAlpha,
                None => extra_samples.push(ExtraSample::AssociatedAlpha),
            }
        }

        Ok(Self {
            width: size.width,
            height: size.height,
            samples_per_pixel,
            bits_per_sample: kind.bits(),
            sample_format,
            photometric,
            planar_configuration: PlanarConfiguration::Contiguous,
            orientation: Orientation::TopLeft,
            extra_samples,
            rows_per_strip: 1,
        })
    }

    /// Stores the descriptor in the standard tags of a file opened for writing
    pub fn write_to(&self, file: &mut TiffFile) -> Result<()> {
        let per_sample = |value: u16| vec![value; self.samples_per_pixel as usize];

        file.set_field(tags::IMAGE_WIDTH, TagValue::Long(vec![self.width]))?;
        file.set_field(tags::IMAGE_LENGTH, TagValue::Long(vec![self.height]))?;
        file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(per_sample(self.bits_per_sample)))?;
        file.set_field(tags::SAMPLES_PER_PIXEL, TagValue::Short(vec![self.samples_per_pixel]))?;
        file.set_field(tags::ROWS_PER_STRIP, TagValue::Long(vec![self.rows_per_strip]))?;
        file.set_field(tags::COMPRESSION, TagValue::Short(vec![tags::COMPRESSION_NONE]))?;
        file.set_field(tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![self.photometric.into()]))?;
        file.set_field(tags::PLANAR_CONFIGURATION, TagValue::Short(vec![self.planar_configuration.into()]))?;
        file.set_field(tags::ORIENTATION, TagValue::Short(vec![self.orientation.into()]))?;
        if !self.extra_samples.is_empty() {
            let extra = self.extra_samples.iter().map(|e| u16::from(*e)).collect();
            file.set_field(tags::EXTRA_SAMPLES, TagValue::Short(extra))?;
        }
        file.set_field(tags::SAMPLE_FORMAT, TagValue::Short(per_sample(self.sample_format.into())))?;
        Ok(())
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Approximates alpha detection as "four samples per pixel".
    ///
    /// This misclassifies 4-channel images without alpha and misses
    /// grayscale + alpha; it is kept for compatibility.
    pub fn has_alpha(&self) -> bool {
        self.samples_per_pixel == 4
    }

    /// Channel samples in one full-width scanline
    pub fn samples_per_row(&self) -> usize {
        self.width as usize * self.samples_per_pixel as usize
    }
}

fn required_u32(file: &TiffFile, tag: u16) -> Result<u32> {
    let value = file.get_field(tag)
        .and_then(TagValue::first_u64)
        .ok_or(Error::MissingTag(tag))?;
    u32::try_from(value)
        .map_err(|_| Error::InvalidFormat(format!("{} value {} out of range", tags::tag_name(tag), value)))
}

fn optional_u16(file: &TiffFile, tag: u16) -> Result<Option<u16>> {
    match file.get_field(tag) {
        None => Ok(None),
        Some(value) => {
            let raw = value.first_u64()
                .ok_or_else(|| Error::InvalidFormat(format!("{} is not an unsigned integer", tags::tag_name(tag))))?;
            u16::try_from(raw)
                .map(Some)
                .map_err(|_| Error::InvalidFormat(format!("{} value {} out of range", tags::tag_name(tag), raw)))
        }
    }
}

/// Reads a per-sample tag whose values must all agree
fn uniform_u16(file: &TiffFile, tag: u16) -> Result<Option<u16>> {
    if file.get_field(tag).is_none() {
        return Ok(None);
    }
    let values = file.get_custom_array::<u16>(tag)
        .map_err(|_| Error::InvalidFormat(format!("{} is not a SHORT array", tags::tag_name(tag))))?;
    match values.split_first() {
        None => Ok(None),
        Some((first, rest)) if rest.iter().all(|v| v == first) => Ok(Some(*first)),
        Some(_) => Err(Error::Unsupported(format!("{} differs between samples: {:?}", tags::tag_name(tag), values))),
    }
}

fn enumerated<E: TryFrom<u16>>(tag: u16, raw: u16) -> Result<E> {
    E::try_from(raw)
        .map_err(|_| Error::InvalidFormat(format!("unknown {} value {}", tags::tag_name(tag), raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::{ReadOptions, WriteOptions};
    use tempfile::TempDir;

    #[test]
    fn test_for_channel_rgb_alpha() {
        let attrs = TiffAttributes::for_channel(ChannelKind::U8, Size::new(10, 5), 4, true).unwrap();
        assert_eq!(attrs.bits_per_sample, 8);
        assert_eq!(attrs.sample_format, SampleFormat::Unsigned);
        assert_eq!(attrs.photometric, Photometric::Rgb);
        assert_eq!(attrs.extra_samples, vec![ExtraSample::AssociatedAlpha]);
        assert_eq!(attrs.rows_per_strip, 1);
        assert!(attrs.has_alpha());
        assert_eq!(attrs.samples_per_row(), 40);
    }

    #[test]
    fn test_for_channel_gray() {
        let attrs = TiffAttributes::for_channel(ChannelKind::F64, Size::new(3, 3), 1, false).unwrap();
        assert_eq!(attrs.photometric, Photometric::MinIsBlack);
        assert_eq!(attrs.sample_format, SampleFormat::Float);
        assert_eq!(attrs.bits_per_sample, 64);
        assert!(attrs.extra_samples.is_empty());
        assert!(!attrs.has_alpha());
    }

    #[test]
    fn test_for_channel_extra_samples() {
        let attrs = TiffAttributes::for_channel(ChannelKind::U8, Size::new(1, 1), 2, true).unwrap();
        assert_eq!(attrs.photometric, Photometric::Rgb);
        assert_eq!(attrs.extra_samples, vec![ExtraSample::AssociatedAlpha]);

        let attrs = TiffAttributes::for_channel(ChannelKind::U8, Size::new(1, 1), 3, false).unwrap();
        assert!(attrs.extra_samples.is_empty());

        let attrs = TiffAttributes::for_channel(ChannelKind::U8, Size::new(1, 1), 5, true).unwrap();
        assert_eq!(attrs.extra_samples, vec![ExtraSample::AssociatedAlpha, ExtraSample::Unspecified]);
    }

    #[test]
    fn test_for_channel_rejections() {
        assert!(matches!(
            TiffAttributes::for_channel(ChannelKind::Opaque { size: 3 }, Size::new(1, 1), 1, false),
            Err(Error::UnsupportedType(ChannelKind::Opaque { size: 3 }))
        ));
        assert!(matches!(
            TiffAttributes::for_channel(ChannelKind::U8, Size::new(1, 1), 0, false),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            TiffAttributes::for_channel(ChannelKind::U8, Size::new(1, 1), 1, true),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attrs.tif");
        let attrs = TiffAttributes::for_channel(ChannelKind::I16, Size::new(4, 2), 3, false).unwrap();

        let mut file = TiffFile::create(&path, &WriteOptions::default()).unwrap();
        attrs.write_to(&mut file).unwrap();
        assert_eq!(TiffAttributes::read_from(&file).unwrap(), attrs);
        file.close().unwrap();

        let file = TiffFile::open_read(&path, &ReadOptions::default()).unwrap();
        let read = TiffAttributes::read_from(&file).unwrap();
        assert_eq!(read, attrs);
        assert_eq!(read.size(), Size::new(4, 2));
    }

    #[test]
    fn test_unlisted_photometric_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfa.tif");
        let attrs = TiffAttributes::for_channel(ChannelKind::U16, Size::new(2, 2), 1, false).unwrap();

        let mut file = TiffFile::create(&path, &WriteOptions::default()).unwrap();
        attrs.write_to(&mut file).unwrap();
        file.set_field(tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![32803])).unwrap();
        file.close().unwrap();

        let file = TiffFile::open_read(&path, &ReadOptions::default()).unwrap();
        assert_eq!(TiffAttributes::read_from(&file).unwrap().photometric, Photometric::Cfa);
    }
}
