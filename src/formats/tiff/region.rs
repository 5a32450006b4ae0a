//! Region I/O: rectangular reads and writes composed from whole scanlines

use tracing::trace;

use super::image::LazyTiffImage;
use crate::error::{Error, Result};
use crate::types::{Area, Channel, Mode};

impl<C: Channel> LazyTiffImage<C> {
    /// Reads the samples of `area`, row by row, pixel-interleaved.
    ///
    /// Scanline storage cannot be read partially, so every covered row is read
    /// in full into a scratch buffer and the requested columns are copied out.
    pub fn read(&mut self, area: Area) -> Result<Vec<C>> {
        self.require_mode(Mode::Read)?;

        let image = self.size();
        if !area.fits_within(image) {
            return Err(Error::AreaOutOfBounds { area, size: image });
        }

        let spp = self.attributes().samples_per_pixel as usize;
        let channel_size = C::KIND.size();
        let expected = self.attributes().samples_per_row() * channel_size;

        let tiff = self.file_mut()?;
        let scanline = tiff.scanline_size()?;
        if scanline < expected {
            return Err(Error::InternalInconsistency { expected, actual: scanline });
        }

        let row_samples = area.size.width as usize * spp;
        let mut out = vec![C::default(); area.sample_count(spp as u16)];
        if out.is_empty() {
            return Ok(out);
        }

        let order = tiff.byte_order();
        let src_start = area.origin.x as usize * spp * channel_size;
        let src_end = src_start + row_samples * channel_size;
        let mut scratch = vec![0u8; scanline];

        for (line, dst) in out.chunks_exact_mut(row_samples).enumerate() {
            let row = area.origin.y + line as u32;
            tiff.read_scanline(&mut scratch, row)
                .map_err(|e| Error::ScanlineReadFailure { row, source: Box::new(e) })?;

            for (sample, bytes) in dst.iter_mut().zip(scratch[src_start..src_end].chunks_exact(channel_size)) {
                *sample = C::decode(bytes, order);
            }
        }

        trace!(?area, samples = out.len(), "read area");
        Ok(out)
    }

    /// Writes `data` into `area`, one full scanline per row.
    ///
    /// Only areas spanning the full image width can be written: merging a
    /// partial row would require reading it back from a file opened for
    /// writing, which the append-only strip layout does not support.
    /// Rows should be written in increasing order.
    pub fn write(&mut self, area: Area, data: &[C]) -> Result<()> {
        self.require_mode(Mode::Write)?;

        let image = self.size();
        if !area.fits_within(image) {
            return Err(Error::AreaOutOfBounds { area, size: image });
        }

        let spp = self.attributes().samples_per_pixel;
        let channel_size = C::KIND.size();
        let expected = self.attributes().samples_per_row() * channel_size;

        let tiff = self.file_mut()?;
        let scanline = tiff.scanline_size()?;
        if scanline != expected {
            return Err(Error::InternalInconsistency { expected, actual: scanline });
        }

        if !area.spans_full_width(image.width) {
            return Err(Error::PartialScanlineUnsupported { area });
        }
        if data.is_empty() {
            return Err(Error::NoBaseAddress);
        }
        let needed = area.sample_count(spp);
        if data.len() < needed {
            return Err(Error::BufferTooSmall { expected: needed, got: data.len() });
        }
        if needed == 0 {
            return Ok(());
        }

        let order = tiff.byte_order();
        let row_samples = area.size.width as usize * spp as usize;
        let mut scratch = vec![0u8; scanline];

        for (line, src) in data[..needed].chunks_exact(row_samples).enumerate() {
            let row = area.origin.y + line as u32;
            for (sample, bytes) in src.iter().zip(scratch.chunks_exact_mut(channel_size)) {
                sample.encode(bytes, order);
            }
            tiff.write_scanline(&scratch, row)
                .map_err(|e| Error::ScanlineWriteFailure { row, source: Box::new(e) })?;
        }

        trace!(?area, samples = needed, "wrote area");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::{tags, TagValue};
    use crate::types::{Point, Size};
    use tempfile::TempDir;

    fn gradient(size: Size, spp: u16) -> Vec<u16> {
        let mut data = Vec::new();
        for y in 0..size.height {
            for x in 0..size.width {
                for c in 0..spp as u32 {
                    data.push((y * 1000 + x * 10 + c) as u16);
                }
            }
        }
        data
    }

    #[test]
    fn test_sub_area_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub.tif");
        let size = Size::new(6, 5);
        let data = gradient(size, 2);

        let mut image = LazyTiffImage::<u16>::create(&path, size, 2, false).unwrap();
        image.write(Area::full(size), &data).unwrap();
        image.close().unwrap();

        let mut image = LazyTiffImage::<u16>::open(&path).unwrap();
        let area = Area::new(Point::new(2, 1), Size::new(3, 2));
        let samples = image.read(area).unwrap();
        assert_eq!(samples, vec![
            1020, 1021, 1030, 1031, 1040, 1041,
            2020, 2021, 2030, 2031, 2040, 2041,
        ]);
    }

    #[test]
    fn test_mode_checks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mode.tif");
        let size = Size::new(2, 2);
        let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
        assert!(matches!(
            image.read(Area::full(size)),
            Err(Error::WrongMode { expected: Mode::Read, actual: Mode::Write })
        ));
        image.close().unwrap();
        assert!(matches!(image.write(Area::full(size), &[0; 4]), Err(Error::InvalidReference)));

        let mut image = LazyTiffImage::<u8>::open(&path).unwrap();
        assert!(matches!(
            image.write(Area::full(size), &[0; 4]),
            Err(Error::WrongMode { expected: Mode::Write, actual: Mode::Read })
        ));
    }

    #[test]
    fn test_write_buffer_checks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("buffers.tif");
        let size = Size::new(4, 2);
        let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();

        assert!(matches!(image.write(Area::full(size), &[]), Err(Error::NoBaseAddress)));
        assert!(matches!(
            image.write(Area::full(size), &[1, 2, 3]),
            Err(Error::BufferTooSmall { expected: 8, got: 3 })
        ));
        // partial width is rejected before the buffer is looked at
        assert!(matches!(
            image.write(Area::new(Point::new(1, 0), Size::new(2, 1)), &[]),
            Err(Error::PartialScanlineUnsupported { .. })
        ));
    }

    #[test]
    fn test_empty_area() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.tif");
        let size = Size::new(3, 3);
        let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
        image.write(Area::full(size), &[7; 9]).unwrap();
        image.close().unwrap();

        let mut image = LazyTiffImage::<u8>::open(&path).unwrap();
        let area = Area::new(Point::new(3, 3), Size::new(0, 0));
        assert!(image.read(area).unwrap().is_empty());
    }

    #[test]
    fn test_layout_changed_behind_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.tif");
        let size = Size::new(4, 1);
        let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
        image.file_mut().unwrap()
            .set_field(tags::SAMPLES_PER_PIXEL, TagValue::Short(vec![2]))
            .unwrap();

        assert!(matches!(
            image.write(Area::full(size), &[1; 4]),
            Err(Error::InternalInconsistency { expected: 4, actual: 8 })
        ));
    }

    #[test]
    fn test_compressed_rows_fail_to_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lzw.tif");
        let size = Size::new(2, 2);
        let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
        image.file_mut().unwrap()
            .set_field(tags::COMPRESSION, TagValue::Short(vec![5]))
            .unwrap();
        image.write(Area::full(size), &[1; 4]).unwrap();
        image.close().unwrap();

        let mut image = LazyTiffImage::<u8>::open(&path).unwrap();
        match image.read(Area::full(size)) {
            Err(Error::ScanlineReadFailure { row: 0, source }) => {
                assert!(matches!(*source, Error::Unsupported(_)));
            }
            other => panic!("expected ScanlineReadFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_rows_past_image_length_fail_to_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.tif");
        let size = Size::new(2, 4);
        let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
        image.file_mut().unwrap()
            .set_field(tags::IMAGE_LENGTH, TagValue::Long(vec![2]))
            .unwrap();

        match image.write(Area::full(size), &[3; 8]) {
            Err(Error::ScanlineWriteFailure { row: 2, source }) => {
                assert!(matches!(*source, Error::InvalidFormat(_)));
            }
            other => panic!("expected ScanlineWriteFailure, got {:?}", other),
        }
    }
}
