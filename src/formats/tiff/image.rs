//! `LazyTiffImage`: a channel-typed handle over one TIFF file

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::attributes::TiffAttributes;
use super::file::TiffFile;
use super::options::{ReadOptions, WriteOptions};
use crate::error::{Error, Result};
use crate::types::{Channel, Mode, Size};

/// A lazily evaluated image whose samples are of channel type `C`.
///
/// The handle owns its file exclusively. Pixel data is only touched by
/// [`read`](Self::read) and [`write`](Self::write); the file is finished and
/// released by [`close`](Self::close) or when the handle is dropped.
///
/// ```no_run
/// use lazytiff::{Area, LazyTiffImage, Size};
///
/// let size = Size::new(100, 100);
/// let mut image = LazyTiffImage::<u8>::create("out.tif", size, 3, false)?;
/// image.write(Area::full(size), &vec![0u8; 100 * 100 * 3])?;
/// image.close()?;
///
/// let mut image = LazyTiffImage::<u8>::open("out.tif")?;
/// let pixels = image.read(Area::full(size))?;
/// assert_eq!(pixels.len(), 30_000);
/// # Ok::<(), lazytiff::Error>(())
/// ```
pub struct LazyTiffImage<C: Channel> {
    tiff: Option<TiffFile>,
    path: PathBuf,
    mode: Mode,
    attributes: TiffAttributes,
    _channel: PhantomData<C>,
}

impl<C: Channel> LazyTiffImage<C> {
    /// Opens an existing file for reading with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &ReadOptions::default())
    }

    /// Opens an existing file for reading.
    ///
    /// Fails with `IncorrectChannelSize` if the file's bits per sample do not
    /// match the width of `C`.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tiff = TiffFile::open_read(&path, options).map_err(|e| open_failure(&path, e))?;
        let attributes = TiffAttributes::read_from(&tiff)?;

        let channel_bits = C::KIND.bits();
        if attributes.bits_per_sample != channel_bits {
            return Err(Error::IncorrectChannelSize {
                bits_per_sample: attributes.bits_per_sample,
                channel_bits,
            });
        }
        if let Some(format) = C::KIND.sample_format() {
            if format != attributes.sample_format {
                warn!(
                    path = %path.display(),
                    file_format = ?attributes.sample_format,
                    channel_format = ?format,
                    "sample format differs from the channel type"
                );
            }
        }

        debug!(
            path = %path.display(),
            width = attributes.width,
            height = attributes.height,
            samples = attributes.samples_per_pixel,
            bits = attributes.bits_per_sample,
            "opened image for reading"
        );

        Ok(Self {
            tiff: Some(tiff),
            path,
            mode: Mode::Read,
            attributes,
            _channel: PhantomData,
        })
    }

    /// Creates a classic TIFF for writing
    pub fn create<P: AsRef<Path>>(path: P, size: Size, samples_per_pixel: u16, has_alpha: bool) -> Result<Self> {
        Self::create_with_options(path, size, samples_per_pixel, has_alpha, &WriteOptions::default())
    }

    /// Creates a file for writing.
    ///
    /// Bits per sample and sample format follow `C`; a channel type without a
    /// TIFF sample format fails with `UnsupportedType` before any file is
    /// created.
    pub fn create_with_options<P: AsRef<Path>>(
        path: P,
        size: Size,
        samples_per_pixel: u16,
        has_alpha: bool,
        options: &WriteOptions,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let requested = TiffAttributes::for_channel(C::KIND, size, samples_per_pixel, has_alpha)?;

        let mut tiff = TiffFile::create(&path, options).map_err(|e| open_failure(&path, e))?;
        requested.write_to(&mut tiff)?;
        let attributes = TiffAttributes::read_from(&tiff)?;

        debug!(
            path = %path.display(),
            width = attributes.width,
            height = attributes.height,
            samples = attributes.samples_per_pixel,
            bits = attributes.bits_per_sample,
            big_tiff = options.big_tiff,
            "created image for writing"
        );

        Ok(Self {
            tiff: Some(tiff),
            path,
            mode: Mode::Write,
            attributes,
            _channel: PhantomData,
        })
    }

    /// Finishes and releases the file. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.tiff.take() {
            Some(tiff) => {
                debug!(path = %self.path.display(), mode = ?self.mode, "closing image");
                tiff.close()
            }
            None => Ok(()),
        }
    }

    /// Forces pending writes to storage
    pub fn flush(&mut self) -> Result<()> {
        self.file_mut()?
            .flush()
            .map_err(|e| Error::FlushFailure(Box::new(e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn attributes(&self) -> &TiffAttributes {
        &self.attributes
    }

    pub fn size(&self) -> Size {
        self.attributes.size()
    }

    /// See [`TiffAttributes::has_alpha`] for the approximation used
    pub fn has_alpha(&self) -> bool {
        self.attributes.has_alpha()
    }

    pub fn channel_count(&self) -> u16 {
        self.attributes.samples_per_pixel
    }

    pub fn is_closed(&self) -> bool {
        self.tiff.is_none()
    }

    /// The underlying file, for custom tag access
    pub fn file(&self) -> Result<&TiffFile> {
        self.tiff.as_ref().ok_or(Error::InvalidReference)
    }

    /// Mutable access to the underlying file.
    ///
    /// Changing the layout tags through it desynchronizes the file from
    /// [`attributes`](Self::attributes); region writes then fail with
    /// `InternalInconsistency`.
    pub fn file_mut(&mut self) -> Result<&mut TiffFile> {
        self.tiff.as_mut().ok_or(Error::InvalidReference)
    }

    /// Checks that the handle is open in `expected` mode
    pub(crate) fn require_mode(&self, expected: Mode) -> Result<()> {
        self.file()?;
        if self.mode != expected {
            return Err(Error::WrongMode { expected, actual: self.mode });
        }
        Ok(())
    }
}

impl<C: Channel> Drop for LazyTiffImage<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close image on drop");
        }
    }
}

fn open_failure(path: &Path, source: Error) -> Error {
    Error::OpenFailure {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::{tags, TagValue};
    use crate::io::ByteOrder;
    use crate::types::{Area, ChannelKind};
    use tempfile::TempDir;

    /// Two raw bytes with no numeric meaning
    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Raw16([u8; 2]);

    impl Channel for Raw16 {
        const KIND: ChannelKind = ChannelKind::Opaque { size: 2 };

        fn decode(bytes: &[u8], _order: ByteOrder) -> Self {
            Raw16([bytes[0], bytes[1]])
        }

        fn encode(self, out: &mut [u8], _order: ByteOrder) {
            out[..2].copy_from_slice(&self.0);
        }
    }

    #[test]
    fn test_create_reports_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.tif");
        let image = LazyTiffImage::<u16>::create(&path, Size::new(8, 4), 4, true).unwrap();
        assert_eq!(image.mode(), Mode::Write);
        assert_eq!(image.size(), Size::new(8, 4));
        assert_eq!(image.channel_count(), 4);
        assert!(image.has_alpha());
        assert_eq!(image.attributes().bits_per_sample, 16);
        assert_eq!(image.path(), path.as_path());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("close.tif");
        let mut image = LazyTiffImage::<u8>::create(&path, Size::new(2, 2), 1, false).unwrap();
        image.close().unwrap();
        image.close().unwrap();
        assert!(image.is_closed());
        assert!(matches!(image.flush(), Err(Error::InvalidReference)));
    }

    #[test]
    fn test_drop_finishes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drop.tif");
        {
            let _image = LazyTiffImage::<f32>::create(&path, Size::new(2, 2), 1, false).unwrap();
        }
        let image = LazyTiffImage::<f32>::open(&path).unwrap();
        assert_eq!(image.size(), Size::new(2, 2));
    }

    #[test]
    fn test_channel_size_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mismatch.tif");
        LazyTiffImage::<u8>::create(&path, Size::new(2, 2), 1, false).unwrap().close().unwrap();

        match LazyTiffImage::<u16>::open(&path) {
            Err(Error::IncorrectChannelSize { bits_per_sample, channel_bits }) => {
                assert_eq!(bits_per_sample, 8);
                assert_eq!(channel_bits, 16);
            }
            other => panic!("expected IncorrectChannelSize, got {:?}", other.err()),
        }

        // same width, different numeric category: allowed
        assert!(LazyTiffImage::<i8>::open(&path).is_ok());
    }

    #[test]
    fn test_opaque_channel_cannot_be_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opaque.tif");
        let result = LazyTiffImage::<Raw16>::create(&path, Size::new(2, 2), 1, false);
        assert!(matches!(result, Err(Error::UnsupportedType(ChannelKind::Opaque { size: 2 }))));
        assert!(!path.exists());
    }

    #[test]
    fn test_opaque_channel_can_be_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("opaque_read.tif");
        let size = Size::new(2, 1);
        let mut image = LazyTiffImage::<u16>::create(&path, size, 1, false).unwrap();
        image.write(Area::full(size), &[0x0201, 0x0403]).unwrap();
        image.close().unwrap();

        let mut image = LazyTiffImage::<Raw16>::open(&path).unwrap();
        let samples = image.read(Area::full(size)).unwrap();
        assert_eq!(samples, vec![Raw16([1, 2]), Raw16([3, 4])]);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.tif");
        match LazyTiffImage::<u8>::open(&path) {
            Err(Error::OpenFailure { path: failed, source }) => {
                assert_eq!(failed, path);
                assert!(matches!(*source, Error::Io(_)));
            }
            other => panic!("expected OpenFailure, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_flush_failure_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flush.tif");
        let mut image = LazyTiffImage::<u8>::create(&path, Size::new(2, 2), 1, false).unwrap();
        // a 64-bit value that classic TIFF cannot store
        image.file_mut().unwrap()
            .set_field(tags::ROWS_PER_STRIP, TagValue::Long8(vec![u64::from(u32::MAX) + 1]))
            .unwrap();

        match image.flush() {
            Err(Error::FlushFailure(source)) => assert!(matches!(*source, Error::Unsupported(_))),
            other => panic!("expected FlushFailure, got {:?}", other),
        }
    }
}
