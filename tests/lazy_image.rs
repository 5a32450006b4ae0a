use std::path::Path;

use lazytiff::{
    Area, ByteOrder, Channel, Error, LazyTiffImage, Point, Size, WriteOptions,
};
use tempfile::TempDir;

fn write_full<C: Channel>(path: &Path, size: Size, spp: u16, data: &[C], options: &WriteOptions) {
    let mut image = LazyTiffImage::<C>::create_with_options(path, size, spp, false, options).unwrap();
    image.write(Area::full(size), data).unwrap();
    image.close().unwrap();
}

fn read_full<C: Channel>(path: &Path) -> Vec<C> {
    let mut image = LazyTiffImage::<C>::open(path).unwrap();
    let size = image.size();
    image.read(Area::full(size)).unwrap()
}

#[test]
fn test_red_image_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("red.tif");
    let size = Size::new(100, 100);

    let mut data = vec![0u8; 100 * 100 * 3];
    for pixel in data.chunks_exact_mut(3) {
        pixel[0] = 255;
    }

    write_full(&path, size, 3, &data, &WriteOptions::default());
    assert_eq!(read_full::<u8>(&path), data);
}

#[test]
fn test_row_by_row_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.tif");
    let size = Size::new(100, 100);

    let mut image = LazyTiffImage::<u8>::create(&path, size, 3, false).unwrap();
    for y in 0..size.height {
        let row = vec![(y * 2) as u8; 100 * 3];
        image.write(Area::new(Point::new(0, y), Size::new(100, 1)), &row).unwrap();
    }
    image.close().unwrap();

    let samples = read_full::<u8>(&path);
    assert_eq!(&samples[..10], &[0; 10]);
    for (y, row) in samples.chunks_exact(300).enumerate() {
        assert!(row.iter().all(|&v| v == (y * 2) as u8), "row {}", y);
    }
}

#[test]
fn test_partial_width_write_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.tif");
    let size = Size::new(100, 100);

    let mut image = LazyTiffImage::<u8>::create(&path, size, 3, false).unwrap();
    let area = Area::new(Point::new(10, 10), Size::new(50, 1));
    match image.write(area, &[0; 150]) {
        Err(Error::PartialScanlineUnsupported { area: rejected }) => assert_eq!(rejected, area),
        other => panic!("expected PartialScanlineUnsupported, got {:?}", other),
    }
    let area = Area::new(Point::new(0, 0), Size::new(99, 1));
    assert!(matches!(image.write(area, &[0; 297]), Err(Error::PartialScanlineUnsupported { .. })));
}

#[test]
fn test_bounds_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bounds.tif");
    let size = Size::new(10, 10);

    let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
    let outside = Area::new(Point::new(0, 5), Size::new(10, 6));
    assert!(matches!(image.write(outside, &[0; 60]), Err(Error::AreaOutOfBounds { .. })));
    image.write(Area::full(size), &[3; 100]).unwrap();
    image.close().unwrap();

    let mut image = LazyTiffImage::<u8>::open(&path).unwrap();
    for area in [
        Area::new(Point::new(5, 0), Size::new(6, 1)),
        Area::new(Point::new(0, 10), Size::new(1, 1)),
        Area::new(Point::new(u32::MAX, 0), Size::new(2, 1)),
    ] {
        assert!(matches!(image.read(area), Err(Error::AreaOutOfBounds { .. })), "{:?}", area);
    }
}

#[test]
fn test_round_trip_all_channel_types() {
    let dir = TempDir::new().unwrap();
    let size = Size::new(7, 3);

    macro_rules! round_trip {
        ($ty:ty, $spp:expr, $f:expr) => {{
            let path = dir.path().join(format!("{}_{}.tif", stringify!($ty), $spp));
            let count = size.pixel_count() as usize * $spp as usize;
            let data: Vec<$ty> = (0..count).map($f).collect();
            write_full(&path, size, $spp, &data, &WriteOptions::default());
            assert_eq!(read_full::<$ty>(&path), data, "{} x {}", stringify!($ty), $spp);
        }};
    }

    for spp in [1u16, 2, 3, 4, 5] {
        round_trip!(u8, spp, |i| i as u8);
        round_trip!(i8, spp, |i| (i as i8).wrapping_sub(64));
        round_trip!(u16, spp, |i| (i * 257) as u16);
        round_trip!(i16, spp, |i| -(i as i16) * 3);
        round_trip!(u32, spp, |i| (i as u32) << 20);
        round_trip!(i32, spp, |i| -(i as i32) * 100_000);
        round_trip!(u64, spp, |i| (i as u64) << 40);
        round_trip!(i64, spp, |i| -(i as i64) << 36);
        round_trip!(f32, spp, |i| i as f32 * 0.25);
        round_trip!(f64, spp, |i| i as f64 * -1.5e-3);
    }
}

#[test]
fn test_big_tiff_and_big_endian() {
    let dir = TempDir::new().unwrap();
    let size = Size::new(16, 4);
    let data: Vec<u16> = (0..size.pixel_count() as u16 * 2).map(|v| v.wrapping_mul(311)).collect();

    for (name, options) in [
        ("big.tif", WriteOptions::default().with_big_tiff(true)),
        ("be.tif", WriteOptions::default().with_byte_order(ByteOrder::BigEndian)),
        (
            "big_be.tif",
            WriteOptions::default().with_big_tiff(true).with_byte_order(ByteOrder::BigEndian),
        ),
    ] {
        let path = dir.path().join(name);
        write_full(&path, size, 2, &data, &options);

        let image = LazyTiffImage::<u16>::open(&path).unwrap();
        assert_eq!(image.size(), size);
        drop(image);
        assert_eq!(read_full::<u16>(&path), data, "{}", name);
    }
}

#[test]
fn test_channel_mismatch_before_pixel_access() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("f32.tif");
    let size = Size::new(2, 2);
    write_full(&path, size, 1, &[1.0f32; 4], &WriteOptions::default());

    assert!(matches!(
        LazyTiffImage::<u8>::open(&path),
        Err(Error::IncorrectChannelSize { bits_per_sample: 32, channel_bits: 8 })
    ));
    assert!(matches!(
        LazyTiffImage::<f64>::open(&path),
        Err(Error::IncorrectChannelSize { bits_per_sample: 32, channel_bits: 64 })
    ));
}

#[test]
fn test_flush_then_continue() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flush.tif");
    let size = Size::new(4, 4);

    let mut image = LazyTiffImage::<u8>::create(&path, size, 1, false).unwrap();
    image.write(Area::new(Point::new(0, 0), Size::new(4, 2)), &[1; 8]).unwrap();
    image.flush().unwrap();

    // the checkpoint is already a readable file with the missing rows absent
    let reader = LazyTiffImage::<u8>::open(&path).unwrap();
    assert_eq!(reader.size(), size);
    drop(reader);

    image.write(Area::new(Point::new(0, 2), Size::new(4, 2)), &[2; 8]).unwrap();
    image.close().unwrap();

    let samples = read_full::<u8>(&path);
    assert_eq!(&samples[..8], &[1; 8]);
    assert_eq!(&samples[8..], &[2; 8]);
}

#[test]
fn test_unwritten_rows_read_as_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sparse.tif");
    let size = Size::new(3, 3);

    let mut image = LazyTiffImage::<u16>::create(&path, size, 1, false).unwrap();
    image.write(Area::new(Point::new(0, 1), Size::new(3, 1)), &[9, 9, 9]).unwrap();
    image.close().unwrap();

    assert_eq!(read_full::<u16>(&path), vec![0, 0, 0, 9, 9, 9, 0, 0, 0]);
}
