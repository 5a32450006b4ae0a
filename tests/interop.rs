//! Cross-checks against the independent `tiff` crate decoder and encoder

use std::fs::File;

use lazytiff::{Area, GeoTiffImage, LazyTiffImage, Point, Size, WriteOptions};
use tempfile::TempDir;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::ColorType;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

#[test]
fn test_our_output_decodes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rgb.tif");
    let size = Size::new(33, 17);
    let data = pattern(33 * 17 * 3);

    let mut image = LazyTiffImage::<u8>::create(&path, size, 3, false).unwrap();
    image.write(Area::full(size), &data).unwrap();
    image.close().unwrap();

    let mut decoder = Decoder::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (33, 17));
    assert_eq!(decoder.colortype().unwrap(), ColorType::RGB(8));
    match decoder.read_image().unwrap() {
        DecodingResult::U8(pixels) => assert_eq!(pixels, data),
        _ => panic!("expected 8-bit samples"),
    }
}

#[test]
fn test_our_big_tiff_output_decodes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gray16.tif");
    let size = Size::new(10, 6);
    let data: Vec<u16> = (0..60).map(|v| v * 1000).collect();

    let options = WriteOptions::default().with_big_tiff(true);
    let mut image = LazyTiffImage::<u16>::create_with_options(&path, size, 1, false, &options).unwrap();
    image.write(Area::full(size), &data).unwrap();
    image.close().unwrap();

    let mut decoder = Decoder::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(decoder.colortype().unwrap(), ColorType::Gray(16));
    match decoder.read_image().unwrap() {
        DecodingResult::U16(pixels) => assert_eq!(pixels, data),
        _ => panic!("expected 16-bit samples"),
    }
}

#[test]
fn test_geo_key_directory_visible_to_decoder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("geo.tif");
    let size = Size::new(4, 4);

    let mut image = GeoTiffImage::<u8>::create(&path, size, 1, false).unwrap();
    let raw = vec![1u16, 1, 0, 1, 3072, 0, 1, 32633];
    image.file_mut().unwrap().set_custom_array(lazytiff::tags::GEO_KEY_DIRECTORY, &raw).unwrap();
    image.set_pixel_scale(&[10.0, 10.0, 0.0]).unwrap();
    image.write(Area::full(size), &[0; 16]).unwrap();
    image.close().unwrap();

    let mut decoder = Decoder::new(File::open(&path).unwrap()).unwrap();
    assert_eq!(decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).unwrap(), raw);
    assert_eq!(decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).unwrap(), vec![10.0, 10.0, 0.0]);
}

#[test]
fn test_encoder_output_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("encoded.tif");
    let (width, height) = (120u32, 90u32);
    let data = pattern((width * height * 3) as usize);

    TiffEncoder::new(File::create(&path).unwrap())
        .unwrap()
        .write_image::<colortype::RGB8>(width, height, &data)
        .unwrap();

    let mut image = LazyTiffImage::<u8>::open(&path).unwrap();
    let size = image.size();
    assert_eq!(size, Size::new(width, height));
    assert_eq!(image.channel_count(), 3);
    assert_eq!(image.read(Area::full(size)).unwrap(), data);

    let window = image.read(Area::new(Point::new(5, 40), Size::new(2, 1))).unwrap();
    let start = ((40 * width + 5) * 3) as usize;
    assert_eq!(window, data[start..start + 6].to_vec());
}

#[test]
fn test_big_encoder_output_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("encoded_big.tif");
    let (width, height) = (40u32, 30u32);
    let data: Vec<f32> = (0..width * height).map(|v| v as f32 / 8.0).collect();

    TiffEncoder::new_big(File::create(&path).unwrap())
        .unwrap()
        .write_image::<colortype::Gray32Float>(width, height, &data)
        .unwrap();

    let mut image = LazyTiffImage::<f32>::open(&path).unwrap();
    assert_eq!(image.read(Area::full(Size::new(width, height))).unwrap(), data);
}
