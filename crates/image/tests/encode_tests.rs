use base::Vec2;
use image::{Image, PixelFormat};

fn gradient(size: Vec2<usize>) -> Vec<u8> {
    (0..size.area() * 3).map(|v| (v % 251) as u8).collect()
}

#[test]
fn test_rgb_to_jpeg_has_soi_marker() {
    let size = Vec2::new(4, 4);
    let jpeg = image::rgb_to_jpeg(size, &gradient(size), 90).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_rgb_to_jpeg_quality_affects_size() {
    let size = Vec2::new(32, 32);
    let data = gradient(size);
    let low = image::rgb_to_jpeg(size, &data, 10).unwrap();
    let high = image::rgb_to_jpeg(size, &data, 100).unwrap();
    assert!(low.len() < high.len());
}

#[test]
fn test_to_jpeg_keeps_dimensions() {
    let size = Vec2::new(640, 480);
    let frame = Image::new(size, vec![128; size.area() * 2], PixelFormat::Yuyv);

    let jpeg = image::to_jpeg(&frame, 80).unwrap();
    let decoded = image::decode_rgb(&jpeg).unwrap();

    assert_eq!(decoded.size, size);
    assert_eq!(decoded.format, PixelFormat::Rgb8);
}

#[test]
fn test_to_jpeg_passes_jpeg_through() {
    let frame = Image::new(Vec2::new(8, 8), vec![0xFF, 0xD8, 0xFF, 0xD9], PixelFormat::Jpeg);
    assert_eq!(image::to_jpeg(&frame, 50).unwrap(), frame.data);
}

#[test]
fn test_to_jpeg_rejects_truncated_frame() {
    let frame = Image::new(Vec2::new(8, 8), vec![0; 7], PixelFormat::Rgb8);
    assert!(image::to_jpeg(&frame, 80).is_err());
}

#[test]
fn test_to_png_decodes_losslessly() {
    let size = Vec2::new(3, 2);
    let data = gradient(size);
    let frame = Image::new(size, data.clone(), PixelFormat::Rgb8);

    let png = image::to_png(&frame).unwrap();
    let decoded = image::decode_rgb(&png).unwrap();

    assert_eq!(decoded.data, data);
}

#[test]
fn test_yuyv_to_rgb_neutral_gray() {
    let rgb = image::yuyv_to_rgb(Vec2::new(2, 1), &[128, 128, 128, 128]);
    assert_eq!(rgb.len(), 6);
    for &v in &rgb {
        assert!((126..=130).contains(&v));
    }
}

#[test]
fn test_argb_to_rgb_drops_alpha() {
    let rgb = image::argb_to_rgb(Vec2::new(2, 1), &[0xFF, 1, 2, 3, 0x00, 4, 5, 6]);
    assert_eq!(rgb, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_rgb_to_u32_packs_channels() {
    let packed = image::rgb_to_u32(Vec2::new(2, 1), &[255, 0, 0, 0, 0, 255]);
    assert_eq!(packed, vec![0x00FF0000, 0x000000FF]);
}

#[test]
fn test_to_u32_decodes_jpeg() {
    let size = Vec2::new(16, 8);
    let jpeg = image::rgb_to_jpeg(size, &gradient(size), 90).unwrap();
    let frame = Image::new(Vec2::new(0, 0), jpeg, PixelFormat::Jpeg);

    let (decoded_size, pixels) = image::to_u32(&frame).unwrap();

    assert_eq!(decoded_size, size);
    assert_eq!(pixels.len(), 128);
}

#[test]
fn test_short_buffer_is_size_error() {
    let size = Vec2::new(4, 4);
    let data = vec![0u8; 4 * 4 * 3 - 1];
    assert!(matches!(
        image::rgb_to_jpeg(size, &data, 80),
        Err(image::ImageError::Size { expected: 48, actual: 47 })
    ));
    assert!(matches!(
        image::rgb_to_png(size, &data),
        Err(image::ImageError::Size { .. })
    ));
}

#[test]
fn test_odd_pixel_count_yuyv_is_size_error() {
    // 3x1 YUYV validates (6 bytes) but only converts to two pixels
    let frame = Image::new(Vec2::new(3, 1), vec![128u8; 6], PixelFormat::Yuyv);
    assert!(matches!(
        image::to_jpeg(&frame, 80),
        Err(image::ImageError::Size { expected: 9, actual: 6 })
    ));
}
