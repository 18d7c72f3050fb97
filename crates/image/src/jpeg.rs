use {
    crate::*,
    base::Vec2,
    crates_image::{ExtendedColorType, ImageEncoder},
};

// the encoders panic on a buffer that does not match the dimensions
fn check_rgb(size: Vec2<usize>, data: &[u8]) -> Result<(), ImageError> {
    let expected = size.area() * 3;
    if data.len() != expected {
        return Err(ImageError::Size {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

pub fn rgb_to_jpeg(size: Vec2<usize>, data: &[u8], quality: u8) -> Result<Vec<u8>, ImageError> {
    check_rgb(size, data)?;
    let mut buffer = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(data, size.x as u32, size.y as u32, ExtendedColorType::Rgb8)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}

pub fn rgb_to_png(size: Vec2<usize>, data: &[u8]) -> Result<Vec<u8>, ImageError> {
    check_rgb(size, data)?;
    let mut buffer = Vec::new();
    crates_image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(data, size.x as u32, size.y as u32, ExtendedColorType::Rgb8)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Encode a frame of any format as JPEG. JPEG frames pass through unchanged.
pub fn to_jpeg(image: &Image, quality: u8) -> Result<Vec<u8>, ImageError> {
    if image.format == PixelFormat::Jpeg {
        return Ok(image.data.clone());
    }
    let rgb = to_rgb(image)?;
    rgb_to_jpeg(rgb.size, &rgb.data, quality)
}

/// Encode a frame of any format as PNG.
pub fn to_png(image: &Image) -> Result<Vec<u8>, ImageError> {
    let rgb = to_rgb(image)?;
    rgb_to_png(rgb.size, &rgb.data)
}
