use {crate::*, base::Vec2};

pub fn yuyv_to_rgb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(size.area() * 3);
    for chunk in data.chunks_exact(4) {
        let (r0, g0, b0) = yuv_to_rgb(chunk[0], chunk[1], chunk[3]);
        let (r1, g1, b1) = yuv_to_rgb(chunk[2], chunk[1], chunk[3]);
        rgb.extend_from_slice(&[r0, g0, b0, r1, g1, b1]);
    }
    rgb
}

pub fn argb_to_rgb(size: Vec2<usize>, data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(size.area() * 3);
    for chunk in data.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[1..4]);
    }
    rgb
}

/// Decode any container the `image` crate understands into an RGB image.
pub fn decode_rgb(data: &[u8]) -> Result<Image, ImageError> {
    let decoded = crates_image::load_from_memory(data)?.to_rgb8();
    let (width, height) = decoded.dimensions();
    Ok(Image::new(
        Vec2::new(width as usize, height as usize),
        decoded.into_raw(),
        PixelFormat::Rgb8,
    ))
}

pub fn jpeg_to_rgb(image: &Image) -> Result<Image, ImageError> {
    image.format.ensure_format(PixelFormat::Jpeg)?;
    decode_rgb(&image.data).map_err(|e| ImageError::Decode(format!("Failed to decode JPEG: {}", e)))
}

/// Convert any frame to `PixelFormat::Rgb8`.
pub fn to_rgb(image: &Image) -> Result<Image, ImageError> {
    image.validate()?;
    let data = match image.format {
        PixelFormat::Rgb8 => image.data.clone(),
        PixelFormat::Argb8 => argb_to_rgb(image.size, &image.data),
        PixelFormat::Yuyv => yuyv_to_rgb(image.size, &image.data),
        PixelFormat::Jpeg => return jpeg_to_rgb(image),
    };
    // YUYV with an odd pixel count loses its last pixel
    let rgb = Image::new(image.size, data, PixelFormat::Rgb8);
    rgb.validate()?;
    Ok(rgb)
}
