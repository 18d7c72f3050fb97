//! `0RGB` packed pixels, the buffer layout minifb windows take.

use {crate::*, base::Vec2};

fn pack_u32(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

pub fn rgb_to_u32(size: Vec2<usize>, data: &[u8]) -> Vec<u32> {
    let mut buf = Vec::with_capacity(size.area());
    for chunk in data.chunks_exact(3) {
        buf.push(pack_u32(chunk[0], chunk[1], chunk[2]));
    }
    buf
}

pub fn argb_to_u32(size: Vec2<usize>, data: &[u8]) -> Vec<u32> {
    let mut buf = Vec::with_capacity(size.area());
    for chunk in data.chunks_exact(4) {
        buf.push(pack_u32(chunk[1], chunk[2], chunk[3]));
    }
    buf
}

pub fn yuyv_to_u32(size: Vec2<usize>, data: &[u8]) -> Vec<u32> {
    let mut buf = Vec::with_capacity(size.area());
    for chunk in data.chunks_exact(4) {
        let (r0, g0, b0) = yuv_to_rgb(chunk[0], chunk[1], chunk[3]);
        let (r1, g1, b1) = yuv_to_rgb(chunk[2], chunk[1], chunk[3]);
        buf.push(pack_u32(r0, g0, b0));
        buf.push(pack_u32(r1, g1, b1));
    }
    buf
}

/// Pack any frame. JPEG frames are decoded, so the returned size may differ
/// from the one the frame claims.
pub fn to_u32(image: &Image) -> Result<(Vec2<usize>, Vec<u32>), ImageError> {
    match image.format {
        PixelFormat::Rgb8 => Ok((image.size, rgb_to_u32(image.size, &image.data))),
        PixelFormat::Argb8 => Ok((image.size, argb_to_u32(image.size, &image.data))),
        PixelFormat::Yuyv => Ok((image.size, yuyv_to_u32(image.size, &image.data))),
        PixelFormat::Jpeg => {
            let rgb = jpeg_to_rgb(image)?;
            Ok((rgb.size, rgb_to_u32(rgb.size, &rgb.data)))
        }
    }
}
