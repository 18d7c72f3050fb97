//! Frame representation and codecs.
//!
//! An `Image` is a sized byte buffer tagged with its `PixelFormat`. The free
//! functions convert between formats, encode to JPEG/PNG, decode anything the
//! `image` crate can read back into RGB, pack pixels for window surfaces, and
//! wrap encoded bytes into `data:` URLs for JSON transport.

pub mod dataurl;
pub mod error;
pub mod image;
pub mod jpeg;
pub mod packed;
pub mod pixelformat;
pub mod rgb;

pub use dataurl::*;
pub use error::ImageError;
pub use image::Image;
pub use jpeg::*;
pub use pixelformat::*;
pub use rgb::*;
pub use packed::*;

/// Encode `image` as JPEG on the blocking pool.
///
/// JPEG input is passed through untouched; every other format is converted to
/// RGB first.
pub async fn encode_jpeg(image: Image, quality: u8) -> Result<Vec<u8>, ImageError> {
    tokio::task::spawn_blocking(move || to_jpeg(&image, quality))
        .await
        .map_err(|e| ImageError::Encode(e.to_string()))?
}

/// Decode any supported container (JPEG, PNG, BMP, WebP) into an RGB image
/// on the blocking pool.
pub async fn decode_image(data: &[u8]) -> Result<Image, ImageError> {
    let owned = data.to_vec();
    tokio::task::spawn_blocking(move || decode_rgb(&owned))
        .await
        .map_err(|e| ImageError::Decode(e.to_string()))?
}
