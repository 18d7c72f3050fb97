use {crate::*, base::Vec2};

/// One frame: `size.x * size.y` pixels in `format`.
///
/// For compressed formats `data` holds the encoded stream and `size` is what
/// the producer reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

impl Image {
    pub fn new(size: Vec2<usize>, data: Vec<u8>, format: PixelFormat) -> Self {
        Self { size, data, format }
    }

    pub fn width(&self) -> usize {
        self.size.x
    }

    pub fn height(&self) -> usize {
        self.size.y
    }

    /// Check that a raw buffer holds exactly one frame.
    pub fn validate(&self) -> Result<(), ImageError> {
        if let Some(bpp) = self.format.bytes_per_pixel() {
            let expected = self.size.area() * bpp;
            if self.data.len() != expected {
                return Err(ImageError::Size {
                    expected,
                    actual: self.data.len(),
                });
            }
        }
        Ok(())
    }
}
